//! Quest Rewards
//!
//! Reward descriptors are only stored and enumerated here. Granting them is
//! up to whoever completes the quest.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single quest reward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reward {
    Item { item_id: i32, amount: i32 },
    Skill { skill_id: u16, rank: u8 },
    Gold { amount: i32 },
    Exp { amount: i32 },
    ExplExp { amount: i32 },
    Ap { amount: i16 },
}

impl Reward {
    pub fn item(item_id: i32, amount: i32) -> Self {
        Reward::Item { item_id, amount }
    }

    pub fn skill(skill_id: u16, rank: u8) -> Self {
        Reward::Skill { skill_id, rank }
    }

    pub fn gold(amount: i32) -> Self {
        Reward::Gold { amount }
    }

    pub fn exp(amount: i32) -> Self {
        Reward::Exp { amount }
    }

    pub fn expl_exp(amount: i32) -> Self {
        Reward::ExplExp { amount }
    }

    pub fn ap(amount: i16) -> Self {
        Reward::Ap { amount }
    }
}

impl fmt::Display for Reward {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reward::Item { item_id, amount } => write!(f, "Item {} x{}", item_id, amount),
            Reward::Skill { skill_id, rank } => write!(f, "Skill {} (Rank {})", skill_id, rank),
            Reward::Gold { amount } => write!(f, "{} Gold", amount),
            Reward::Exp { amount } if *amount == 1 => f.write_str("1 Experience Point"),
            Reward::Exp { amount } => write!(f, "{} Experience Points", amount),
            Reward::ExplExp { amount } => write!(f, "{} Exploration EXP", amount),
            Reward::Ap { amount } => write!(f, "{} AP", amount),
        }
    }
}
