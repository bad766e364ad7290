//! Quest Prerequisites
//!
//! Boolean predicates deciding whether a player may receive a quest.

use serde::{Deserialize, Serialize};

use super::definition::QuestId;
use crate::player::QuestPlayer;

/// A node of the prerequisite tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prerequisite {
    /// Player has completed the given quest
    Completed { quest_id: QuestId },
    /// Player is at least this level
    ReachedLevel { level: i32 },
    /// Every child must be met
    And { all: Vec<Prerequisite> },
    /// At least one child must be met
    Or { any: Vec<Prerequisite> },
}

impl Prerequisite {
    pub fn completed(quest_id: QuestId) -> Self {
        Prerequisite::Completed { quest_id }
    }

    pub fn reached_level(level: i32) -> Self {
        Prerequisite::ReachedLevel { level }
    }

    pub fn and(all: Vec<Prerequisite>) -> Self {
        Prerequisite::And { all }
    }

    pub fn or(any: Vec<Prerequisite>) -> Self {
        Prerequisite::Or { any }
    }

    /// Check the prerequisite against a player
    pub fn is_met<P: QuestPlayer + ?Sized>(&self, player: &P) -> bool {
        match self {
            Prerequisite::Completed { quest_id } => player.quest_log().is_completed(*quest_id),
            Prerequisite::ReachedLevel { level } => player.level() >= *level,
            Prerequisite::And { all } => all.iter().all(|p| p.is_met(player)),
            Prerequisite::Or { any } => any.iter().any(|p| p.is_met(player)),
        }
    }

    /// Quest ids this node refers to (used to validate content)
    pub fn referenced_quests(&self) -> Vec<QuestId> {
        match self {
            Prerequisite::Completed { quest_id } => vec![*quest_id],
            Prerequisite::ReachedLevel { .. } => Vec::new(),
            Prerequisite::And { all: children } | Prerequisite::Or { any: children } => {
                children.iter().flat_map(|c| c.referenced_quests()).collect()
            }
        }
    }
}

/// All top-level prerequisites must hold. An empty list always holds.
pub fn all_met<P: QuestPlayer + ?Sized>(prerequisites: &[Prerequisite], player: &P) -> bool {
    prerequisites.iter().all(|p| p.is_met(player))
}
