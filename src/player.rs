//! Player State
//!
//! The view of a player the quest engine works against, and a simple
//! character record used by session workers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::quest::{GameEvent, QuestLog};

/// What the quest engine needs to know about a player
pub trait QuestPlayer {
    fn player_id(&self) -> &str;

    fn level(&self) -> i32;

    /// Current total quantity of an item in the player's possession
    fn held_item_count(&self, item_id: i32) -> i32;

    fn quest_log(&self) -> &QuestLog;

    fn quest_log_mut(&mut self) -> &mut QuestLog;
}

/// A connected character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub level: i32,
    /// item_id -> quantity
    #[serde(default)]
    pub inventory: HashMap<i32, i32>,
    #[serde(default)]
    pub quests: QuestLog,
}

impl Character {
    pub fn new(id: &str, level: i32) -> Self {
        Self {
            id: id.to_string(),
            level,
            inventory: HashMap::new(),
            quests: QuestLog::new(),
        }
    }

    /// Add items, clamping at `i32::MAX`
    pub fn add_item(&mut self, item_id: i32, amount: i32) {
        let count = self.inventory.entry(item_id).or_insert(0);
        *count = count.saturating_add(amount.max(0));
    }

    /// Remove up to `amount` items, never going below zero
    pub fn remove_item(&mut self, item_id: i32, amount: i32) {
        if let Some(count) = self.inventory.get_mut(&item_id) {
            *count = (*count - amount.max(0)).max(0);
            if *count == 0 {
                self.inventory.remove(&item_id);
            }
        }
    }

    /// Mirror inventory changes reported by the world before quest handlers
    /// look at held counts
    pub fn apply_world_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::ItemReceived { item_id, amount, .. } => self.add_item(*item_id, *amount),
            GameEvent::ItemRemoved { item_id, amount, .. } => self.remove_item(*item_id, *amount),
            _ => {}
        }
    }
}

impl QuestPlayer for Character {
    fn player_id(&self) -> &str {
        &self.id
    }

    fn level(&self) -> i32 {
        self.level
    }

    fn held_item_count(&self, item_id: i32) -> i32 {
        self.inventory.get(&item_id).copied().unwrap_or(0)
    }

    fn quest_log(&self) -> &QuestLog {
        &self.quests
    }

    fn quest_log_mut(&mut self) -> &mut QuestLog {
        &mut self.quests
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_counts() {
        let mut character = Character::new("alice", 1);
        character.add_item(501, 5);
        character.remove_item(501, 3);
        character.add_item(501, 1);
        assert_eq!(character.held_item_count(501), 3);

        character.remove_item(501, 10);
        assert_eq!(character.held_item_count(501), 0);
        assert!(character.inventory.is_empty());
    }

    #[test]
    fn test_apply_world_event() {
        let mut character = Character::new("alice", 1);
        character.apply_world_event(&GameEvent::ItemReceived {
            player_id: "alice".to_string(),
            item_id: 7,
            amount: 2,
        });
        character.apply_world_event(&GameEvent::PlayerLoggedIn {
            player_id: "alice".to_string(),
        });
        assert_eq!(character.held_item_count(7), 2);
    }

    #[test]
    fn test_add_item_saturates() {
        let mut character = Character::new("alice", 1);
        character.add_item(501, i32::MAX);
        character.add_item(501, i32::MAX);
        assert_eq!(character.held_item_count(501), i32::MAX);

        character.remove_item(501, 1);
        assert_eq!(character.held_item_count(501), i32::MAX - 1);
    }
}
