//! Quest Event Types
//!
//! Gameplay events produced by the world simulation and the notifications
//! the engine emits in response.

use serde::{Deserialize, Serialize};

use super::definition::QuestId;
use super::reward::Reward;
use super::state::QuestProgress;

/// A creature as seen by kill objectives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    pub name: String,
    /// Race tags (e.g. "wolf", "animal")
    #[serde(default)]
    pub race_tags: Vec<String>,
}

impl Creature {
    pub fn new(name: &str, race_tags: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            race_tags: race_tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Check whether the creature carries a race tag (case-insensitive)
    pub fn has_tag(&self, tag: &str) -> bool {
        self.race_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

/// Gameplay events that can drive quest progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Player entered the world
    PlayerLoggedIn { player_id: String },

    /// Player killed a creature
    CreatureKilled { player_id: String, creature: Creature },

    /// Player received items (inventory already updated)
    ItemReceived {
        player_id: String,
        item_id: i32,
        amount: i32,
    },

    /// Player lost items (inventory already updated)
    ItemRemoved {
        player_id: String,
        item_id: i32,
        amount: i32,
    },

    /// Player talked to an NPC
    NpcTalked { player_id: String, npc_name: String },
}

impl GameEvent {
    /// Get the player ID associated with this event
    pub fn player_id(&self) -> &str {
        match self {
            GameEvent::PlayerLoggedIn { player_id } => player_id,
            GameEvent::CreatureKilled { player_id, .. } => player_id,
            GameEvent::ItemReceived { player_id, .. } => player_id,
            GameEvent::ItemRemoved { player_id, .. } => player_id,
            GameEvent::NpcTalked { player_id, .. } => player_id,
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::PlayerLoggedIn { .. } => EventKind::PlayerLoggedIn,
            GameEvent::CreatureKilled { .. } => EventKind::CreatureKilled,
            GameEvent::ItemReceived { .. } => EventKind::ItemReceived,
            GameEvent::ItemRemoved { .. } => EventKind::ItemRemoved,
            GameEvent::NpcTalked { .. } => EventKind::NpcTalked,
        }
    }
}

/// Event streams a quest can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    PlayerLoggedIn,
    CreatureKilled,
    ItemReceived,
    ItemRemoved,
    NpcTalked,
}

impl EventKind {
    /// Get event type as string (for logging/debugging)
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PlayerLoggedIn => "player_logged_in",
            EventKind::CreatureKilled => "creature_killed",
            EventKind::ItemReceived => "item_received",
            EventKind::ItemRemoved => "item_removed",
            EventKind::NpcTalked => "npc_talked",
        }
    }
}

/// Notifications emitted towards the client delivery layer.
/// Progress payloads are full snapshots, not deltas.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestNotification {
    /// A quest was started for the player
    Started {
        player_id: String,
        progress: QuestProgress,
    },
    /// Objective progress changed
    ProgressChanged {
        player_id: String,
        progress: QuestProgress,
    },
    /// Quest was turned in; rewards are for the caller to grant
    Completed {
        player_id: String,
        quest_id: QuestId,
        rewards: Vec<Reward>,
    },
    /// Quest was dropped by the player
    Abandoned { player_id: String, quest_id: QuestId },
}

impl QuestNotification {
    pub fn player_id(&self) -> &str {
        match self {
            QuestNotification::Started { player_id, .. } => player_id,
            QuestNotification::ProgressChanged { player_id, .. } => player_id,
            QuestNotification::Completed { player_id, .. } => player_id,
            QuestNotification::Abandoned { player_id, .. } => player_id,
        }
    }

    pub fn quest_id(&self) -> QuestId {
        match self {
            QuestNotification::Started { progress, .. } => progress.quest_id,
            QuestNotification::ProgressChanged { progress, .. } => progress.quest_id,
            QuestNotification::Completed { quest_id, .. } => *quest_id,
            QuestNotification::Abandoned { quest_id, .. } => *quest_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_from_json() {
        let event: GameEvent = serde_json::from_str(
            r#"{
                "type": "creature_killed",
                "player_id": "alice",
                "creature": { "name": "Gray Wolf", "race_tags": ["wolf", "animal"] }
            }"#,
        )
        .unwrap();

        assert_eq!(event.player_id(), "alice");
        assert_eq!(event.kind(), EventKind::CreatureKilled);
        match event {
            GameEvent::CreatureKilled { creature, .. } => {
                assert!(creature.has_tag("WOLF"));
                assert!(!creature.has_tag("fox"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
