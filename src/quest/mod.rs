//! Quest System Module
//!
//! Declarative quest templates (TOML or builder) whose objectives advance
//! from broadcast gameplay events. Templates are shared; progress is kept
//! per player.

pub mod definition;
pub mod engine;
pub mod events;
pub mod metadata;
pub mod notifier;
pub mod objective;
pub mod prerequisite;
pub mod registry;
pub mod reward;
pub mod state;
pub mod subscriptions;

pub use definition::{GrantMethod, QuestBuilder, QuestDefinition, QuestId};
pub use engine::ProgressEngine;
pub use events::{Creature, EventKind, GameEvent, QuestNotification};
pub use metadata::MetaData;
pub use notifier::{ChannelNotifier, QuestNotifier, RecordingNotifier};
pub use objective::{ObjectiveKind, ObjectiveType, QuestObjective};
pub use prerequisite::Prerequisite;
pub use registry::{HotReloadEvent, QuestRegistry};
pub use reward::Reward;
pub use state::{ObjectiveProgress, QuestLog, QuestProgress};
