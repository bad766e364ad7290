//! Error Types
//!
//! Errors surfaced by quest content loading, quest setup and player-initiated
//! quest operations. Event processing itself never fails.

use std::path::PathBuf;
use thiserror::Error;

use crate::quest::QuestId;

/// Errors that can occur in the quest server
#[derive(Debug, Error)]
pub enum QuestError {
    /// An objective with this ident was already added to the quest
    #[error("Quest {quest_id}: objectives must have a unique identifier ('{ident}' already exists)")]
    DuplicateObjective { quest_id: QuestId, ident: String },

    /// Objective type string in quest content is not recognized
    #[error("Unknown objective type '{0}'")]
    UnknownObjectiveType(String),

    /// Objective in quest content lacks a field its type requires
    #[error("Objective '{ident}' is missing required field '{field}'")]
    MissingField { ident: String, field: &'static str },

    /// Quest content parsed but contains no objectives
    #[error("Quest {0} has no objectives")]
    NoObjectives(QuestId),

    /// No quest definition with this id is registered
    #[error("Quest {0} not found")]
    QuestNotFound(QuestId),

    /// Player already has the quest (active or completed)
    #[error("Quest {0} is already held")]
    AlreadyHeld(QuestId),

    /// Player does not have the quest active
    #[error("Quest {0} is not active")]
    NotActive(QuestId),

    /// Quest was defined as not cancelable
    #[error("Quest {0} cannot be canceled")]
    NotCancelable(QuestId),

    /// Not every objective of the quest is done yet
    #[error("Quest {0} still has unfinished objectives")]
    Unfinished(QuestId),

    /// Player does not meet the quest prerequisites
    #[error("Prerequisites for quest {0} are not met")]
    PrerequisitesNotMet(QuestId),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML content or config failed to parse
    #[error("Failed to parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// File watcher could not be set up
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Client message could not be encoded
    #[error("Failed to encode message: {0}")]
    Encode(String),

    /// No session worker exists for this player
    #[error("No session for player '{0}'")]
    SessionNotFound(String),

    /// Session worker stopped before accepting the command
    #[error("Session for player '{0}' is closed")]
    SessionClosed(String),
}
