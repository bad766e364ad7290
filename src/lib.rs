//! Quest server: quest templates, event-driven objective progress and the
//! per-player session workers that drive it.

pub mod config;
pub mod error;
pub mod player;
pub mod protocol;
pub mod quest;
pub mod session;

pub use config::ServerConfig;
pub use error::QuestError;
pub use player::{Character, QuestPlayer};
pub use session::{SessionCommand, SessionManager};
