//! Server Configuration
//!
//! Loaded from a TOML file. Every field has a default, so a missing file or
//! a partial file is fine.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::QuestError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Root of the content directory (quests are read from `<data_dir>/quests`)
    pub data_dir: PathBuf,
    /// Watch quest files and reload on change
    pub hot_reload: bool,
    /// Pending commands per player session
    pub session_queue: usize,
    /// Pending outgoing quest notifications
    pub notification_queue: usize,
    /// Tracing filter used when RUST_LOG is not set
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            hot_reload: false,
            session_queue: 64,
            notification_queue: 256,
            log_filter: "quest_server=info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, QuestError> {
        toml::from_str(content).map_err(|source| QuestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from a file. Returns `Ok(None)` when the file doesn't exist.
    pub fn load(path: &Path) -> Result<Option<Self>, QuestError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content, path).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = ServerConfig::from_toml(
            r#"
data_dir = "content"
hot_reload = true
"#,
            Path::new("quest-server.toml"),
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("content"));
        assert!(config.hot_reload);
        assert_eq!(config.session_queue, 64);
        assert_eq!(config.log_filter, "quest_server=info");
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let result = ServerConfig::load(&temp_dir.path().join("missing.toml")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_config() {
        let result = ServerConfig::from_toml("session_queue = \"lots\"", Path::new("bad.toml"));
        assert!(matches!(result, Err(QuestError::Parse { .. })));
    }
}
