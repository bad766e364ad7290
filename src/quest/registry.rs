//! Quest Registry
//!
//! Loads quest definitions from TOML files and publishes them to the
//! progress engine. Supports hot-reloading during development.

use dashmap::DashMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::definition::{QuestDefinition, QuestId, RawQuestFile};
use super::engine::ProgressEngine;
use crate::error::QuestError;

/// Registry for quest content on disk
pub struct QuestRegistry {
    engine: Arc<ProgressEngine>,
    /// Quests loaded from disk (quest_id -> source file)
    loaded: DashMap<QuestId, PathBuf>,
    /// Base directory for quest data
    data_dir: PathBuf,
}

impl QuestRegistry {
    pub fn new(data_dir: &Path, engine: Arc<ProgressEngine>) -> Self {
        Self {
            engine,
            loaded: DashMap::new(),
            data_dir: data_dir.join("quests"),
        }
    }

    pub fn engine(&self) -> &Arc<ProgressEngine> {
        &self.engine
    }

    /// Load all quest definitions from the data directory. Quests that were
    /// loaded before but no longer exist on disk are unregistered.
    pub fn load_all(&self) -> Result<usize, QuestError> {
        info!("Loading quests from {:?}", self.data_dir);

        if !self.data_dir.exists() {
            warn!("Quest directory does not exist: {:?}", self.data_dir);
            return Ok(0);
        }

        let mut paths = Vec::new();
        collect_toml_files(&self.data_dir, &mut paths)?;
        paths.sort();

        let mut seen = HashSet::new();
        for path in paths {
            match load_quest_file(&path) {
                Ok(quest) => {
                    let quest_id = quest.id();
                    if !seen.insert(quest_id) {
                        warn!("Duplicate quest ID {} in {:?}, overwriting", quest_id, path);
                    }
                    info!("Loaded quest: {} ({})", quest.name(), quest_id);
                    self.engine.register(quest);
                    self.loaded.insert(quest_id, path);
                }
                Err(e) => {
                    // A file caught mid-edit keeps whatever it defined before
                    let kept: Vec<QuestId> = self
                        .loaded
                        .iter()
                        .filter(|entry| entry.value() == &path)
                        .map(|entry| *entry.key())
                        .collect();
                    if kept.is_empty() {
                        warn!("Failed to load quest {:?}: {}", path, e);
                    } else {
                        warn!(
                            "Failed to reload quest {:?}: {}, keeping quest(s) {:?}",
                            path, e, kept
                        );
                        seen.extend(kept);
                    }
                }
            }
        }

        let stale: Vec<QuestId> = self
            .loaded
            .iter()
            .map(|entry| *entry.key())
            .filter(|id| !seen.contains(id))
            .collect();
        for quest_id in stale {
            info!("Unloading quest {} (no longer on disk)", quest_id);
            self.loaded.remove(&quest_id);
            self.engine.unregister(quest_id);
        }

        info!("Loaded {} quest definitions", seen.len());
        self.validate_prerequisites();

        Ok(seen.len())
    }

    /// Warn about prerequisites pointing at quests that don't exist
    fn validate_prerequisites(&self) {
        for quest_id in self.engine.ids() {
            let Some(quest) = self.engine.get(quest_id) else {
                continue;
            };
            for prerequisite in quest.prerequisites() {
                for referenced in prerequisite.referenced_quests() {
                    if !self.engine.contains(referenced) {
                        warn!(
                            "Quest {} references non-existent prerequisite quest {}",
                            quest_id, referenced
                        );
                    }
                }
            }
        }
    }

    /// Source file a quest was loaded from
    pub fn source_of(&self, quest_id: QuestId) -> Option<PathBuf> {
        self.loaded.get(&quest_id).map(|p| p.value().clone())
    }

    /// Get count of quests loaded from disk
    pub fn count(&self) -> usize {
        self.loaded.len()
    }

    /// Start file watcher for hot-reload.
    /// Returns a channel receiver that signals when reloads occur.
    pub fn start_file_watcher(
        self: &Arc<Self>,
    ) -> Result<mpsc::Receiver<HotReloadEvent>, QuestError> {
        use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
        use std::time::Duration;

        let (tx, rx) = mpsc::channel(32);
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = notify_tx.send(event);
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(1)),
        )?;

        if self.data_dir.exists() {
            watcher.watch(&self.data_dir, RecursiveMode::Recursive)?;
        }

        info!("Quest hot-reload watcher started for {:?}", self.data_dir);

        let registry = Arc::clone(self);
        std::thread::spawn(move || {
            // Keep the watcher alive for as long as the thread runs
            let _watcher = watcher;

            while let Ok(event) = notify_rx.recv() {
                if !matches!(
                    event.kind,
                    EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
                ) {
                    continue;
                }

                let Some(path) = event
                    .paths
                    .iter()
                    .find(|p| p.extension().map_or(false, |ext| ext == "toml"))
                else {
                    continue;
                };

                info!("Detected change in {:?}, triggering reload", path);
                let message = match registry.load_all() {
                    Ok(_) => {
                        info!("Hot-reload completed successfully");
                        HotReloadEvent::Reloaded(path.to_string_lossy().to_string())
                    }
                    Err(e) => {
                        error!("Hot-reload failed: {}", e);
                        HotReloadEvent::Error(e.to_string())
                    }
                };

                if tx.blocking_send(message).is_err() {
                    // Receiver dropped, stop watching
                    break;
                }
            }
        });

        Ok(rx)
    }
}

/// Recursively collect quest files
fn collect_toml_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), QuestError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        if path.is_dir() {
            collect_toml_files(&path, paths)?;
        } else if path.extension().map_or(false, |ext| ext == "toml") {
            paths.push(path);
        }
    }
    Ok(())
}

/// Load a single quest file
fn load_quest_file(path: &Path) -> Result<QuestDefinition, QuestError> {
    let content = std::fs::read_to_string(path)?;

    let raw: RawQuestFile = toml::from_str(&content).map_err(|source| QuestError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    QuestDefinition::from_raw(&raw.quest)
}

/// Events from the hot-reload watcher
#[derive(Debug, Clone)]
pub enum HotReloadEvent {
    /// A file was reloaded successfully
    Reloaded(String),
    /// An error occurred during reload
    Error(String),
}
