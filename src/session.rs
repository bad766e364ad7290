//! Player Sessions
//!
//! Each connected player gets one worker task that owns the character and
//! applies commands strictly in arrival order. Quest progress for a player
//! is only ever touched by that worker, so players never contend with each
//! other.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::QuestError;
use crate::player::{Character, QuestPlayer};
use crate::quest::{GameEvent, ProgressEngine, QuestId, Reward};

/// Work queued for a session worker
#[derive(Debug)]
pub enum SessionCommand {
    /// Gameplay event concerning this player
    Event(GameEvent),
    /// Player asked to start a quest
    StartQuest {
        quest_id: QuestId,
        reply: Option<oneshot::Sender<Result<(), QuestError>>>,
    },
    /// Player asked to drop a quest
    AbandonQuest {
        quest_id: QuestId,
        reply: Option<oneshot::Sender<Result<(), QuestError>>>,
    },
    /// Player turned in a quest
    CompleteQuest {
        quest_id: QuestId,
        reply: Option<oneshot::Sender<Result<Vec<Reward>, QuestError>>>,
    },
}

struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    task: JoinHandle<Character>,
}

/// Tracks the worker of every connected player
pub struct SessionManager {
    engine: Arc<ProgressEngine>,
    sessions: DashMap<String, SessionHandle>,
    queue_size: usize,
}

impl SessionManager {
    pub fn new(engine: Arc<ProgressEngine>, queue_size: usize) -> Self {
        Self {
            engine,
            sessions: DashMap::new(),
            queue_size: queue_size.max(1),
        }
    }

    /// Spawn a worker for the character. An existing session for the same
    /// player is left alone and `false` is returned.
    pub fn connect(&self, character: Character) -> bool {
        let player_id = character.id.clone();
        match self.sessions.entry(player_id) {
            Entry::Occupied(entry) => {
                warn!("Player {} already has a session", entry.key());
                false
            }
            Entry::Vacant(entry) => {
                let (tx, rx) = mpsc::channel(self.queue_size);
                let task = tokio::spawn(run_session(Arc::clone(&self.engine), character, rx));
                info!("Session started for player {}", entry.key());
                entry.insert(SessionHandle { tx, task });
                true
            }
        }
    }

    pub fn is_connected(&self, player_id: &str) -> bool {
        self.sessions.contains_key(player_id)
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Queue a command for a player's worker
    pub async fn send(&self, player_id: &str, command: SessionCommand) -> Result<(), QuestError> {
        let tx = self
            .sessions
            .get(player_id)
            .map(|s| s.tx.clone())
            .ok_or_else(|| QuestError::SessionNotFound(player_id.to_string()))?;

        tx.send(command)
            .await
            .map_err(|_| QuestError::SessionClosed(player_id.to_string()))
    }

    /// Route a gameplay event to the player it concerns. Events for players
    /// without a session are dropped.
    pub async fn publish(&self, event: GameEvent) -> bool {
        let player_id = event.player_id().to_string();
        match self.send(&player_id, SessionCommand::Event(event)).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Event not delivered: {}", e);
                false
            }
        }
    }

    /// Ask the worker to start a quest and wait for the outcome
    pub async fn start_quest(&self, player_id: &str, quest_id: QuestId) -> Result<(), QuestError> {
        let (reply, rx) = oneshot::channel();
        self.send(player_id, SessionCommand::StartQuest { quest_id, reply: Some(reply) })
            .await?;
        rx.await
            .map_err(|_| QuestError::SessionClosed(player_id.to_string()))?
    }

    pub async fn abandon_quest(
        &self,
        player_id: &str,
        quest_id: QuestId,
    ) -> Result<(), QuestError> {
        let (reply, rx) = oneshot::channel();
        self.send(player_id, SessionCommand::AbandonQuest { quest_id, reply: Some(reply) })
            .await?;
        rx.await
            .map_err(|_| QuestError::SessionClosed(player_id.to_string()))?
    }

    pub async fn complete_quest(
        &self,
        player_id: &str,
        quest_id: QuestId,
    ) -> Result<Vec<Reward>, QuestError> {
        let (reply, rx) = oneshot::channel();
        self.send(player_id, SessionCommand::CompleteQuest { quest_id, reply: Some(reply) })
            .await?;
        rx.await
            .map_err(|_| QuestError::SessionClosed(player_id.to_string()))?
    }

    /// Stop a player's worker once its queue is drained and hand back the
    /// character for saving
    pub async fn disconnect(&self, player_id: &str) -> Option<Character> {
        let (_, handle) = self.sessions.remove(player_id)?;
        drop(handle.tx);

        match handle.task.await {
            Ok(character) => {
                info!("Session ended for player {}", player_id);
                Some(character)
            }
            Err(e) => {
                warn!("Session task for player {} failed: {}", player_id, e);
                None
            }
        }
    }

    /// Disconnect everyone
    pub async fn shutdown(&self) -> Vec<Character> {
        let player_ids: Vec<String> = self.sessions.iter().map(|s| s.key().clone()).collect();
        let mut characters = Vec::with_capacity(player_ids.len());
        for player_id in player_ids {
            if let Some(character) = self.disconnect(&player_id).await {
                characters.push(character);
            }
        }
        characters
    }
}

async fn run_session(
    engine: Arc<ProgressEngine>,
    mut character: Character,
    mut rx: mpsc::Receiver<SessionCommand>,
) -> Character {
    while let Some(command) = rx.recv().await {
        match command {
            SessionCommand::Event(event) => {
                character.apply_world_event(&event);
                let changed = engine.dispatch(&event, &mut character);
                debug!(
                    "Player {} {} touched {} quest(s)",
                    character.player_id(),
                    event.kind().as_str(),
                    changed
                );
            }
            SessionCommand::StartQuest { quest_id, reply } => {
                let result = engine.start_quest(quest_id, &mut character);
                respond(reply, result);
            }
            SessionCommand::AbandonQuest { quest_id, reply } => {
                let result = engine.abandon_quest(quest_id, &mut character);
                respond(reply, result);
            }
            SessionCommand::CompleteQuest { quest_id, reply } => {
                let result = engine.complete_quest(quest_id, &mut character);
                respond(reply, result);
            }
        }
    }
    character
}

fn respond<T>(
    reply: Option<oneshot::Sender<Result<T, QuestError>>>,
    result: Result<T, QuestError>,
) {
    match reply {
        Some(reply) => {
            // Caller may have stopped waiting
            let _ = reply.send(result);
        }
        None => {
            if let Err(e) = result {
                warn!("Quest command failed: {}", e);
            }
        }
    }
}
