use serde::Deserialize;
use std::{path::PathBuf, sync::Arc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use quest_server::protocol::{encode_server_message, ServerMessage};
use quest_server::quest::{
    ChannelNotifier, GameEvent, HotReloadEvent, ProgressEngine, QuestId, QuestNotification,
    QuestRegistry,
};
use quest_server::{Character, ServerConfig, SessionManager};

// ============================================================================
// Replay Input
// ============================================================================

/// One line of newline-delimited JSON read from stdin
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ReplayCommand {
    /// Spawn a session for a character
    Connect {
        player_id: String,
        #[serde(default = "default_level")]
        level: i32,
        #[serde(default)]
        completed: Vec<QuestId>,
    },
    /// Gameplay event from the world
    Event {
        #[serde(flatten)]
        event: GameEvent,
    },
    Start { player_id: String, quest_id: QuestId },
    Abandon { player_id: String, quest_id: QuestId },
    Complete { player_id: String, quest_id: QuestId },
    Disconnect { player_id: String },
}

fn default_level() -> i32 {
    1
}

async fn handle_command(sessions: &SessionManager, command: ReplayCommand) {
    match command {
        ReplayCommand::Connect { player_id, level, completed } => {
            let mut character = Character::new(&player_id, level);
            for quest_id in completed {
                character.quests.mark_completed(quest_id);
            }
            sessions.connect(character);
        }
        ReplayCommand::Event { event } => {
            if !sessions.publish(event).await {
                debug!("Event for a player without session dropped");
            }
        }
        ReplayCommand::Start { player_id, quest_id } => {
            if let Err(e) = sessions.start_quest(&player_id, quest_id).await {
                warn!("Player {} could not start quest {}: {}", player_id, quest_id, e);
            }
        }
        ReplayCommand::Abandon { player_id, quest_id } => {
            if let Err(e) = sessions.abandon_quest(&player_id, quest_id).await {
                warn!("Player {} could not abandon quest {}: {}", player_id, quest_id, e);
            }
        }
        ReplayCommand::Complete { player_id, quest_id } => {
            match sessions.complete_quest(&player_id, quest_id).await {
                Ok(rewards) => info!(
                    "Player {} earned {} reward(s) from quest {}",
                    player_id,
                    rewards.len(),
                    quest_id
                ),
                Err(e) => warn!(
                    "Player {} could not complete quest {}: {}",
                    player_id, quest_id, e
                ),
            }
        }
        ReplayCommand::Disconnect { player_id } => {
            if let Some(character) = sessions.disconnect(&player_id).await {
                log_quest_log(&character);
            }
        }
    }
}

fn log_quest_log(character: &Character) {
    for progress in character.quests.active() {
        info!(
            "{}: quest {} active, current objective {:?}",
            character.id,
            progress.quest_id,
            progress.current_ident()
        );
    }
    info!("{}: completed quests {:?}", character.id, character.quests.completed_ids());
}

/// Encode notifications as they would go to clients. After shutdown is
/// signalled the channel is closed and whatever is still queued is flushed.
async fn deliver_notifications(
    engine: Arc<ProgressEngine>,
    mut rx: mpsc::Receiver<QuestNotification>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(notification) => deliver(&engine, &notification),
                None => return,
            },
            _ = &mut shutdown => break,
        }
    }

    rx.close();
    while let Some(notification) = rx.recv().await {
        deliver(&engine, &notification);
    }
}

fn deliver(engine: &ProgressEngine, notification: &QuestNotification) {
    let quest = engine.get(notification.quest_id());
    let msg = ServerMessage::from_notification(notification, quest.as_deref());
    match encode_server_message(&msg) {
        Ok(data) => info!(
            "-> {} {} ({} bytes)",
            notification.player_id(),
            msg.msg_type(),
            data.len()
        ),
        Err(e) => error!(
            "Failed to encode {} for {}: {}",
            msg.msg_type(),
            notification.player_id(),
            e
        ),
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("quest-server.toml"));

    // Logging isn't up yet, so report how the config was resolved afterwards
    let (config, config_error) = match ServerConfig::load(&config_path) {
        Ok(Some(config)) => (config, None),
        Ok(None) => (
            ServerConfig::default(),
            Some(format!("No config at {:?}, using defaults", config_path)),
        ),
        Err(e) => (
            ServerConfig::default(),
            Some(format!("Invalid config, using defaults: {}", e)),
        ),
    };

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match config_error {
        Some(message) => warn!("{}", message),
        None => info!("Loaded config from {:?}", config_path),
    }

    let (notification_tx, notification_rx) = mpsc::channel(config.notification_queue.max(1));
    let engine = Arc::new(ProgressEngine::new(Arc::new(ChannelNotifier::new(notification_tx))));

    // Load quest registry from TOML files
    let quest_registry = Arc::new(QuestRegistry::new(&config.data_dir, Arc::clone(&engine)));
    if let Err(e) = quest_registry.load_all() {
        error!("Failed to load quest registry: {}", e);
    }

    if config.hot_reload {
        match quest_registry.start_file_watcher() {
            Ok(mut rx) => {
                tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        match event {
                            HotReloadEvent::Reloaded(path) => info!("Quest hot-reload: {}", path),
                            HotReloadEvent::Error(e) => error!("Quest hot-reload error: {}", e),
                        }
                    }
                });
                info!("Quest hot-reload enabled");
            }
            Err(e) => warn!("Failed to start quest hot-reload: {}", e),
        }
    }

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let delivery = tokio::spawn(deliver_notifications(
        Arc::clone(&engine),
        notification_rx,
        shutdown_rx,
    ));
    let sessions = SessionManager::new(Arc::clone(&engine), config.session_queue);

    info!("Reading replay commands from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                match serde_json::from_str::<ReplayCommand>(line) {
                    Ok(command) => handle_command(&sessions, command).await,
                    Err(e) => warn!("Skipping malformed line: {}", e),
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    for character in sessions.shutdown().await {
        log_quest_log(&character);
    }

    let _ = shutdown_tx.send(());
    if let Err(e) = delivery.await {
        error!("Notification delivery task failed: {}", e);
    }
}
