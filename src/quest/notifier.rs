//! Quest Notifications
//!
//! Sink for notifications produced by the progress engine. Handlers run
//! synchronously, so delivery must never block.

use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use super::events::QuestNotification;

pub trait QuestNotifier: Send + Sync {
    fn notify(&self, notification: QuestNotification);
}

/// Forwards notifications into a bounded channel
pub struct ChannelNotifier {
    tx: mpsc::Sender<QuestNotification>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::Sender<QuestNotification>) -> Self {
        Self { tx }
    }
}

impl QuestNotifier for ChannelNotifier {
    fn notify(&self, notification: QuestNotification) {
        if let Err(e) = self.tx.try_send(notification) {
            warn!("Dropped quest notification: {}", e);
        }
    }
}

/// Keeps every notification in memory
#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<QuestNotification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything recorded so far
    pub fn drain(&self) -> Vec<QuestNotification> {
        match self.notifications.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl QuestNotifier for RecordingNotifier {
    fn notify(&self, notification: QuestNotification) {
        match self.notifications.lock() {
            Ok(mut guard) => guard.push(notification),
            Err(poisoned) => poisoned.into_inner().push(notification),
        }
    }
}
