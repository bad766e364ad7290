//! Quest Progress Engine
//!
//! Bridges gameplay events to per-player quest progress. Quest definitions
//! are shared and read-only; every mutation happens on the progress record
//! inside the player's own quest log, so the caller only needs exclusive
//! access to that one player.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::definition::{QuestDefinition, QuestId};
use super::events::{Creature, EventKind, GameEvent, QuestNotification};
use super::notifier::QuestNotifier;
use super::prerequisite;
use super::reward::Reward;
use super::state::QuestProgress;
use super::subscriptions::SubscriptionRegistry;
use crate::error::QuestError;
use crate::player::QuestPlayer;

pub struct ProgressEngine {
    quests: DashMap<QuestId, Arc<QuestDefinition>>,
    subscriptions: SubscriptionRegistry,
    notifier: Arc<dyn QuestNotifier>,
}

impl ProgressEngine {
    pub fn new(notifier: Arc<dyn QuestNotifier>) -> Self {
        Self {
            quests: DashMap::new(),
            subscriptions: SubscriptionRegistry::new(),
            notifier,
        }
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Publish a quest definition and subscribe it to the event streams its
    /// objectives need. Registering an id again replaces the old definition.
    pub fn register(&self, quest: QuestDefinition) -> Arc<QuestDefinition> {
        let quest = Arc::new(quest);
        let quest_id = quest.id();

        if self.quests.insert(quest_id, Arc::clone(&quest)).is_some() {
            info!("Replacing quest definition {}", quest_id);
            self.subscriptions.unsubscribe_all(quest_id);
        }

        for kind in quest.subscriptions() {
            self.subscriptions.subscribe(quest_id, *kind);
        }

        debug!(
            "Registered quest {} ({}) for {:?}",
            quest_id,
            quest.name(),
            quest.subscriptions()
        );

        quest
    }

    /// Remove a quest and all its subscriptions. Deliveries already in
    /// flight finish against the definition they started with.
    pub fn unregister(&self, quest_id: QuestId) -> Option<Arc<QuestDefinition>> {
        self.subscriptions.unsubscribe_all(quest_id);
        self.quests.remove(&quest_id).map(|(_, quest)| quest)
    }

    pub fn get(&self, quest_id: QuestId) -> Option<Arc<QuestDefinition>> {
        self.quests.get(&quest_id).map(|q| Arc::clone(q.value()))
    }

    pub fn contains(&self, quest_id: QuestId) -> bool {
        self.quests.contains_key(&quest_id)
    }

    pub fn ids(&self) -> Vec<QuestId> {
        self.quests.iter().map(|q| *q.key()).collect()
    }

    pub fn count(&self) -> usize {
        self.quests.len()
    }

    pub fn is_subscribed(&self, quest_id: QuestId, kind: EventKind) -> bool {
        self.subscriptions.is_subscribed(quest_id, kind)
    }

    // ========================================================================
    // Event dispatch
    // ========================================================================

    /// Deliver an event to every subscribed quest for this player.
    /// Returns the number of quests whose progress changed.
    pub fn dispatch<P: QuestPlayer + ?Sized>(&self, event: &GameEvent, player: &mut P) -> usize {
        if event.player_id() != player.player_id() {
            debug!(
                "Ignoring {} for '{}' delivered to '{}'",
                event.kind().as_str(),
                event.player_id(),
                player.player_id()
            );
            return 0;
        }

        let mut changed = 0;
        for quest in self.subscribed_quests(event.kind()) {
            let updated = match event {
                GameEvent::PlayerLoggedIn { .. } => self.on_player_logged_in(&quest, player),
                GameEvent::CreatureKilled { creature, .. } => {
                    self.on_creature_killed(&quest, creature, player)
                }
                GameEvent::ItemReceived { item_id, .. }
                | GameEvent::ItemRemoved { item_id, .. } => {
                    self.on_item_changed(&quest, *item_id, player)
                }
                GameEvent::NpcTalked { npc_name, .. } => {
                    self.on_npc_talked(&quest, npc_name, player)
                }
            };
            if updated {
                changed += 1;
            }
        }
        changed
    }

    /// Snapshot subscribed definitions so no map guard is held while
    /// handlers run
    fn subscribed_quests(&self, kind: EventKind) -> Vec<Arc<QuestDefinition>> {
        self.subscriptions
            .subscribers(kind)
            .into_iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Start automatic quests whose prerequisites are met
    fn on_player_logged_in<P: QuestPlayer + ?Sized>(
        &self,
        quest: &QuestDefinition,
        player: &mut P,
    ) -> bool {
        if !quest.is_automatic() || player.quest_log().has(quest.id()) {
            return false;
        }

        if !prerequisite::all_met(quest.prerequisites(), &*player) {
            return false;
        }

        self.start(quest, player)
    }

    /// Count kills towards the current objective
    fn on_creature_killed<P: QuestPlayer + ?Sized>(
        &self,
        quest: &QuestDefinition,
        creature: &Creature,
        player: &mut P,
    ) -> bool {
        let Some(progress) = active_progress(quest, player) else {
            return false;
        };

        let Some(current) = progress.current_objective_mut() else {
            return false;
        };

        let Some(objective) = quest.get_objective(&current.ident) else {
            return false;
        };

        if !objective.kind.matches_creature(creature) {
            return false;
        }

        let amount = objective.amount();
        if current.count >= amount {
            return false;
        }

        current.count += 1;
        if current.count >= amount {
            current.done = true;
        }
        let count = current.count;

        debug!(
            "Player {} progress on objective {} for quest {}: {}/{}",
            player.player_id(),
            objective.ident,
            quest.id(),
            count,
            amount
        );

        self.notify_progress(quest.id(), player);
        true
    }

    /// Resynchronize a collect objective with the player's inventory.
    /// Looks at the last objective once everything is done, so losing the
    /// items afterwards still reopens it.
    fn on_item_changed<P: QuestPlayer + ?Sized>(
        &self,
        quest: &QuestDefinition,
        item_id: i32,
        player: &mut P,
    ) -> bool {
        let held = player.held_item_count(item_id);

        let Some(progress) = active_progress(quest, player) else {
            return false;
        };

        let Some(current) = progress.current_or_last_mut() else {
            return false;
        };

        let Some(objective) = quest.get_objective(&current.ident) else {
            return false;
        };

        if !objective.kind.matches_item(item_id) {
            return false;
        }

        let amount = objective.amount();
        let before = (current.count, current.done);

        current.count = held;
        if !current.done && current.count >= amount {
            current.done = true;
        } else if current.done && current.count < amount {
            current.done = false;
        }

        if before == (current.count, current.done) {
            return false;
        }

        debug!(
            "Player {} holds {}/{} for objective {} of quest {}",
            player.player_id(),
            held,
            amount,
            objective.ident,
            quest.id()
        );

        self.notify_progress(quest.id(), player);
        true
    }

    /// Finish a talk objective when it is the current one
    fn on_npc_talked<P: QuestPlayer + ?Sized>(
        &self,
        quest: &QuestDefinition,
        npc_name: &str,
        player: &mut P,
    ) -> bool {
        let Some(progress) = active_progress(quest, player) else {
            return false;
        };

        let Some(current) = progress.current_objective_mut() else {
            return false;
        };

        let Some(objective) = quest.get_objective(&current.ident) else {
            return false;
        };

        if !objective.kind.matches_npc(npc_name) {
            return false;
        }

        current.count = objective.amount();
        current.done = true;

        self.notify_progress(quest.id(), player);
        true
    }

    fn notify_progress<P: QuestPlayer + ?Sized>(&self, quest_id: QuestId, player: &P) {
        if let Some(progress) = player.quest_log().get(quest_id) {
            self.notifier.notify(QuestNotification::ProgressChanged {
                player_id: player.player_id().to_string(),
                progress: progress.clone(),
            });
        }
    }

    fn start<P: QuestPlayer + ?Sized>(&self, quest: &QuestDefinition, player: &mut P) -> bool {
        let player_id = player.player_id().to_string();
        match player.quest_log_mut().start(quest) {
            Some(progress) => {
                info!("Player {} started quest {} ({})", player_id, quest.id(), quest.name());
                self.notifier.notify(QuestNotification::Started {
                    player_id,
                    progress: progress.clone(),
                });
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Player-initiated operations
    // ========================================================================

    /// Start a quest on the player's request
    pub fn start_quest<P: QuestPlayer + ?Sized>(
        &self,
        quest_id: QuestId,
        player: &mut P,
    ) -> Result<(), QuestError> {
        let quest = self.get(quest_id).ok_or(QuestError::QuestNotFound(quest_id))?;

        if player.quest_log().has(quest_id) {
            return Err(QuestError::AlreadyHeld(quest_id));
        }

        if !prerequisite::all_met(quest.prerequisites(), &*player) {
            return Err(QuestError::PrerequisitesNotMet(quest_id));
        }

        self.start(&quest, player);
        Ok(())
    }

    /// Drop an active quest, if its definition allows it
    pub fn abandon_quest<P: QuestPlayer + ?Sized>(
        &self,
        quest_id: QuestId,
        player: &mut P,
    ) -> Result<(), QuestError> {
        if !player.quest_log().is_active(quest_id) {
            return Err(QuestError::NotActive(quest_id));
        }

        if let Some(quest) = self.get(quest_id) {
            if !quest.cancelable() {
                return Err(QuestError::NotCancelable(quest_id));
            }
        }

        player.quest_log_mut().abandon(quest_id);
        info!("Player {} abandoned quest {}", player.player_id(), quest_id);

        self.notifier.notify(QuestNotification::Abandoned {
            player_id: player.player_id().to_string(),
            quest_id,
        });
        Ok(())
    }

    /// Turn in a finished quest. Returns the rewards for the caller to grant.
    pub fn complete_quest<P: QuestPlayer + ?Sized>(
        &self,
        quest_id: QuestId,
        player: &mut P,
    ) -> Result<Vec<Reward>, QuestError> {
        let quest = self.get(quest_id).ok_or(QuestError::QuestNotFound(quest_id))?;

        let progress = player
            .quest_log_mut()
            .get_mut(quest_id)
            .ok_or(QuestError::NotActive(quest_id))?;

        // Objectives added by a reload must be finished too
        progress.reconcile(&quest);
        if !progress.is_complete() {
            return Err(QuestError::Unfinished(quest_id));
        }

        player.quest_log_mut().complete(quest_id);
        info!("Player {} completed quest {} ({})", player.player_id(), quest_id, quest.name());

        let rewards = quest.rewards().to_vec();
        self.notifier.notify(QuestNotification::Completed {
            player_id: player.player_id().to_string(),
            quest_id,
            rewards: rewards.clone(),
        });
        Ok(rewards)
    }
}

/// The player's progress on an active quest, aligned with the definition
/// currently registered
fn active_progress<'p, P: QuestPlayer + ?Sized>(
    quest: &QuestDefinition,
    player: &'p mut P,
) -> Option<&'p mut QuestProgress> {
    let progress = player.quest_log_mut().get_mut(quest.id())?;
    if progress.reconcile(quest) {
        debug!("Quest {} progress realigned with its reloaded definition", quest.id());
    }
    Some(progress)
}
