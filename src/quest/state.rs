//! Quest State Tracking
//!
//! Per-player quest progress. Everything here is owned by a single player's
//! quest log and is never shared between players.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::definition::{QuestDefinition, QuestId};

/// Progress on a single objective
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectiveProgress {
    pub ident: String,
    pub count: i32,
    pub done: bool,
}

impl ObjectiveProgress {
    pub fn new(ident: &str) -> Self {
        Self {
            ident: ident.to_string(),
            count: 0,
            done: false,
        }
    }
}

/// Complete quest progress for a player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestProgress {
    pub quest_id: QuestId,
    /// One entry per objective, in definition order
    pub objectives: Vec<ObjectiveProgress>,
    /// When the quest was started
    pub started_at: DateTime<Utc>,
}

impl QuestProgress {
    /// Fresh progress with every objective at zero
    pub fn new(quest: &QuestDefinition) -> Self {
        Self {
            quest_id: quest.id(),
            objectives: quest
                .objectives()
                .iter()
                .map(|o| ObjectiveProgress::new(&o.ident))
                .collect(),
            started_at: Utc::now(),
        }
    }

    pub fn get(&self, ident: &str) -> Option<&ObjectiveProgress> {
        self.objectives.iter().find(|o| o.ident == ident)
    }

    pub fn get_mut(&mut self, ident: &str) -> Option<&mut ObjectiveProgress> {
        self.objectives.iter_mut().find(|o| o.ident == ident)
    }

    /// First objective that isn't done, if any
    pub fn current_objective(&self) -> Option<&ObjectiveProgress> {
        self.objectives.iter().find(|o| !o.done)
    }

    pub fn current_objective_mut(&mut self) -> Option<&mut ObjectiveProgress> {
        self.objectives.iter_mut().find(|o| !o.done)
    }

    pub fn current_ident(&self) -> Option<&str> {
        self.current_objective().map(|o| o.ident.as_str())
    }

    /// Current objective, or the last one once everything is done
    pub fn current_or_last_mut(&mut self) -> Option<&mut ObjectiveProgress> {
        match self.objectives.iter().position(|o| !o.done) {
            Some(index) => self.objectives.get_mut(index),
            None => self.objectives.last_mut(),
        }
    }

    pub fn set_done(&mut self, ident: &str) {
        if let Some(objective) = self.get_mut(ident) {
            objective.done = true;
        }
    }

    pub fn set_undone(&mut self, ident: &str) {
        if let Some(objective) = self.get_mut(ident) {
            objective.done = false;
        }
    }

    /// All objectives done, ready to turn in
    pub fn is_complete(&self) -> bool {
        self.objectives.iter().all(|o| o.done)
    }

    /// Line the entries up with the definition's objectives again after
    /// content was reloaded. Known idents keep their progress, new ones
    /// start at zero and removed ones are dropped. Returns true if anything
    /// changed.
    pub fn reconcile(&mut self, quest: &QuestDefinition) -> bool {
        let in_sync = self.objectives.len() == quest.objectives().len()
            && self
                .objectives
                .iter()
                .zip(quest.objectives())
                .all(|(progress, objective)| progress.ident == objective.ident);
        if in_sync {
            return false;
        }

        let mut previous = std::mem::take(&mut self.objectives);
        self.objectives = quest
            .objectives()
            .iter()
            .map(|objective| match previous.iter().position(|p| p.ident == objective.ident) {
                Some(index) => previous.swap_remove(index),
                None => ObjectiveProgress::new(&objective.ident),
            })
            .collect();
        true
    }
}

/// All quest state for a single player
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestLog {
    /// Active quests (quest_id -> progress)
    active: BTreeMap<QuestId, QuestProgress>,
    /// Completed quest IDs
    completed: BTreeSet<QuestId>,
}

impl QuestLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Player holds the quest, either active or already completed
    pub fn has(&self, quest_id: QuestId) -> bool {
        self.is_active(quest_id) || self.is_completed(quest_id)
    }

    pub fn is_active(&self, quest_id: QuestId) -> bool {
        self.active.contains_key(&quest_id)
    }

    pub fn is_completed(&self, quest_id: QuestId) -> bool {
        self.completed.contains(&quest_id)
    }

    /// Get active quest progress
    pub fn get(&self, quest_id: QuestId) -> Option<&QuestProgress> {
        self.active.get(&quest_id)
    }

    /// Get mutable active quest progress
    pub fn get_mut(&mut self, quest_id: QuestId) -> Option<&mut QuestProgress> {
        self.active.get_mut(&quest_id)
    }

    /// Start a quest. Returns the new progress, or `None` if the quest is
    /// already held.
    pub fn start(&mut self, quest: &QuestDefinition) -> Option<&QuestProgress> {
        if self.has(quest.id()) {
            return None;
        }
        self.active.insert(quest.id(), QuestProgress::new(quest));
        self.active.get(&quest.id())
    }

    /// Move an active quest to the completed set
    pub fn complete(&mut self, quest_id: QuestId) -> Option<QuestProgress> {
        let progress = self.active.remove(&quest_id)?;
        self.completed.insert(quest_id);
        Some(progress)
    }

    /// Drop an active quest without completing it
    pub fn abandon(&mut self, quest_id: QuestId) -> Option<QuestProgress> {
        self.active.remove(&quest_id)
    }

    /// Record a quest as completed without going through progress
    /// (restored characters, test fixtures)
    pub fn mark_completed(&mut self, quest_id: QuestId) {
        self.active.remove(&quest_id);
        self.completed.insert(quest_id);
    }

    pub fn active(&self) -> impl Iterator<Item = &QuestProgress> {
        self.active.values()
    }

    pub fn completed_ids(&self) -> &BTreeSet<QuestId> {
        &self.completed
    }
}
