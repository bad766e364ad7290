//! Event Subscriptions
//!
//! Maps each event stream to the set of quests listening to it. Subscribing
//! twice is a no-op, so a quest never receives the same event more than once.

use dashmap::DashMap;
use std::collections::BTreeSet;

use super::definition::QuestId;
use super::events::EventKind;

#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    by_kind: DashMap<EventKind, BTreeSet<QuestId>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the subscription is new
    pub fn subscribe(&self, quest_id: QuestId, kind: EventKind) -> bool {
        self.by_kind.entry(kind).or_default().insert(quest_id)
    }

    /// Returns true if a subscription was removed
    pub fn unsubscribe(&self, quest_id: QuestId, kind: EventKind) -> bool {
        match self.by_kind.get_mut(&kind) {
            Some(mut quests) => quests.remove(&quest_id),
            None => false,
        }
    }

    /// Remove every subscription held by a quest, returning how many there were
    pub fn unsubscribe_all(&self, quest_id: QuestId) -> usize {
        let mut removed = 0;
        for mut entry in self.by_kind.iter_mut() {
            if entry.value_mut().remove(&quest_id) {
                removed += 1;
            }
        }
        removed
    }

    pub fn is_subscribed(&self, quest_id: QuestId, kind: EventKind) -> bool {
        self.by_kind
            .get(&kind)
            .map_or(false, |quests| quests.contains(&quest_id))
    }

    /// Snapshot of the quests subscribed to a stream, in id order
    pub fn subscribers(&self, kind: EventKind) -> Vec<QuestId> {
        self.by_kind
            .get(&kind)
            .map(|quests| quests.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_is_idempotent() {
        let registry = SubscriptionRegistry::new();

        assert!(registry.subscribe(10, EventKind::CreatureKilled));
        assert!(!registry.subscribe(10, EventKind::CreatureKilled));
        registry.subscribe(11, EventKind::CreatureKilled);

        assert_eq!(registry.subscribers(EventKind::CreatureKilled), vec![10, 11]);
        assert!(registry.subscribers(EventKind::ItemReceived).is_empty());
    }

    #[test]
    fn test_unsubscribe_all() {
        let registry = SubscriptionRegistry::new();
        registry.subscribe(10, EventKind::ItemReceived);
        registry.subscribe(10, EventKind::ItemRemoved);
        registry.subscribe(12, EventKind::ItemRemoved);

        assert_eq!(registry.unsubscribe_all(10), 2);
        assert_eq!(registry.unsubscribe_all(10), 0);
        assert!(!registry.is_subscribed(10, EventKind::ItemRemoved));
        assert!(registry.is_subscribed(12, EventKind::ItemRemoved));

        assert!(registry.unsubscribe(12, EventKind::ItemRemoved));
        assert!(!registry.unsubscribe(12, EventKind::ItemRemoved));
    }
}
