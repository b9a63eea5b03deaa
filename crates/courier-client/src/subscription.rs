//! Subscription table.
//!
//! Tracks the single wire subscription backing each topic on the current
//! connection, plus the reverse index used to resolve inbound MESSAGE
//! frames back to their topic. Entries live strictly within one
//! connection's lifetime: the whole table is cleared on disconnect and
//! rebuilt by replay.

use crate::topic::Topic;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque wire subscription handle.
pub type SubscriptionId = String;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(0);

/// Generate a fresh subscription handle, unique for the process lifetime.
#[must_use]
pub fn next_subscription_id() -> SubscriptionId {
    let n = NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed);
    format!("sub-{n}")
}

/// One wire subscription: the handle sent to the broker and the destination
/// it was opened on.
#[derive(Debug, Clone)]
pub struct WireSubscription {
    /// Subscription handle, echoed back on MESSAGE frames.
    pub id: SubscriptionId,
    /// Destination path the subscription was opened on.
    pub destination: String,
}

/// Table of wire subscriptions, at most one per topic.
#[derive(Default)]
pub struct SubscriptionTable {
    by_topic: DashMap<Topic, WireSubscription>,
    by_id: DashMap<SubscriptionId, Topic>,
}

impl SubscriptionTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new wire subscription for a topic.
    ///
    /// Returns the fresh handle, or `None` if the topic already has one
    /// (the existing subscription is shared, no duplicate wire traffic).
    pub fn open(&self, topic: &str, destination: &str) -> Option<SubscriptionId> {
        if self.by_topic.contains_key(topic) {
            return None;
        }

        let id = next_subscription_id();
        self.by_topic.insert(
            topic.to_string(),
            WireSubscription {
                id: id.clone(),
                destination: destination.to_string(),
            },
        );
        self.by_id.insert(id.clone(), topic.to_string());
        Some(id)
    }

    /// Remove the wire subscription for a topic, if any.
    pub fn close(&self, topic: &str) -> Option<WireSubscription> {
        let (_, sub) = self.by_topic.remove(topic)?;
        self.by_id.remove(&sub.id);
        Some(sub)
    }

    /// Resolve a subscription handle back to its topic.
    #[must_use]
    pub fn topic_for(&self, id: &str) -> Option<Topic> {
        self.by_id.get(id).map(|t| t.clone())
    }

    /// Check if a topic has a wire subscription.
    #[must_use]
    pub fn contains(&self, topic: &str) -> bool {
        self.by_topic.contains_key(topic)
    }

    /// All topics with a live wire subscription.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        self.by_topic.iter().map(|e| e.key().clone()).collect()
    }

    /// Drop every entry (connection went away). Returns how many were
    /// cleared.
    pub fn clear(&self) -> usize {
        let count = self.by_topic.len();
        self.by_topic.clear();
        self.by_id.clear();
        count
    }

    /// Number of live wire subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_topic.len()
    }

    /// Check if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_topic.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_most_one_per_topic() {
        let table = SubscriptionTable::new();

        let id = table.open("status_C1001", "/topic/consultation/status/C1001");
        assert!(id.is_some());

        // Second open for the same topic is a no-op.
        assert!(table
            .open("status_C1001", "/topic/consultation/status/C1001")
            .is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_resolve_and_close() {
        let table = SubscriptionTable::new();

        let id = table.open("updates", "/topic/updates").unwrap();
        assert_eq!(table.topic_for(&id), Some("updates".to_string()));

        let sub = table.close("updates").unwrap();
        assert_eq!(sub.id, id);
        assert_eq!(sub.destination, "/topic/updates");
        assert!(table.topic_for(&id).is_none());
        assert!(table.close("updates").is_none());
    }

    #[test]
    fn test_clear() {
        let table = SubscriptionTable::new();
        let id_a = table.open("a", "/topic/a").unwrap();
        table.open("b", "/topic/b").unwrap();

        assert_eq!(table.clear(), 2);
        assert!(table.is_empty());
        assert!(table.topic_for(&id_a).is_none());
    }

    #[test]
    fn test_handles_are_unique() {
        let table = SubscriptionTable::new();
        let id_a = table.open("a", "/topic/a").unwrap();
        let id_b = table.open("b", "/topic/b").unwrap();
        assert_ne!(id_a, id_b);
    }
}
