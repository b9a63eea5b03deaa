//! Topic registry.
//!
//! Maps each topic to the handlers currently interested in it. The registry
//! is pure bookkeeping: it survives disconnects and is the source of truth
//! for subscription replay after a reconnect. Entries are created on the
//! first subscribe for a topic and removed when the last handler leaves, so
//! there are never dangling empty entries.

use crate::handler::{HandlerRef, HandlerSet};
use crate::topic::Topic;
use dashmap::DashMap;

/// Outcome of removing a handler from a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The handler was not registered for this topic.
    NotRegistered,
    /// The handler was removed; others remain.
    Removed,
    /// The handler was the last one; the topic entry is gone.
    RemovedLast,
}

/// Registry of topics and their handler sets.
#[derive(Default)]
pub struct TopicRegistry {
    topics: DashMap<Topic, HandlerSet>,
}

impl TopicRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a topic, creating the entry if absent.
    ///
    /// Returns `false` if this exact handler is already registered for the
    /// topic (re-registration is tolerated, not an error).
    pub fn add(&self, topic: &str, handler: HandlerRef) -> bool {
        let mut set = self.topics.entry(topic.to_string()).or_default();
        set.insert(handler)
    }

    /// Remove a handler from a topic, dropping the entry when it empties.
    pub fn remove(&self, topic: &str, handler: &HandlerRef) -> RemoveOutcome {
        let Some(mut set) = self.topics.get_mut(topic) else {
            return RemoveOutcome::NotRegistered;
        };

        if !set.remove(handler) {
            return RemoveOutcome::NotRegistered;
        }

        if set.is_empty() {
            drop(set); // Release the lock
            self.topics.remove(topic);
            return RemoveOutcome::RemovedLast;
        }

        RemoveOutcome::Removed
    }

    /// Snapshot the handlers for a topic, in insertion order.
    #[must_use]
    pub fn handlers(&self, topic: &str) -> Vec<HandlerRef> {
        self.topics
            .get(topic)
            .map(|set| set.snapshot())
            .unwrap_or_default()
    }

    /// Number of handlers registered for a topic.
    #[must_use]
    pub fn handler_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map(|set| set.len()).unwrap_or(0)
    }

    /// Check if a topic has at least one handler.
    #[must_use]
    pub fn contains(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    /// All topics with at least one handler.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        self.topics.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of registered topics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
