//! Message handlers.
//!
//! Callers register handlers against topics; every inbound message on a
//! topic is delivered to each handler registered for it. Handlers are
//! identified by the `Arc` they were registered with, so registering the
//! same handler twice is a no-op and removal takes the same `Arc`.

use serde_json::Value;
use std::sync::Arc;

/// A callback invoked once per inbound message on a subscribed topic.
pub trait MessageHandler: Send + Sync {
    /// Handle one decoded message payload.
    fn on_message(&self, payload: &Value);
}

/// Shared handle to a registered handler; identity is the allocation.
pub type HandlerRef = Arc<dyn MessageHandler>;

struct FnHandler<F>(F);

impl<F> MessageHandler for FnHandler<F>
where
    F: Fn(&Value) + Send + Sync,
{
    fn on_message(&self, payload: &Value) {
        (self.0)(payload);
    }
}

/// Wrap a closure as a [`HandlerRef`].
pub fn handler_fn<F>(f: F) -> HandlerRef
where
    F: Fn(&Value) + Send + Sync + 'static,
{
    Arc::new(FnHandler(f))
}

/// The handlers registered for one topic, in insertion order.
#[derive(Default)]
pub struct HandlerSet {
    slots: Vec<HandlerRef>,
}

impl HandlerSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler.
    ///
    /// Returns `false` (and leaves the set unchanged) if this exact handler
    /// is already registered.
    pub fn insert(&mut self, handler: HandlerRef) -> bool {
        if self.contains(&handler) {
            return false;
        }
        self.slots.push(handler);
        true
    }

    /// Remove a handler.
    ///
    /// Returns `true` if the handler was registered.
    pub fn remove(&mut self, handler: &HandlerRef) -> bool {
        let before = self.slots.len();
        self.slots.retain(|h| !Arc::ptr_eq(h, handler));
        self.slots.len() != before
    }

    /// Check whether a handler is registered.
    #[must_use]
    pub fn contains(&self, handler: &HandlerRef) -> bool {
        self.slots.iter().any(|h| Arc::ptr_eq(h, handler))
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Clone the handlers out for dispatch, preserving insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<HandlerRef> {
        self.slots.clone()
    }
}
