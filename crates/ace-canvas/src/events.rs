//! The canvas-to-agent event bus
//!
//! Dispatch is synchronous and isolated: a panicking subscriber is caught,
//! logged, and skipped, and the remaining subscribers still receive the
//! event. Subscribers may filter by event kind.

use ace_schema::{CanvasEventKind, EventEnvelope};
use dashmap::DashMap;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use uuid::Uuid;

/// A subscriber's own failure; logged by the bus, never propagated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("event handler failed: {0}")]
pub struct EventError(pub String);

type Handler = Arc<dyn Fn(&EventEnvelope) -> Result<(), EventError> + Send + Sync>;

struct Subscriber {
    handler: Handler,
    /// `None` subscribes to everything
    filter: Option<HashSet<CanvasEventKind>>,
}

/// Token returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(Uuid);

/// Fan-out of canvas events to registered handlers
#[derive(Default)]
pub struct EventBus {
    subscribers: DashMap<Uuid, Subscriber>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event
    #[must_use]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&EventEnvelope) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.insert(Arc::new(handler), None)
    }

    /// Subscribe to the given event kinds only
    #[must_use]
    pub fn subscribe_filtered<F>(
        &self,
        kinds: impl IntoIterator<Item = CanvasEventKind>,
        handler: F,
    ) -> Subscription
    where
        F: Fn(&EventEnvelope) -> Result<(), EventError> + Send + Sync + 'static,
    {
        self.insert(Arc::new(handler), Some(kinds.into_iter().collect()))
    }

    fn insert(&self, handler: Handler, filter: Option<HashSet<CanvasEventKind>>) -> Subscription {
        let id = Uuid::new_v4();
        self.subscribers.insert(id, Subscriber { handler, filter });
        Subscription(id)
    }

    /// Remove a subscriber; returns whether it was present
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.subscribers.remove(&subscription.0).is_some()
    }

    /// Current subscriber count
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver one envelope to every matching subscriber.
    ///
    /// Handler errors are logged, never propagated; a panicking handler
    /// is caught and skipped. Returns how many subscribers received the
    /// event without panicking.
    pub fn emit(&self, envelope: &EventEnvelope) -> usize {
        let kind = envelope.event.kind();
        let mut delivered = 0;

        for entry in self.subscribers.iter() {
            if let Some(filter) = &entry.filter {
                if !filter.contains(&kind) {
                    continue;
                }
            }
            let handler = Arc::clone(&entry.handler);
            match catch_unwind(AssertUnwindSafe(|| handler(envelope))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(error)) => {
                    delivered += 1;
                    tracing::warn!(
                        canvas_id = %envelope.canvas_id,
                        event = ?kind,
                        %error,
                        "event subscriber failed"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        canvas_id = %envelope.canvas_id,
                        event = ?kind,
                        "event subscriber panicked, skipping"
                    );
                }
            }
        }
        delivered
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
