//! # Event Publisher
//!
//! Defines the publishing side of the event bus.

use crate::events::{EventFilter, EventTopic, NodeEvent};
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Trait for publishing events to the bus.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to the bus.
    ///
    /// Returns the number of active subscribers that received the event.
    /// Zero means the event was dropped.
    fn publish(&self, event: NodeEvent) -> usize;
}

/// In-memory implementation of the event bus.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics
/// and keeps a per-topic subscriber count so publishers can ask whether
/// anybody is listening before they build an event.
pub struct InMemoryEventBus {
    /// Broadcast sender for events.
    sender: broadcast::Sender<NodeEvent>,

    /// Active subscription count by topic.
    subscriptions: Arc<RwLock<HashMap<EventTopic, usize>>>,
}

impl InMemoryEventBus {
    /// Create a new in-memory event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Subscribe to events matching a filter.
    ///
    /// The subscription is counted under each of its topics until dropped.
    #[must_use]
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let receiver = self.sender.subscribe();
        let topics = filter.effective_topics();

        if let Ok(mut subs) = self.subscriptions.write() {
            for topic in &topics {
                *subs.entry(*topic).or_insert(0) += 1;
            }
        }

        debug!(topics = ?topics, "New subscription created");

        Subscription::new(receiver, filter, self.subscriptions.clone(), topics)
    }

    /// Whether at least one live subscription listens on `topic`.
    #[must_use]
    pub fn has_subscribers(&self, topic: EventTopic) -> bool {
        self.subscriptions
            .read()
            .map(|subs| subs.get(&topic).copied().unwrap_or(0) > 0)
            .unwrap_or(false)
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for InMemoryEventBus {
    fn publish(&self, event: NodeEvent) -> usize {
        let name = event.name();

        match self.sender.send(event) {
            Ok(receiver_count) => {
                debug!(event = name, receivers = receiver_count, "Event published");
                receiver_count
            }
            Err(_) => {
                trace!(event = name, "Event dropped (no receivers)");
                0
            }
        }
    }
}
