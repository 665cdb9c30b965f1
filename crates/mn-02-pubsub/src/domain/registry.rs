//! Local topic handler registry.
//!
//! A topic is present in the registry if and only if it has at least one
//! handler. The façade announces a topic to the engine when it first
//! appears here and withdraws it when it disappears.

use crate::domain::message::{HandlerId, TopicHandler};
use std::collections::HashMap;

/// Handlers per topic, in registration order.
#[derive(Default)]
pub struct TopicRegistry {
    topics: HashMap<String, Vec<(HandlerId, TopicHandler)>>,
    next_id: u64,
}

impl TopicRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handlers registered for `topic`.
    #[must_use]
    pub fn handler_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map_or(0, Vec::len)
    }

    /// Whether `topic` has any handler.
    #[must_use]
    pub fn has_handlers(&self, topic: &str) -> bool {
        self.handler_count(topic) > 0
    }

    /// Register `handler` and return its id.
    pub fn add(&mut self, topic: &str, handler: TopicHandler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.topics
            .entry(topic.to_string())
            .or_default()
            .push((id, handler));
        id
    }

    /// Remove one handler. Returns `true` if it was registered.
    pub fn remove(&mut self, topic: &str, id: HandlerId) -> bool {
        let Some(handlers) = self.topics.get_mut(topic) else {
            return false;
        };
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != id);
        let removed = handlers.len() != before;
        if handlers.is_empty() {
            self.topics.remove(topic);
        }
        removed
    }

    /// Remove every handler for `topic`. Returns how many were removed.
    pub fn remove_all(&mut self, topic: &str) -> usize {
        self.topics.remove(topic).map_or(0, |handlers| handlers.len())
    }

    /// Snapshot of the handlers for `topic`.
    #[must_use]
    pub fn handlers(&self, topic: &str) -> Vec<TopicHandler> {
        self.topics
            .get(topic)
            .map(|handlers| handlers.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default()
    }

    /// Whether removing `handler` (every handler when `None`) would leave
    /// `topic` without handlers.
    #[must_use]
    pub fn would_empty(&self, topic: &str, handler: Option<HandlerId>) -> bool {
        match (self.topics.get(topic), handler) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(handlers), Some(id)) => handlers.iter().all(|(h, _)| *h == id),
        }
    }
}
