//! # Node Events
//!
//! Every event that flows through the bus, plus the filter subscribers use
//! to select them.

use serde::{Deserialize, Serialize};
use shared_types::SubsystemError;

/// All events a node publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeEvent {
    /// Every configured module started successfully. Fires once per start.
    Started,

    /// The full stop sequence ran. Fires once per stop, even when some
    /// module failed to stop.
    Stopped,

    /// An error raised by a module after start (forwarded from the switch).
    Error(SubsystemError),
}

impl NodeEvent {
    /// Topic this event is published under.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::Started | Self::Stopped => EventTopic::Lifecycle,
            Self::Error(_) => EventTopic::Error,
        }
    }

    /// Short event name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started => "start",
            Self::Stopped => "stop",
            Self::Error(_) => "error",
        }
    }
}

/// Event topics for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// `Started` / `Stopped`.
    Lifecycle,
    /// Forwarded module errors.
    Error,
}

impl EventTopic {
    /// Every topic, in declaration order.
    #[must_use]
    pub fn all() -> [EventTopic; 2] {
        [Self::Lifecycle, Self::Error]
    }
}

/// Selects which events a subscription receives.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventFilter {
    /// Accepted topics. Empty accepts every topic.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Topics this filter listens on, with "empty" expanded to all of them.
    #[must_use]
    pub fn effective_topics(&self) -> Vec<EventTopic> {
        if self.topics.is_empty() {
            EventTopic::all().to_vec()
        } else {
            self.topics.clone()
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &NodeEvent) -> bool {
        self.topics.is_empty() || self.topics.contains(&event.topic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::SubsystemId;

    #[test]
    fn test_event_topic_mapping() {
        assert_eq!(NodeEvent::Started.topic(), EventTopic::Lifecycle);
        assert_eq!(NodeEvent::Stopped.topic(), EventTopic::Lifecycle);

        let err = NodeEvent::Error(SubsystemError::runtime(SubsystemId::Switch, "boom"));
        assert_eq!(err.topic(), EventTopic::Error);
        assert_eq!(err.name(), "error");
    }

    #[test]
    fn test_filter_all() {
        let filter = EventFilter::all();
        assert!(filter.matches(&NodeEvent::Started));
        assert_eq!(filter.effective_topics().len(), 2);
    }

    #[test]
    fn test_filter_by_topic() {
        let filter = EventFilter::topics(vec![EventTopic::Error]);
        assert!(!filter.matches(&NodeEvent::Stopped));
        assert!(filter.matches(&NodeEvent::Error(SubsystemError::runtime(
            SubsystemId::Switch,
            "boom"
        ))));
        assert_eq!(filter.effective_topics(), vec![EventTopic::Error]);
    }
}
