//! Messages, payloads and handler handles.

use bytes::Bytes;
use shared_types::PeerId;
use std::fmt;
use std::sync::Arc;

/// A message delivered to local topic handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubMessage {
    /// Originating peer.
    pub from: PeerId,
    /// Topics the message was published to.
    pub topic_ids: Vec<String>,
    /// Message body.
    pub data: Bytes,
    /// Sequence number assigned by the publisher.
    pub seqno: Vec<u8>,
}

/// Callback invoked for every message on a subscribed topic.
pub type TopicHandler = Arc<dyn Fn(&PubSubMessage) + Send + Sync>;

/// Identifies one registered handler so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub(crate) u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler-{}", self.0)
    }
}

/// Anything a caller may try to publish.
///
/// Only [`Payload::Bytes`] is publishable; the other variants exist so a
/// misuse is rejected with a typed error instead of being coerced.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw byte buffer.
    Bytes(Bytes),
    /// UTF-8 text.
    Text(String),
    /// Structured value.
    Json(serde_json::Value),
}

impl Payload {
    /// Variant name for error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
            Self::Text(_) => "text",
            Self::Json(_) => "json",
        }
    }
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self {
        Self::Bytes(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(value))
    }
}

impl From<&'static [u8]> for Payload {
    fn from(value: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(value))
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_conversions() {
        assert_eq!(Payload::from(vec![1u8, 2, 3]).kind(), "bytes");
        assert_eq!(Payload::from(&b"raw"[..]).kind(), "bytes");
        assert_eq!(Payload::from("hello").kind(), "text");
        assert_eq!(Payload::from(serde_json::json!({"a": 1})).kind(), "json");
    }

    #[test]
    fn test_handler_id_display() {
        assert_eq!(HandlerId(7).to_string(), "handler-7");
    }
}
