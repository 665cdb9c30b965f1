//! PubSub error types.

use thiserror::Error;

/// Failure reported by the pubsub engine itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors returned by the pubsub façade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PubSubError {
    /// Neither the node nor the engine is started.
    #[error("The node is not started yet")]
    NotStarted,

    /// `publish` was given something other than a byte buffer.
    #[error("data must be a byte buffer, got {0}")]
    InvalidData(&'static str),

    /// The engine rejected the operation.
    #[error("pubsub engine error: {0}")]
    Engine(#[from] EngineError),
}

impl PubSubError {
    /// Error code for API consumers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotStarted => "ERR_PUBSUB_NOT_STARTED",
            Self::InvalidData(_) => "ERR_DATA_IS_NOT_A_BUFFER",
            Self::Engine(_) => "ERR_PUBSUB_ENGINE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(PubSubError::NotStarted.code(), "ERR_PUBSUB_NOT_STARTED");
        assert_eq!(
            PubSubError::InvalidData("text").code(),
            "ERR_DATA_IS_NOT_A_BUFFER"
        );
        assert_eq!(
            PubSubError::from(EngineError::new("no peers")).to_string(),
            "pubsub engine error: no peers"
        );
    }
}
