//! Negotiation errors.

use thiserror::Error;

/// Why a single connection's protocol negotiation failed.
///
/// These never escape the multiplexer: they are reported to the
/// connection observer and logged, and only the failing connection is
/// dropped.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// Underlying stream failed mid-exchange.
    #[error("negotiation I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A length prefix announced more than the allowed message size.
    #[error("negotiation message of {size} bytes exceeds limit of {limit}")]
    MessageTooLarge { size: usize, limit: usize },

    /// Bad length prefix, missing newline or non-UTF-8 payload.
    #[error("invalid negotiation message: {0}")]
    InvalidMessage(String),

    /// The peer did not open with the expected protocol header.
    #[error("unexpected negotiation header: {0:?}")]
    HeaderMismatch(String),

    /// The peer closed the stream before a protocol was agreed.
    #[error("negotiation exhausted without agreeing on a protocol")]
    Exhausted,
}

impl NegotiationError {
    /// Stable error code shared by every negotiation failure.
    pub const CODE: &'static str = "ERR_NEGOTIATION_FAILED";

    /// Error code for API consumers.
    #[must_use]
    pub fn code(&self) -> &'static str {
        Self::CODE
    }

    /// Short label used for metrics.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::MessageTooLarge { .. } => "too_large",
            Self::InvalidMessage(_) => "invalid",
            Self::HeaderMismatch(_) => "header",
            Self::Exhausted => "exhausted",
        }
    }
}
