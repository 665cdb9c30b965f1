//! # Subsystem Trait
//!
//! The lifecycle contract every node module (switch, connection manager,
//! DHT, random walk, pubsub engine) implements so the orchestrator can drive
//! it without knowing what it is.
//!
//! ## Example Implementation
//!
//! ```rust,ignore
//! use shared_types::{Subsystem, SubsystemError, SubsystemId};
//! use async_trait::async_trait;
//!
//! pub struct MyDht { /* ... */ }
//!
//! #[async_trait]
//! impl Subsystem for MyDht {
//!     fn id(&self) -> SubsystemId { SubsystemId::Dht }
//!     async fn start(&self) -> Result<(), SubsystemError> { Ok(()) }
//!     async fn stop(&self) -> Result<(), SubsystemError> { Ok(()) }
//! }
//! ```

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entities::SubsystemId;

/// Error type for subsystem operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsystemError {
    /// The subsystem that encountered the error.
    pub subsystem_id: SubsystemId,
    /// Error kind.
    pub kind: SubsystemErrorKind,
    /// Human-readable error message.
    pub message: String,
}

impl SubsystemError {
    pub fn new(
        subsystem_id: SubsystemId,
        kind: SubsystemErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            subsystem_id,
            kind,
            message: message.into(),
        }
    }

    pub fn start_failed(subsystem_id: SubsystemId, message: impl Into<String>) -> Self {
        Self::new(subsystem_id, SubsystemErrorKind::StartFailed, message)
    }

    pub fn stop_failed(subsystem_id: SubsystemId, message: impl Into<String>) -> Self {
        Self::new(subsystem_id, SubsystemErrorKind::ShutdownFailed, message)
    }

    pub fn runtime(subsystem_id: SubsystemId, message: impl Into<String>) -> Self {
        Self::new(subsystem_id, SubsystemErrorKind::RuntimeError, message)
    }
}

impl fmt::Display for SubsystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.subsystem_id, self.kind, self.message)
    }
}

impl std::error::Error for SubsystemError {}

/// Categories of subsystem errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubsystemErrorKind {
    /// Subsystem failed to start.
    StartFailed,
    /// Subsystem encountered a runtime error.
    RuntimeError,
    /// Subsystem failed to shut down gracefully.
    ShutdownFailed,
}

impl fmt::Display for SubsystemErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StartFailed => write!(f, "StartFailed"),
            Self::RuntimeError => write!(f, "RuntimeError"),
            Self::ShutdownFailed => write!(f, "ShutdownFailed"),
        }
    }
}

/// The lifecycle trait that every orchestrated module implements.
///
/// Implementations must tolerate `stop` after a failed or partial `start`;
/// the orchestrator only calls `stop` on modules whose `start` succeeded,
/// but a module may be started and stopped several times over its life.
#[async_trait]
pub trait Subsystem: Send + Sync {
    /// Get the identifier for this module.
    fn id(&self) -> SubsystemId;

    /// Get the human-readable name.
    fn name(&self) -> &'static str {
        self.id().name()
    }

    /// Bring the module up. Called once per node start, in dependency order.
    async fn start(&self) -> Result<(), SubsystemError>;

    /// Tear the module down. Called in reverse start order.
    async fn stop(&self) -> Result<(), SubsystemError>;
}
