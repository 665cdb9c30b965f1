//! # Lifecycle Orchestration
//!
//! [`Node`] owns the module references and sequences their start and stop.
//!
//! ```text
//! start:  switch → connection manager → dht → random walk → pubsub → Started
//! stop:   pubsub → random walk → dht → connection manager → switch → Stopped
//! ```

mod node;
mod protocols;
mod state;

pub use node::Node;
pub use state::NodeState;

use shared_types::SubsystemError;
use thiserror::Error;

/// Lifecycle errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NodeError {
    /// `start`/`stop` called while a transition is in progress.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: NodeState,
    },

    /// A module failed to start. Modules started before it were stopped.
    #[error("start failed: {0}")]
    StartFailed(SubsystemError),

    /// One or more modules failed to stop.
    #[error("{} module(s) failed to stop", .0.len())]
    ModuleStop(Vec<SubsystemError>),
}

impl NodeError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            NodeError::InvalidState { .. } => "ERR_INVALID_STATE",
            NodeError::StartFailed(_) => "ERR_MODULE_START",
            NodeError::ModuleStop(_) => "ERR_MODULE_STOP",
        }
    }
}
