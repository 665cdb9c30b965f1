//! Node lifecycle state.

use mesh_telemetry::LIFECYCLE_TRANSITIONS;
use mn_02_pubsub::NodeStatus;
use parking_lot::Mutex;
use std::fmt;
use tracing::debug;

/// Where a node is in its lifecycle. A new node is `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    Stopped,
    Starting,
    Started,
    Stopping,
}

impl NodeState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Started => "started",
            Self::Stopping => "stopping",
        }
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared state cell. Handed to the pubsub façade as its [`NodeStatus`].
#[derive(Debug)]
pub(crate) struct StateCell(Mutex<NodeState>);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(Mutex::new(NodeState::Stopped))
    }

    pub(crate) fn get(&self) -> NodeState {
        *self.0.lock()
    }

    /// Move to `to` if the current state is `from`.
    ///
    /// Returns the current state on mismatch.
    pub(crate) fn transition(&self, from: NodeState, to: NodeState) -> Result<(), NodeState> {
        let mut state = self.0.lock();
        if *state != from {
            return Err(*state);
        }
        *state = to;
        drop(state);
        record(from, to);
        Ok(())
    }

    /// Move to `to` unconditionally.
    pub(crate) fn set(&self, to: NodeState) {
        let from = std::mem::replace(&mut *self.0.lock(), to);
        record(from, to);
    }
}

fn record(from: NodeState, to: NodeState) {
    debug!(from = %from, to = %to, "Node state transition");
    LIFECYCLE_TRANSITIONS.with_label_values(&[to.name()]).inc();
}

impl NodeStatus for StateCell {
    fn is_started(&self) -> bool {
        self.get() == NodeState::Started
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_stopped() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), NodeState::Stopped);
        assert!(!cell.is_started());
    }

    #[test]
    fn test_transition_requires_expected_state() {
        let cell = StateCell::new();
        assert_eq!(
            cell.transition(NodeState::Started, NodeState::Stopping),
            Err(NodeState::Stopped)
        );
        assert!(cell.transition(NodeState::Stopped, NodeState::Starting).is_ok());
        assert_eq!(cell.get(), NodeState::Starting);

        cell.set(NodeState::Started);
        assert!(cell.is_started());
    }

    #[test]
    fn test_transitions_are_counted() {
        let before = LIFECYCLE_TRANSITIONS.with_label_values(&["stopping"]).get();
        let cell = StateCell::new();
        cell.set(NodeState::Started);
        cell.set(NodeState::Stopping);
        let after = LIFECYCLE_TRANSITIONS.with_label_values(&["stopping"]).get();
        assert!(after >= before + 1.0);
    }
}
