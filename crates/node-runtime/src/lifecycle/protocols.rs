//! The node's protocol table and its installation on the switch.
//!
//! The table is copy-on-write: every edit builds a new table and swaps it
//! in. While the node is not stopped each edit is installed on the switch
//! before the write lock is released, so installs never race each other
//! and the switch always serves the latest table.

use crate::adapters::MeteredObserver;
use crate::lifecycle::state::{NodeState, StateCell};
use crate::ports::{ProtocolRegistrar, Switch};
use mn_01_protocol_muxer::{
    ConnectionObserver, MatchFn, ProtocolHandler, ProtocolMuxer, ProtocolTable,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) struct NodeProtocols {
    table: RwLock<Arc<ProtocolTable>>,
    observer: RwLock<Arc<dyn ConnectionObserver>>,
    switch: Arc<dyn Switch>,
    state: Arc<StateCell>,
}

impl NodeProtocols {
    pub(crate) fn new(switch: Arc<dyn Switch>, state: Arc<StateCell>) -> Self {
        Self {
            table: RwLock::new(Arc::new(ProtocolTable::new())),
            observer: RwLock::new(Arc::new(MeteredObserver::new())),
            switch,
            state,
        }
    }

    pub(crate) fn set_observer(&self, observer: Arc<dyn ConnectionObserver>) {
        let table = self.table.write();
        *self.observer.write() = observer;
        if self.state.get() != NodeState::Stopped {
            self.install_locked(&table);
        }
    }

    /// Registered protocol ids in registration order.
    pub(crate) fn protocols(&self) -> Vec<String> {
        self.table.read().protocols()
    }

    /// Install the current table on the switch.
    pub(crate) fn install(&self) {
        let table = self.table.write();
        self.install_locked(&table);
    }

    fn install_locked(&self, table: &Arc<ProtocolTable>) {
        let observer = Arc::clone(&self.observer.read());
        self.switch
            .install_muxer(ProtocolMuxer::build(Arc::clone(table), observer));
    }

    fn edit(&self, apply: impl FnOnce(&mut ProtocolTable) -> bool) -> bool {
        let mut table = self.table.write();
        let mut next = ProtocolTable::clone(&table);
        if !apply(&mut next) {
            return false;
        }
        *table = Arc::new(next);
        if self.state.get() != NodeState::Stopped {
            self.install_locked(&table);
        }
        true
    }
}

impl ProtocolRegistrar for NodeProtocols {
    fn handle(&self, protocol: &str, handler: Arc<dyn ProtocolHandler>, matcher: Option<MatchFn>) {
        if self.edit(|table| table.insert(protocol, handler, matcher)) {
            debug!(protocol, "Protocol handler registered");
        } else {
            warn!("Ignored handler with empty protocol id");
        }
    }

    fn unhandle(&self, protocol: &str) {
        if self.edit(|table| table.remove(protocol).is_some()) {
            debug!(protocol, "Protocol handler removed");
        }
    }
}
