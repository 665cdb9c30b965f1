//! # Module Ports
//!
//! Contracts for the modules a node is assembled from. Implementations live
//! outside this crate (transports, DHT, pubsub engines) except for the
//! in-process adapters in [`crate::adapters`].
//!
//! Every module with a lifecycle implements [`Subsystem`]; the orchestrator
//! only ever calls `start`/`stop` on it.

use crate::container::DhtConfig;
use mn_01_protocol_muxer::{MatchFn, ProtocolHandler, ProtocolMuxer};
use mn_02_pubsub::PubSubEngine;
use shared_types::{PeerInfo, Subsystem, SubsystemError};
use std::sync::Arc;

/// Receives errors a module raises after start.
pub type ErrorSink = Arc<dyn Fn(SubsystemError) + Send + Sync>;

/// A transport implementation, identified by its tag (`tcp`, `ws`, ...).
pub trait Transport: Send + Sync {
    fn tag(&self) -> &str;
}

/// A peer discovery service (bootstrap list, mDNS, ...).
pub trait PeerDiscovery: Send + Sync {
    fn tag(&self) -> &str;
}

/// A peer routing implementation (e.g. a delegated router).
pub trait PeerRouting: Send + Sync {
    fn name(&self) -> &str;
}

/// A content routing implementation (e.g. a delegated router).
pub trait ContentRouting: Send + Sync {
    fn name(&self) -> &str;
}

/// Transport, dial and connection layer.
///
/// The switch owns raw connections. Once the node installs a multiplexer,
/// the switch hands every inbound connection to
/// `muxer.connection_handler(tag)`.
pub trait Switch: Subsystem {
    /// Make a transport available for listening and dialing.
    fn add_transport(&self, transport: Arc<dyn Transport>);

    /// Replace the multiplexer used for inbound connections.
    fn install_muxer(&self, muxer: ProtocolMuxer);

    /// Where to report errors raised while running.
    fn set_error_sink(&self, sink: ErrorSink);
}

/// Registers protocol handlers on the node's multiplexer.
///
/// Handed to the DHT and pubsub factories so those modules can serve their
/// own protocols. Edits made while the node is running, starting or
/// stopping take effect on the switch immediately.
pub trait ProtocolRegistrar: Send + Sync {
    fn handle(&self, protocol: &str, handler: Arc<dyn ProtocolHandler>, matcher: Option<MatchFn>);

    fn unhandle(&self, protocol: &str);
}

/// Keeps the peer count within configured bounds.
pub trait ConnectionManager: Subsystem {}

/// Distributed hash table.
pub trait Dht: Subsystem {
    /// Background helper issuing periodic random lookups. Started right
    /// after the DHT and stopped right before it.
    fn random_walk(&self) -> Arc<dyn Subsystem>;
}

/// Builds the DHT once the switch exists.
pub trait DhtFactory: Send + Sync {
    fn create(
        &self,
        switch: Arc<dyn Switch>,
        protocols: Arc<dyn ProtocolRegistrar>,
        peer_info: &PeerInfo,
        config: &DhtConfig,
    ) -> Arc<dyn Dht>;
}

/// Builds the pubsub engine once the switch exists.
///
/// The node installs a message sink on the returned engine; incoming
/// messages must go through it to reach subscribers.
pub trait PubSubFactory: Send + Sync {
    fn create(
        &self,
        switch: Arc<dyn Switch>,
        protocols: Arc<dyn ProtocolRegistrar>,
        peer_info: &PeerInfo,
    ) -> Arc<dyn PubSubEngine>;
}
