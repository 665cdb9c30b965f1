//! Module implementations supplied by the caller.

use crate::ports::{ContentRouting, DhtFactory, PeerDiscovery, PeerRouting, PubSubFactory, Transport};
use std::fmt;
use std::sync::Arc;

/// The implementations a node is assembled from.
///
/// Only `transport` is mandatory (at least one entry). DHT and pubsub are
/// factories because they need the switch, which the node creates.
#[derive(Clone, Default)]
pub struct Modules {
    pub transport: Vec<Arc<dyn Transport>>,
    pub peer_discovery: Vec<Arc<dyn PeerDiscovery>>,
    pub dht: Option<Arc<dyn DhtFactory>>,
    pub pubsub: Option<Arc<dyn PubSubFactory>>,
    pub peer_routing: Vec<Arc<dyn PeerRouting>>,
    pub content_routing: Vec<Arc<dyn ContentRouting>>,
}

impl Modules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport.push(transport);
        self
    }

    pub fn with_peer_discovery(mut self, discovery: Arc<dyn PeerDiscovery>) -> Self {
        self.peer_discovery.push(discovery);
        self
    }

    pub fn with_dht(mut self, factory: Arc<dyn DhtFactory>) -> Self {
        self.dht = Some(factory);
        self
    }

    pub fn with_pubsub(mut self, factory: Arc<dyn PubSubFactory>) -> Self {
        self.pubsub = Some(factory);
        self
    }

    /// Transport tags in configuration order.
    pub fn transport_tags(&self) -> Vec<String> {
        self.transport.iter().map(|t| t.tag().to_string()).collect()
    }
}

impl fmt::Debug for Modules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modules")
            .field("transport", &self.transport_tags())
            .field(
                "peer_discovery",
                &self.peer_discovery.iter().map(|d| d.tag()).collect::<Vec<_>>(),
            )
            .field("dht", &self.dht.is_some())
            .field("pubsub", &self.pubsub.is_some())
            .field(
                "peer_routing",
                &self.peer_routing.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .field(
                "content_routing",
                &self.content_routing.iter().map(|r| r.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
