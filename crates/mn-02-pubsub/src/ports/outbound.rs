//! Driven ports: the pubsub engine and the owning node's status.

use crate::domain::{EngineError, PubSubMessage};
use async_trait::async_trait;
use bytes::Bytes;
use shared_types::{PeerInfo, Subsystem};
use std::collections::HashSet;
use std::sync::Arc;

/// Receives every message the engine accepts from the network.
pub type MessageSink = Arc<dyn Fn(PubSubMessage) + Send + Sync>;

/// A remote peer as seen by the pubsub engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubPeer {
    /// Peer identity and addresses.
    pub info: PeerInfo,
    /// Topics the peer has announced.
    pub topics: HashSet<String>,
}

impl PubSubPeer {
    pub fn new(info: PeerInfo, topics: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            info,
            topics: topics.into_iter().map(Into::into).collect(),
        }
    }
}

/// Message propagation engine (floodsub, gossipsub, ...).
///
/// The engine owns one network-level subscription per topic; the façade
/// decides when to create and withdraw it.
#[async_trait]
pub trait PubSubEngine: Subsystem {
    /// Whether the engine has been started.
    fn is_started(&self) -> bool;

    /// Announce interest in `topic` to the network.
    async fn subscribe(&self, topic: &str) -> Result<(), EngineError>;

    /// Withdraw interest in `topic`.
    async fn unsubscribe(&self, topic: &str) -> Result<(), EngineError>;

    /// Publish `data` to `topic`.
    async fn publish(&self, topic: &str, data: Bytes) -> Result<(), EngineError>;

    /// Topics the engine is currently subscribed to.
    fn subscriptions(&self) -> Vec<String>;

    /// Peers the engine knows about.
    fn peers(&self) -> Vec<PubSubPeer>;

    /// Where to hand incoming messages. Replaces any previous sink.
    fn set_message_sink(&self, sink: MessageSink);
}

/// Read-only view of the owning node's lifecycle.
pub trait NodeStatus: Send + Sync {
    fn is_started(&self) -> bool;
}
