//! Test doubles for the pubsub ports.
//!
//! Available with the `test-utils` feature flag.

use crate::domain::{EngineError, PubSubMessage};
use crate::ports::{MessageSink, NodeStatus, PubSubEngine, PubSubPeer};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use shared_types::{Subsystem, SubsystemError, SubsystemId};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, ordered record of lifecycle calls across several mocks.
pub type LifecycleLog = Arc<Mutex<Vec<String>>>;

/// In-memory engine that records every call.
#[derive(Default)]
pub struct MockPubSubEngine {
    started: AtomicBool,
    fail_start: AtomicBool,
    fail_unsubscribe: AtomicBool,
    calls: Mutex<Vec<String>>,
    subscriptions: Mutex<BTreeSet<String>>,
    published: Mutex<Vec<(String, Bytes)>>,
    peers: Mutex<Vec<PubSubPeer>>,
    sink: Mutex<Option<MessageSink>>,
    lifecycle_log: Option<LifecycleLog>,
}

impl MockPubSubEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `pubsub:start` / `pubsub:stop` to `log`.
    pub fn with_lifecycle_log(log: LifecycleLog) -> Self {
        Self {
            lifecycle_log: Some(log),
            ..Self::default()
        }
    }

    /// Engine that already reports started.
    pub fn started() -> Self {
        let engine = Self::default();
        engine.started.store(true, Ordering::SeqCst);
        engine
    }

    /// Make the next `start` fail.
    pub fn fail_on_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    /// Make the next `unsubscribe` fail.
    pub fn fail_next_unsubscribe(&self) {
        self.fail_unsubscribe.store(true, Ordering::SeqCst);
    }

    /// Hand `message` to the installed sink as if it came from the network.
    /// Returns `false` when no sink is installed.
    pub fn emit(&self, message: PubSubMessage) -> bool {
        let sink = self.sink.lock().clone();
        match sink {
            Some(sink) => {
                sink(message);
                true
            }
            None => false,
        }
    }

    pub fn add_peer(&self, peer: PubSubPeer) {
        self.peers.lock().push(peer);
    }

    /// Every engine call, e.g. `subscribe:news`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// How many times `op` was called for `topic`.
    pub fn count(&self, op: &str, topic: &str) -> usize {
        let needle = format!("{op}:{topic}");
        self.calls.lock().iter().filter(|c| **c == needle).count()
    }

    pub fn published(&self) -> Vec<(String, Bytes)> {
        self.published.lock().clone()
    }

    fn log(&self, entry: &str) {
        if let Some(log) = &self.lifecycle_log {
            log.lock().push(entry.to_string());
        }
    }
}

#[async_trait]
impl Subsystem for MockPubSubEngine {
    fn id(&self) -> SubsystemId {
        SubsystemId::PubSub
    }

    async fn start(&self) -> Result<(), SubsystemError> {
        self.log("pubsub:start");
        if self.fail_start.swap(false, Ordering::SeqCst) {
            return Err(SubsystemError::start_failed(self.id(), "mock start failure"));
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), SubsystemError> {
        self.log("pubsub:stop");
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl PubSubEngine for MockPubSubEngine {
    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    async fn subscribe(&self, topic: &str) -> Result<(), EngineError> {
        tokio::task::yield_now().await;
        self.calls.lock().push(format!("subscribe:{topic}"));
        self.subscriptions.lock().insert(topic.to_string());
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), EngineError> {
        tokio::task::yield_now().await;
        if self.fail_unsubscribe.swap(false, Ordering::SeqCst) {
            return Err(EngineError::new("mock unsubscribe failure"));
        }
        self.calls.lock().push(format!("unsubscribe:{topic}"));
        self.subscriptions.lock().remove(topic);
        Ok(())
    }

    async fn publish(&self, topic: &str, data: Bytes) -> Result<(), EngineError> {
        self.calls.lock().push(format!("publish:{topic}"));
        self.published.lock().push((topic.to_string(), data));
        Ok(())
    }

    fn subscriptions(&self) -> Vec<String> {
        self.subscriptions.lock().iter().cloned().collect()
    }

    fn peers(&self) -> Vec<PubSubPeer> {
        self.peers.lock().clone()
    }

    fn set_message_sink(&self, sink: MessageSink) {
        *self.sink.lock() = Some(sink);
    }
}

/// Node status that tests flip by hand.
#[derive(Debug, Default)]
pub struct ManualNodeStatus(AtomicBool);

impl ManualNodeStatus {
    pub fn new(started: bool) -> Self {
        Self(AtomicBool::new(started))
    }

    pub fn set(&self, started: bool) {
        self.0.store(started, Ordering::SeqCst);
    }
}

impl NodeStatus for ManualNodeStatus {
    fn is_started(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
