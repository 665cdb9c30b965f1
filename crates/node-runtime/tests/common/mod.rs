//! Mock modules shared by the node-runtime integration tests.
//!
//! Every mock appends `<module>:start` / `<module>:stop` to one shared log,
//! so tests can assert the exact cross-module order.

#![allow(dead_code)]

use async_trait::async_trait;
use mn_01_protocol_muxer::{handler_fn, BoxConnection, ProtocolMuxer};
use mn_02_pubsub::testing::{LifecycleLog, MockPubSubEngine};
use mn_02_pubsub::PubSubEngine;
use node_runtime::container::{DhtConfig, Modules, NodeOptions, Tuning};
use node_runtime::ports::{
    ConnectionManager, Dht, DhtFactory, ErrorSink, ProtocolRegistrar, PubSubFactory, Switch,
    Transport,
};
use node_runtime::Node;
use parking_lot::Mutex;
use shared_types::{PeerInfo, Subsystem, SubsystemError, SubsystemId};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Protocol the mock DHT serves while running.
pub const KAD_PROTOCOL: &str = "/mock/kad/1.0.0";

pub struct TcpTransport;

impl Transport for TcpTransport {
    fn tag(&self) -> &str {
        "tcp"
    }
}

/// Lifecycle behaviour shared by every mock module.
pub struct MockModule {
    id: SubsystemId,
    log: LifecycleLog,
    fail_start: AtomicBool,
    fail_stop: AtomicBool,
    gate: Mutex<Option<Arc<Notify>>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl MockModule {
    pub fn new(id: SubsystemId, log: LifecycleLog) -> Self {
        Self {
            id,
            log,
            fail_start: AtomicBool::new(false),
            fail_stop: AtomicBool::new(false),
            gate: Mutex::new(None),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }

    pub fn fail_on_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn fail_on_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    /// Make `start` wait until the returned gate is notified.
    pub fn hold_start(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Subsystem for MockModule {
    fn id(&self) -> SubsystemId {
        self.id
    }

    async fn start(&self) -> Result<(), SubsystemError> {
        self.log.lock().push(format!("{}:start", self.id.name()));
        self.starts.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.fail_start.load(Ordering::SeqCst) {
            return Err(SubsystemError::start_failed(self.id, "mock start failure"));
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), SubsystemError> {
        self.log.lock().push(format!("{}:stop", self.id.name()));
        self.stops.fetch_add(1, Ordering::SeqCst);

        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(SubsystemError::stop_failed(self.id, "mock stop failure"));
        }
        Ok(())
    }
}

pub struct MockSwitch {
    pub module: MockModule,
    transports: Mutex<Vec<String>>,
    muxer: Mutex<Option<ProtocolMuxer>>,
    installs: AtomicUsize,
    sink: Mutex<Option<ErrorSink>>,
}

impl MockSwitch {
    pub fn new(log: LifecycleLog) -> Self {
        Self {
            module: MockModule::new(SubsystemId::Switch, log),
            transports: Mutex::new(Vec::new()),
            muxer: Mutex::new(None),
            installs: AtomicUsize::new(0),
            sink: Mutex::new(None),
        }
    }

    pub fn transports(&self) -> Vec<String> {
        self.transports.lock().clone()
    }

    /// Protocols served by the most recently installed multiplexer.
    pub fn installed_protocols(&self) -> Option<Vec<String>> {
        self.muxer.lock().as_ref().map(|m| m.table().protocols())
    }

    pub fn muxer(&self) -> Option<ProtocolMuxer> {
        self.muxer.lock().clone()
    }

    pub fn installs(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    /// Raise a runtime error through the node's sink.
    pub fn raise(&self, error: SubsystemError) {
        let sink = self.sink.lock().clone();
        if let Some(sink) = sink {
            sink(error);
        }
    }
}

#[async_trait]
impl Subsystem for MockSwitch {
    fn id(&self) -> SubsystemId {
        SubsystemId::Switch
    }

    async fn start(&self) -> Result<(), SubsystemError> {
        self.module.start().await
    }

    async fn stop(&self) -> Result<(), SubsystemError> {
        self.module.stop().await
    }
}

impl Switch for MockSwitch {
    fn add_transport(&self, transport: Arc<dyn Transport>) {
        self.transports.lock().push(transport.tag().to_string());
    }

    fn install_muxer(&self, muxer: ProtocolMuxer) {
        self.installs.fetch_add(1, Ordering::SeqCst);
        *self.muxer.lock() = Some(muxer);
    }

    fn set_error_sink(&self, sink: ErrorSink) {
        *self.sink.lock() = Some(sink);
    }
}

pub struct MockConnectionManager {
    pub module: MockModule,
}

#[async_trait]
impl Subsystem for MockConnectionManager {
    fn id(&self) -> SubsystemId {
        SubsystemId::ConnectionManager
    }

    async fn start(&self) -> Result<(), SubsystemError> {
        self.module.start().await
    }

    async fn stop(&self) -> Result<(), SubsystemError> {
        self.module.stop().await
    }
}

impl ConnectionManager for MockConnectionManager {}

/// Registers [`KAD_PROTOCOL`] when started and removes it when stopped.
pub struct MockDht {
    pub module: MockModule,
    pub random_walk: Arc<MockModule>,
    pub config: DhtConfig,
    protocols: Arc<dyn ProtocolRegistrar>,
}

#[async_trait]
impl Subsystem for MockDht {
    fn id(&self) -> SubsystemId {
        SubsystemId::Dht
    }

    async fn start(&self) -> Result<(), SubsystemError> {
        self.module.start().await?;
        self.protocols.handle(
            KAD_PROTOCOL,
            handler_fn(|_protocol: String, _conn: BoxConnection| async {}),
            None,
        );
        Ok(())
    }

    async fn stop(&self) -> Result<(), SubsystemError> {
        self.protocols.unhandle(KAD_PROTOCOL);
        self.module.stop().await
    }
}

impl Dht for MockDht {
    fn random_walk(&self) -> Arc<dyn Subsystem> {
        self.random_walk.clone()
    }
}

pub struct MockDhtFactory {
    log: LifecycleLog,
    created: Mutex<Option<Arc<MockDht>>>,
}

impl MockDhtFactory {
    /// The DHT built by the node, if any.
    pub fn dht(&self) -> Option<Arc<MockDht>> {
        self.created.lock().clone()
    }
}

impl DhtFactory for MockDhtFactory {
    fn create(
        &self,
        _: Arc<dyn Switch>,
        protocols: Arc<dyn ProtocolRegistrar>,
        _: &PeerInfo,
        config: &DhtConfig,
    ) -> Arc<dyn Dht> {
        let dht = Arc::new(MockDht {
            module: MockModule::new(SubsystemId::Dht, self.log.clone()),
            random_walk: Arc::new(MockModule::new(SubsystemId::RandomWalk, self.log.clone())),
            config: config.clone(),
            protocols,
        });
        *self.created.lock() = Some(Arc::clone(&dht));
        dht
    }
}

pub struct MockPubSubFactory {
    log: LifecycleLog,
    created: Mutex<Option<Arc<MockPubSubEngine>>>,
    protocols: Mutex<Option<Arc<dyn ProtocolRegistrar>>>,
}

impl MockPubSubFactory {
    /// The engine built by the node, if any.
    pub fn engine(&self) -> Option<Arc<MockPubSubEngine>> {
        self.created.lock().clone()
    }

    /// The registrar the node handed over with the engine.
    pub fn protocols(&self) -> Option<Arc<dyn ProtocolRegistrar>> {
        self.protocols.lock().clone()
    }
}

impl PubSubFactory for MockPubSubFactory {
    fn create(
        &self,
        _: Arc<dyn Switch>,
        protocols: Arc<dyn ProtocolRegistrar>,
        _: &PeerInfo,
    ) -> Arc<dyn PubSubEngine> {
        let engine = Arc::new(MockPubSubEngine::with_lifecycle_log(self.log.clone()));
        *self.created.lock() = Some(Arc::clone(&engine));
        *self.protocols.lock() = Some(protocols);
        engine
    }
}

/// One set of mocks sharing a lifecycle log.
pub struct Harness {
    pub log: LifecycleLog,
    pub switch: Arc<MockSwitch>,
    pub connection_manager: Arc<MockConnectionManager>,
    pub dht_factory: Arc<MockDhtFactory>,
    pub pubsub_factory: Arc<MockPubSubFactory>,
}

impl Harness {
    pub fn new() -> Self {
        let log: LifecycleLog = Arc::new(Mutex::new(Vec::new()));
        Self {
            switch: Arc::new(MockSwitch::new(log.clone())),
            connection_manager: Arc::new(MockConnectionManager {
                module: MockModule::new(SubsystemId::ConnectionManager, log.clone()),
            }),
            dht_factory: Arc::new(MockDhtFactory {
                log: log.clone(),
                created: Mutex::new(None),
            }),
            pubsub_factory: Arc::new(MockPubSubFactory {
                log: log.clone(),
                created: Mutex::new(None),
                protocols: Mutex::new(None),
            }),
            log,
        }
    }

    /// Options with both factories supplied and the given modules enabled.
    pub fn options(&self, dht: bool, pubsub: bool) -> NodeOptions {
        let mut tuning = Tuning::default();
        tuning.config.dht.enabled = dht;
        tuning.config.pubsub.enabled = pubsub;

        let dht_factory: Arc<dyn DhtFactory> = self.dht_factory.clone();
        let pubsub_factory: Arc<dyn PubSubFactory> = self.pubsub_factory.clone();
        NodeOptions {
            peer_info: Some(PeerInfo::random()),
            modules: Some(
                Modules::new()
                    .with_transport(Arc::new(TcpTransport))
                    .with_dht(dht_factory)
                    .with_pubsub(pubsub_factory),
            ),
            tuning,
        }
    }

    pub fn node(&self, dht: bool, pubsub: bool) -> Node {
        self.node_with(self.options(dht, pubsub))
    }

    pub fn node_with(&self, options: NodeOptions) -> Node {
        let switch: Arc<dyn Switch> = self.switch.clone();
        let connection_manager: Arc<dyn ConnectionManager> = self.connection_manager.clone();
        match Node::create(options, switch, connection_manager) {
            Ok(node) => node,
            Err(e) => panic!("node creation failed: {e}"),
        }
    }

    /// Snapshot of the lifecycle log.
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
    }
}
