//! The node: owns every module and drives their lifecycle.

use crate::container::{validate, ConfigError, NodeConfig, NodeOptions};
use crate::lifecycle::protocols::NodeProtocols;
use crate::lifecycle::state::{NodeState, StateCell};
use crate::lifecycle::NodeError;
use crate::ports::{ConnectionManager, Dht, ProtocolRegistrar, Switch};
use mesh_telemetry::{metric_inc, MODULE_ERRORS};
use mn_01_protocol_muxer::{ConnectionObserver, MatchFn, ProtocolHandler};
use mn_02_pubsub::{NodeStatus, PubSub};
use parking_lot::Mutex;
use shared_bus::{EventFilter, EventPublisher, EventTopic, InMemoryEventBus, NodeEvent, Subscription};
use shared_types::{PeerInfo, Subsystem, SubsystemError, SubsystemId};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A peer-to-peer node.
///
/// Modules start in a fixed order: switch, connection manager, DHT and its
/// random walk, pubsub. They stop in the reverse of whatever actually
/// started.
pub struct Node {
    config: NodeConfig,
    state: Arc<StateCell>,
    switch: Arc<dyn Switch>,
    connection_manager: Arc<dyn ConnectionManager>,
    dht: Option<Arc<dyn Dht>>,
    random_walk: Option<Arc<dyn Subsystem>>,
    pubsub: Option<Arc<PubSub>>,
    /// Modules started so far, in start order.
    started: Mutex<Vec<SubsystemId>>,
    events: Arc<InMemoryEventBus>,
    protocols: Arc<NodeProtocols>,
}

impl Node {
    /// Assemble a node from a validated configuration.
    ///
    /// Transports are handed to the switch here. DHT and pubsub are created
    /// only when their module is supplied and enabled, and may register
    /// their own protocols through the registrar they are given. Messages
    /// the pubsub engine receives are routed to the façade.
    pub fn new(
        config: NodeConfig,
        switch: Arc<dyn Switch>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        let state = Arc::new(StateCell::new());
        let events = Arc::new(InMemoryEventBus::new());

        for transport in &config.modules.transport {
            switch.add_transport(Arc::clone(transport));
        }
        switch.set_error_sink(error_sink(Arc::clone(&events)));

        let protocols = Arc::new(NodeProtocols::new(Arc::clone(&switch), Arc::clone(&state)));
        let registrar: Arc<dyn ProtocolRegistrar> = protocols.clone();

        let dht_config = &config.tuning.config.dht;
        let dht = match &config.modules.dht {
            Some(factory) if dht_config.enabled => Some(factory.create(
                Arc::clone(&switch),
                Arc::clone(&registrar),
                &config.peer_info,
                dht_config,
            )),
            _ => None,
        };
        let random_walk = dht.as_ref().map(|dht| dht.random_walk());

        let pubsub = match &config.modules.pubsub {
            Some(factory) if config.tuning.config.pubsub.enabled => {
                let engine = factory.create(
                    Arc::clone(&switch),
                    Arc::clone(&registrar),
                    &config.peer_info,
                );
                let status: Arc<dyn NodeStatus> = state.clone();
                Some(PubSub::attach(engine, status))
            }
            _ => None,
        };

        info!(
            peer = %config.peer_info.id.to_base58(),
            transports = ?config.modules.transport_tags(),
            dht = dht.is_some(),
            pubsub = pubsub.is_some(),
            "Node assembled"
        );

        Self {
            config,
            state,
            switch,
            connection_manager,
            dht,
            random_walk,
            pubsub,
            started: Mutex::new(Vec::new()),
            events,
            protocols,
        }
    }

    /// Validate `options` and assemble a node. A random peer identity is
    /// generated when none is supplied.
    pub fn create(
        mut options: NodeOptions,
        switch: Arc<dyn Switch>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Result<Self, ConfigError> {
        if options.peer_info.is_none() {
            let peer_info = PeerInfo::random();
            debug!(peer = %peer_info.id.to_base58(), "Generated peer identity");
            options.peer_info = Some(peer_info);
        }
        let config = validate(options)?;
        Ok(Self::new(config, switch, connection_manager))
    }

    /// Replace the connection observer used by the multiplexer.
    #[must_use]
    pub fn with_observer(self, observer: Arc<dyn ConnectionObserver>) -> Self {
        self.protocols.set_observer(observer);
        self
    }

    /// Start every configured module.
    ///
    /// Starting a started node does nothing. If a module fails, the modules
    /// already started are stopped again in reverse order and the node
    /// returns to `Stopped` without emitting `Started`.
    #[instrument(name = "node_start", skip(self), fields(peer = %self.config.peer_info.id.to_base58()))]
    pub async fn start(&self) -> Result<(), NodeError> {
        match self.state.transition(NodeState::Stopped, NodeState::Starting) {
            Ok(()) => {}
            Err(NodeState::Started) => {
                debug!("Node already started");
                return Ok(());
            }
            Err(state) => {
                warn!(state = %state, "Rejected start");
                return Err(NodeError::InvalidState {
                    operation: "start",
                    state,
                });
            }
        }

        self.protocols.install();

        for id in self.start_order() {
            info!(module = id.name(), "Starting module");
            if let Err(error) = self.start_module(id).await {
                warn!(module = id.name(), error = %error, "Module failed to start");
                self.rollback().await;
                self.state.set(NodeState::Stopped);
                return Err(NodeError::StartFailed(error));
            }
            self.started.lock().push(id);
        }

        self.state.set(NodeState::Started);
        self.events.publish(NodeEvent::Started);
        info!("Node started");
        Ok(())
    }

    /// Stop every started module in reverse start order.
    ///
    /// Every module is attempted. Failures are returned together once the
    /// whole sequence has run, after `Stopped` has been emitted.
    #[instrument(name = "node_stop", skip(self), fields(peer = %self.config.peer_info.id.to_base58()))]
    pub async fn stop(&self) -> Result<(), NodeError> {
        match self.state.transition(NodeState::Started, NodeState::Stopping) {
            Ok(()) => {}
            Err(NodeState::Stopped) => {
                debug!("Node already stopped");
                return Ok(());
            }
            Err(state) => {
                warn!(state = %state, "Rejected stop");
                return Err(NodeError::InvalidState {
                    operation: "stop",
                    state,
                });
            }
        }

        let started = std::mem::take(&mut *self.started.lock());
        let mut errors = Vec::new();
        for id in started.into_iter().rev() {
            info!(module = id.name(), "Stopping module");
            if let Err(error) = self.stop_module(id).await {
                warn!(module = id.name(), error = %error, "Module failed to stop");
                errors.push(error);
            }
        }

        self.state.set(NodeState::Stopped);
        self.events.publish(NodeEvent::Stopped);
        info!(failures = errors.len(), "Node stopped");

        if errors.is_empty() {
            Ok(())
        } else {
            Err(NodeError::ModuleStop(errors))
        }
    }

    /// Register a protocol handler. Takes effect on the running node.
    pub fn handle(
        &self,
        protocol: impl Into<String>,
        handler: Arc<dyn ProtocolHandler>,
        matcher: Option<MatchFn>,
    ) {
        self.protocols.handle(&protocol.into(), handler, matcher);
    }

    /// Remove a protocol handler.
    pub fn unhandle(&self, protocol: &str) {
        self.protocols.unhandle(protocol);
    }

    /// Registered protocol ids in registration order.
    pub fn protocols(&self) -> Vec<String> {
        self.protocols.protocols()
    }

    /// Listen for node events.
    pub fn subscribe_events(&self, filter: EventFilter) -> Subscription {
        self.events.subscribe(filter)
    }

    /// The pubsub façade, when pubsub is configured and enabled.
    pub fn pubsub(&self) -> Option<&PubSub> {
        self.pubsub.as_deref()
    }

    pub fn dht(&self) -> Option<&Arc<dyn Dht>> {
        self.dht.as_ref()
    }

    pub fn switch(&self) -> &Arc<dyn Switch> {
        &self.switch
    }

    pub fn connection_manager(&self) -> &Arc<dyn ConnectionManager> {
        &self.connection_manager
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn peer_info(&self) -> &PeerInfo {
        &self.config.peer_info
    }

    pub fn state(&self) -> NodeState {
        self.state.get()
    }

    pub fn is_started(&self) -> bool {
        self.state.get() == NodeState::Started
    }

    fn start_order(&self) -> Vec<SubsystemId> {
        let mut order = vec![SubsystemId::Switch, SubsystemId::ConnectionManager];
        if self.dht.is_some() {
            order.push(SubsystemId::Dht);
            order.push(SubsystemId::RandomWalk);
        }
        if self.pubsub.is_some() {
            order.push(SubsystemId::PubSub);
        }
        order
    }

    async fn start_module(&self, id: SubsystemId) -> Result<(), SubsystemError> {
        match id {
            SubsystemId::Switch => self.switch.start().await,
            SubsystemId::ConnectionManager => self.connection_manager.start().await,
            SubsystemId::Dht => match &self.dht {
                Some(dht) => dht.start().await,
                None => Ok(()),
            },
            SubsystemId::RandomWalk => match &self.random_walk {
                Some(walk) => walk.start().await,
                None => Ok(()),
            },
            SubsystemId::PubSub => match &self.pubsub {
                Some(pubsub) => pubsub.engine().start().await,
                None => Ok(()),
            },
        }
    }

    async fn stop_module(&self, id: SubsystemId) -> Result<(), SubsystemError> {
        match id {
            SubsystemId::Switch => self.switch.stop().await,
            SubsystemId::ConnectionManager => self.connection_manager.stop().await,
            SubsystemId::Dht => match &self.dht {
                Some(dht) => dht.stop().await,
                None => Ok(()),
            },
            SubsystemId::RandomWalk => match &self.random_walk {
                Some(walk) => walk.stop().await,
                None => Ok(()),
            },
            SubsystemId::PubSub => match &self.pubsub {
                Some(pubsub) => pubsub.engine().stop().await,
                None => Ok(()),
            },
        }
    }

    /// Undo a partial start.
    async fn rollback(&self) {
        let started = std::mem::take(&mut *self.started.lock());
        for id in started.into_iter().rev() {
            if let Err(error) = self.stop_module(id).await {
                warn!(module = id.name(), error = %error, "Rollback stop failed");
            }
        }
    }
}

/// Count module errors and forward them only if someone listens.
fn error_sink(events: Arc<InMemoryEventBus>) -> crate::ports::ErrorSink {
    Arc::new(move |error: SubsystemError| {
        let kind = error.kind.to_string();
        metric_inc!(MODULE_ERRORS, &[error.subsystem_id.name(), kind.as_str()]);

        if events.has_subscribers(EventTopic::Error) {
            events.publish(NodeEvent::Error(error));
        } else {
            warn!(module = error.subsystem_id.name(), error = %error, "Unhandled module error");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{LocalConnectionManager, LocalSwitch, MemoryTransport};
    use crate::container::Modules;

    fn node() -> (Node, Arc<LocalSwitch>) {
        let switch = Arc::new(LocalSwitch::new());
        let options = NodeOptions {
            modules: Some(Modules::new().with_transport(Arc::new(MemoryTransport))),
            ..NodeOptions::default()
        };
        let node = Node::create(
            options,
            switch.clone(),
            Arc::new(LocalConnectionManager::new(25)),
        )
        .unwrap();
        (node, switch)
    }

    #[test]
    fn test_create_generates_peer_identity() {
        let (node, switch) = node();
        assert!(!node.peer_info().id.to_base58().is_empty());
        assert_eq!(node.state(), NodeState::Stopped);
        assert_eq!(switch.transport_tags(), vec!["memory"]);
    }

    #[test]
    fn test_create_rejects_missing_modules() {
        let result = Node::create(
            NodeOptions::default(),
            Arc::new(LocalSwitch::new()),
            Arc::new(LocalConnectionManager::new(25)),
        );
        assert!(matches!(result, Err(ConfigError::MissingModules)));
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let (node, _switch) = node();
        node.start().await.unwrap();
        node.start().await.unwrap();
        assert!(node.is_started());

        node.stop().await.unwrap();
        node.stop().await.unwrap();
        assert_eq!(node.state(), NodeState::Stopped);
    }

    #[tokio::test]
    async fn test_start_installs_muxer() {
        let (node, switch) = node();
        assert!(!switch.has_muxer());
        node.start().await.unwrap();
        assert!(switch.has_muxer());
    }

    #[test]
    fn test_pubsub_absent_when_not_configured() {
        let (node, _switch) = node();
        assert!(node.pubsub().is_none());
        assert!(node.dht().is_none());
    }

    #[tokio::test]
    async fn test_unhandled_module_error_is_dropped() {
        let (node, switch) = node();
        node.start().await.unwrap();
        // No listener: must not panic or block.
        switch.report_error(SubsystemError::runtime(SubsystemId::Switch, "dial storm"));

        let mut lifecycle = node.subscribe_events(EventFilter::topics(vec![EventTopic::Lifecycle]));
        switch.report_error(SubsystemError::runtime(SubsystemId::Switch, "dial storm"));
        assert!(lifecycle.try_recv().unwrap().is_none());
    }
}
