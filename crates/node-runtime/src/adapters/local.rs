//! In-process modules.
//!
//! A switch whose only transport is an in-memory pipe, plus a connection
//! manager that only tracks its bound. Used by the binary and by tests that
//! need real negotiation without sockets.

use crate::ports::{ConnectionManager, ErrorSink, Switch, Transport};
use async_trait::async_trait;
use mn_01_protocol_muxer::{BoxConnection, ProtocolMuxer};
use parking_lot::RwLock;
use shared_types::{Subsystem, SubsystemError, SubsystemId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Buffer size of each in-memory pipe.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Transport tag of the in-memory pipe.
pub const MEMORY_TRANSPORT: &str = "memory";

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryTransport;

impl Transport for MemoryTransport {
    fn tag(&self) -> &str {
        MEMORY_TRANSPORT
    }
}

/// Switch serving in-memory connections.
#[derive(Default)]
pub struct LocalSwitch {
    transports: RwLock<Vec<Arc<dyn Transport>>>,
    muxer: RwLock<Option<ProtocolMuxer>>,
    error_sink: RwLock<Option<ErrorSink>>,
    started: AtomicBool,
}

impl LocalSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transport_tags(&self) -> Vec<String> {
        self.transports
            .read()
            .iter()
            .map(|t| t.tag().to_string())
            .collect()
    }

    pub fn has_muxer(&self) -> bool {
        self.muxer.read().is_some()
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// Open a connection to this switch.
    ///
    /// The listening half is negotiated by the installed multiplexer on its
    /// own task; the returned half belongs to the dialer.
    pub fn dial_local(&self) -> Result<(BoxConnection, JoinHandle<()>), SubsystemError> {
        if !self.is_started() {
            return Err(SubsystemError::runtime(
                SubsystemId::Switch,
                "switch is not started",
            ));
        }
        if !self
            .transports
            .read()
            .iter()
            .any(|t| t.tag() == MEMORY_TRANSPORT)
        {
            return Err(SubsystemError::runtime(
                SubsystemId::Switch,
                "no memory transport configured",
            ));
        }
        let handler = match self.muxer.read().as_ref() {
            Some(muxer) => muxer.connection_handler(MEMORY_TRANSPORT),
            None => {
                return Err(SubsystemError::runtime(
                    SubsystemId::Switch,
                    "no protocol multiplexer installed",
                ))
            }
        };

        let (dialer, listener) = tokio::io::duplex(PIPE_CAPACITY);
        let task = handler.spawn(Box::new(listener));
        debug!(transport = MEMORY_TRANSPORT, "Accepted local connection");
        let dialer: BoxConnection = Box::new(dialer);
        Ok((dialer, task))
    }

    /// Raise an error as if it happened while running.
    pub fn report_error(&self, error: SubsystemError) {
        if let Some(sink) = self.error_sink.read().as_ref() {
            sink(error);
        }
    }
}

#[async_trait]
impl Subsystem for LocalSwitch {
    fn id(&self) -> SubsystemId {
        SubsystemId::Switch
    }

    async fn start(&self) -> Result<(), SubsystemError> {
        self.started.store(true, Ordering::SeqCst);
        info!(transports = ?self.transport_tags(), "Local switch listening");
        Ok(())
    }

    async fn stop(&self) -> Result<(), SubsystemError> {
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl Switch for LocalSwitch {
    fn add_transport(&self, transport: Arc<dyn Transport>) {
        self.transports.write().push(transport);
    }

    fn install_muxer(&self, muxer: ProtocolMuxer) {
        *self.muxer.write() = Some(muxer);
    }

    fn set_error_sink(&self, sink: ErrorSink) {
        *self.error_sink.write() = Some(sink);
    }
}

/// Connection manager with a peer floor and nothing else.
#[derive(Debug)]
pub struct LocalConnectionManager {
    min_peers: usize,
    started: AtomicBool,
}

impl LocalConnectionManager {
    pub fn new(min_peers: usize) -> Self {
        Self {
            min_peers,
            started: AtomicBool::new(false),
        }
    }

    pub fn min_peers(&self) -> usize {
        self.min_peers
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Subsystem for LocalConnectionManager {
    fn id(&self) -> SubsystemId {
        SubsystemId::ConnectionManager
    }

    async fn start(&self) -> Result<(), SubsystemError> {
        self.started.store(true, Ordering::SeqCst);
        info!(min_peers = self.min_peers, "Connection manager started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), SubsystemError> {
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl ConnectionManager for LocalConnectionManager {}
