//! Protocol multiplexer: negotiation plus handler dispatch per connection.

use crate::domain::ProtocolTable;
use crate::ports::{BoxConnection, ConnectionObserver};
use crate::service::listener::negotiate_inbound;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Dispatches inbound connections to protocol handlers.
///
/// Holds an immutable protocol table shared by every connection it serves;
/// registering a new protocol means building a new multiplexer.
#[derive(Clone)]
pub struct ProtocolMuxer {
    table: Arc<ProtocolTable>,
    observer: Arc<dyn ConnectionObserver>,
}

impl ProtocolMuxer {
    /// Build a multiplexer over `table`, reporting to `observer`.
    pub fn build(table: Arc<ProtocolTable>, observer: Arc<dyn ConnectionObserver>) -> Self {
        Self { table, observer }
    }

    /// The protocol table in use.
    #[must_use]
    pub fn table(&self) -> &Arc<ProtocolTable> {
        &self.table
    }

    /// Handler for connections arriving on `transport`.
    #[must_use]
    pub fn connection_handler(&self, transport: impl Into<String>) -> TransportHandler {
        TransportHandler {
            transport: transport.into(),
            table: Arc::clone(&self.table),
            observer: Arc::clone(&self.observer),
        }
    }
}

/// Per-transport entry point returned by [`ProtocolMuxer::connection_handler`].
#[derive(Clone)]
pub struct TransportHandler {
    transport: String,
    table: Arc<ProtocolTable>,
    observer: Arc<dyn ConnectionObserver>,
}

impl TransportHandler {
    /// Transport tag this handler reports to the observer.
    #[must_use]
    pub fn transport(&self) -> &str {
        &self.transport
    }

    /// Negotiate on `raw` and hand it to the matching protocol handler.
    ///
    /// Never fails: negotiation errors go to the observer and the
    /// connection is dropped.
    pub async fn handle(&self, raw: BoxConnection) {
        let mut conn = self.observer.observe(Some(self.transport.as_str()), None, raw);

        let entry = match negotiate_inbound(&mut conn, &self.table).await {
            Ok(entry) => entry,
            Err(e) => {
                debug!(transport = %self.transport, reason = e.reason(), error = %e, "Dropping connection");
                self.observer.negotiation_failed(&self.transport, &e);
                return;
            }
        };

        debug!(transport = %self.transport, protocol = %entry.protocol, "Protocol negotiated");
        let conn = self.observer.observe(None, Some(entry.protocol.as_str()), conn);
        entry.handler.handle(entry.protocol, conn).await;
    }

    /// Run [`handle`](Self::handle) on its own task.
    pub fn spawn(&self, raw: BoxConnection) -> JoinHandle<()> {
        let handler = self.clone();
        tokio::spawn(async move { handler.handle(raw).await })
    }
}
