//! Driven ports: the connection abstraction and the observer hook.

use crate::domain::NegotiationError;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

/// Opaque bidirectional byte stream.
///
/// Implemented for every `AsyncRead + AsyncWrite + Send + Unpin` type,
/// including [`BoxConnection`] itself, so wrappers can be stacked.
pub trait Connection: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> Connection for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

/// Owned, type-erased connection. Ownership moves transport -> multiplexer
/// -> handler.
pub type BoxConnection = Box<dyn Connection>;

/// Instrumentation hook wrapped around every inbound connection.
///
/// `observe` is called exactly twice per successfully negotiated
/// connection: first with the transport tag and no protocol, then with the
/// negotiated protocol and no transport. Wrappers returned here must
/// forward bytes unchanged.
pub trait ConnectionObserver: Send + Sync {
    /// Wrap `conn` for metering.
    fn observe(
        &self,
        transport: Option<&str>,
        protocol: Option<&str>,
        conn: BoxConnection,
    ) -> BoxConnection;

    /// Called when negotiation on a connection from `transport` fails.
    fn negotiation_failed(&self, transport: &str, error: &NegotiationError) {
        debug!(transport, error = %error, "Protocol negotiation failed");
    }
}

/// Observer that hands connections back untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughObserver;

impl ConnectionObserver for PassthroughObserver {
    fn observe(
        &self,
        _transport: Option<&str>,
        _protocol: Option<&str>,
        conn: BoxConnection,
    ) -> BoxConnection {
        conn
    }
}
