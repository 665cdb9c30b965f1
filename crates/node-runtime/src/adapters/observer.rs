//! Connection metering.
//!
//! [`MeteredObserver`] implements the multiplexer's observer port on top of
//! the Prometheus connection counters. Each observation wraps the
//! connection in a [`MeteredConnection`] that counts bytes and records the
//! close once.

use mesh_telemetry::{
    metric_inc, BYTES_READ, BYTES_WRITTEN, CONNECTIONS_CLOSED, CONNECTIONS_OPENED,
    NEGOTIATION_FAILURES, SCOPE_PROTOCOL, SCOPE_TRANSPORT,
};
use mn_01_protocol_muxer::{BoxConnection, ConnectionObserver, NegotiationError};
use prometheus::Counter;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::debug;

/// Observer that meters every connection the multiplexer serves.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeteredObserver;

impl MeteredObserver {
    pub fn new() -> Self {
        Self
    }
}

impl ConnectionObserver for MeteredObserver {
    fn observe(
        &self,
        transport: Option<&str>,
        protocol: Option<&str>,
        conn: BoxConnection,
    ) -> BoxConnection {
        let (scope, name) = match (transport, protocol) {
            (Some(transport), _) => (SCOPE_TRANSPORT, transport),
            (None, Some(protocol)) => (SCOPE_PROTOCOL, protocol),
            (None, None) => return conn,
        };
        metric_inc!(CONNECTIONS_OPENED, &[scope, name]);
        Box::new(MeteredConnection::new(conn, scope, name))
    }

    fn negotiation_failed(&self, transport: &str, error: &NegotiationError) {
        debug!(transport, reason = error.reason(), error = %error, "Negotiation failed");
        metric_inc!(NEGOTIATION_FAILURES, &[transport, error.reason()]);
    }
}

/// Byte-counting wrapper. Bytes pass through unchanged.
pub struct MeteredConnection {
    inner: BoxConnection,
    read: Counter,
    written: Counter,
    closed: Option<Counter>,
}

impl MeteredConnection {
    pub fn new(inner: BoxConnection, scope: &str, name: &str) -> Self {
        let labels = [scope, name];
        Self {
            inner,
            read: BYTES_READ.with_label_values(&labels),
            written: BYTES_WRITTEN.with_label_values(&labels),
            closed: Some(CONNECTIONS_CLOSED.with_label_values(&labels)),
        }
    }

    fn mark_closed(&mut self) {
        if let Some(closed) = self.closed.take() {
            closed.inc();
        }
    }
}

impl AsyncRead for MeteredConnection {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let had_room = buf.remaining() > 0;
        let before = buf.filled().len();

        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let n = buf.filled().len() - before;
            if n > 0 {
                this.read.inc_by(n as f64);
            } else if had_room {
                this.mark_closed();
            }
        }
        poll
    }
}

impl AsyncWrite for MeteredConnection {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = &poll {
            this.written.inc_by(*n as f64);
        }
        poll
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_shutdown(cx);
        if let Poll::Ready(Ok(())) = &poll {
            this.mark_closed();
        }
        poll
    }
}

impl Drop for MeteredConnection {
    fn drop(&mut self) {
        self.mark_closed();
    }
}
