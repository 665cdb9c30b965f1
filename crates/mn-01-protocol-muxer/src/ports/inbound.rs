//! Driving ports: protocol handlers registered by consumers.

use crate::ports::outbound::BoxConnection;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;

/// Receives connections once their protocol has been agreed.
///
/// The handler owns the connection from this point on.
#[async_trait]
pub trait ProtocolHandler: Send + Sync {
    /// Serve `conn`, which speaks `protocol` (the registered id).
    async fn handle(&self, protocol: String, conn: BoxConnection);
}

/// Adapter turning an async closure into a [`ProtocolHandler`].
pub struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ProtocolHandler for FnHandler<F>
where
    F: Fn(String, BoxConnection) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, protocol: String, conn: BoxConnection) {
        (self.0)(protocol, conn).await;
    }
}

/// Build a shared handler from an async closure.
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ProtocolHandler>
where
    F: Fn(String, BoxConnection) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(FnHandler(f))
}
