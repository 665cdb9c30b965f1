//! # Ports Layer
//!
//! - **Inbound:** handlers consumers register per protocol
//! - **Outbound:** the connection abstraction and the observer hook

pub mod inbound;
pub mod outbound;

pub use inbound::{handler_fn, FnHandler, ProtocolHandler};
pub use outbound::{BoxConnection, Connection, ConnectionObserver, PassthroughObserver};
