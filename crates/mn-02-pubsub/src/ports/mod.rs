//! # Ports Layer
//!
//! Everything the façade needs from outside: the engine it drives and the
//! node it belongs to.

pub mod outbound;

pub use outbound::{MessageSink, NodeStatus, PubSubEngine, PubSubPeer};
