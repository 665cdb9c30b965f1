//! # Node Runtime Library
//!
//! The composition root of a meshnode peer: configuration validation, the
//! module ports a node is assembled from, and the lifecycle orchestrator.
//! The `main.rs` binary runs a node over in-process adapters.
//!
//! ## Layout
//!
//! - `container/` - node options, defaults and validation
//! - `ports/` - module contracts (switch, connection manager, DHT, pubsub,
//!   protocol registrar)
//! - `lifecycle/` - the [`Node`] and its state machine
//! - `adapters/` - metering observer and in-process modules
//!
//! ## Example
//!
//! ```rust,ignore
//! let options = NodeOptions {
//!     modules: Some(Modules::new().with_transport(Arc::new(MemoryTransport))),
//!     ..NodeOptions::default()
//! };
//! let node = Node::create(options, switch, connection_manager)?;
//! node.handle("/echo/1.0.0", handler_fn(echo), None);
//! node.start().await?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod container;
pub mod lifecycle;
pub mod ports;

pub use container::{validate, ConfigError, Modules, NodeConfig, NodeOptions, Tuning};
pub use lifecycle::{Node, NodeError, NodeState};
