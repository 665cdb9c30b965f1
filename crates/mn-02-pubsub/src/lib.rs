//! # PubSub Façade
//!
//! A start-gated API over whichever pubsub engine the node runs.
//!
//! - Calls fail with `ERR_PUBSUB_NOT_STARTED` unless the node *or* the
//!   engine reports started.
//! - Local handlers are ref-counted per topic: one network subscription per
//!   topic, announced by the first handler and withdrawn with the last.
//! - `publish` only accepts byte buffers (`ERR_DATA_IS_NOT_A_BUFFER`).
//!
//! ## Example
//!
//! ```rust,ignore
//! let pubsub = PubSub::attach(engine, node_status);
//! let id = pubsub.subscribe_fn("news", |msg| println!("{:?}", msg.data)).await?;
//! pubsub.publish("news", Bytes::from_static(b"hello")).await?;
//! pubsub.unsubscribe("news", Some(id)).await?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod ports;
pub mod service;

/// Test doubles for the pubsub ports.
/// Requires feature: `test-utils`
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use domain::{
    EngineError, HandlerId, Payload, PubSubError, PubSubMessage, TopicHandler, TopicRegistry,
};
pub use ports::{MessageSink, NodeStatus, PubSubEngine, PubSubPeer};
pub use service::{PubSub, DEFAULT_MAX_HANDLERS};
