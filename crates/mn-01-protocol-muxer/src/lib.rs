//! # Protocol Multiplexer
//!
//! Decides, for every inbound connection, which application protocol
//! handler receives it.
//!
//! ## Flow
//!
//! ```text
//! transport ──raw──▶ observe(transport, -) ──▶ negotiate ──▶ observe(-, protocol) ──▶ handler
//!                                                 │
//!                                                 └── failure ──▶ observer.negotiation_failed
//! ```
//!
//! Both sides exchange the `/multistream/1.0.0` header, then the dialer
//! proposes protocol ids until the listener echoes one back. A declined
//! proposal is answered with `na` and the connection stays open.
//!
//! ## Architecture
//!
//! - **Domain:** protocol table, match policies, errors
//! - **Ports:** `ProtocolHandler`, `Connection`, `ConnectionObserver`
//! - **Service:** listener/dialer negotiation and `ProtocolMuxer`
//!
//! ## Example
//!
//! ```rust,ignore
//! let table = ProtocolTable::new()
//!     .with("/echo/1.0.0", handler_fn(echo), None)
//!     .with("/kad/1.0.0", kad_handler, Some(matchers::semver()));
//! let muxer = ProtocolMuxer::build(Arc::new(table), Arc::new(PassthroughObserver));
//!
//! let on_tcp = muxer.connection_handler("tcp");
//! on_tcp.spawn(Box::new(socket));
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod codec;
pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{matchers, MatchFn, NegotiationError, ProtocolEntry, ProtocolTable};
pub use ports::{
    handler_fn, BoxConnection, Connection, ConnectionObserver, PassthroughObserver,
    ProtocolHandler,
};
pub use service::{dialer, negotiate_inbound, ProtocolMuxer, TransportHandler};
