//! # Service Layer
//!
//! Negotiation on both sides of a stream and the multiplexer that ties the
//! listener side to the protocol table.

pub mod dialer;
pub mod listener;
pub mod muxer;

pub use listener::negotiate_inbound;
pub use muxer::{ProtocolMuxer, TransportHandler};
