//! # Domain Layer
//!
//! Protocol table, match policies and negotiation errors. No I/O.

pub mod errors;
pub mod matchers;
pub mod table;

pub use errors::NegotiationError;
pub use matchers::MatchFn;
pub use table::{ProtocolEntry, ProtocolTable};
