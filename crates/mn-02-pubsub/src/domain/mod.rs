//! # Domain Layer
//!
//! Messages, payloads, the handler registry and errors.

pub mod errors;
pub mod message;
pub mod registry;

pub use errors::{EngineError, PubSubError};
pub use message::{HandlerId, Payload, PubSubMessage, TopicHandler};
pub use registry::TopicRegistry;
