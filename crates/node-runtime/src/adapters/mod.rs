//! # Adapter Implementations
//!
//! Concrete implementations of the module ports that ship with the runtime.
//!
//! - [`MeteredObserver`]: connection observer backed by Prometheus counters
//! - [`LocalSwitch`], [`LocalConnectionManager`], [`MemoryTransport`]:
//!   in-process modules with no sockets

pub mod local;
pub mod observer;

pub use local::{LocalConnectionManager, LocalSwitch, MemoryTransport, MEMORY_TRANSPORT};
pub use observer::{MeteredConnection, MeteredObserver};
