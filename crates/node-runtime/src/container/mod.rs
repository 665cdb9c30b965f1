//! # Node Container
//!
//! What a node is built from: the caller's module implementations and the
//! validated configuration around them.

pub mod config;
pub mod modules;

pub use config::{
    validate, ConfigError, ConnectionManagerConfig, DhtConfig, HopConfig, ModuleConfig,
    NodeConfig, NodeOptions, PeerDiscoveryConfig, PubSubConfig, RandomWalkConfig, RelayConfig,
    SwitchConfig, Tuning,
};
pub use modules::Modules;
