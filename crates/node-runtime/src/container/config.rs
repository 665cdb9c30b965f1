//! # Node Configuration
//!
//! User-facing [`NodeOptions`] are checked and defaulted by [`validate`],
//! producing the [`NodeConfig`] the node runs with.
//!
//! Tuning sections deserialize with `#[serde(default)]`, so a partial TOML
//! or JSON document only overrides the keys it names.
//!
//! ## Defaults
//!
//! | Key | Default |
//! |-----|---------|
//! | `connectionManager.minPeers` | 25 |
//! | `config.peerDiscovery.autoDial` | true |
//! | `config.pubsub.enabled` | false |
//! | `config.dht.kBucketSize` | 20 |
//! | `config.dht.enabled` | false |
//! | `config.dht.randomWalk` | disabled, 1 query per 300 000 ms, 10 000 ms timeout |
//! | `config.relay` | enabled, hop inactive and disabled |
//!
//! `switch` has no defaults and is carried through as given.

use crate::container::modules::Modules;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared_types::PeerInfo;
use thiserror::Error;

pub const DEFAULT_MIN_PEERS: usize = 25;
pub const DEFAULT_K_BUCKET_SIZE: usize = 20;
pub const DEFAULT_RANDOM_WALK_INTERVAL_MS: u64 = 300_000;
pub const DEFAULT_RANDOM_WALK_TIMEOUT_MS: u64 = 10_000;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("peer info is required")]
    MissingPeerInfo,

    #[error("modules are required")]
    MissingModules,

    #[error("at least one transport module is required")]
    EmptyTransports,

    #[error("dht is enabled but no dht module was supplied")]
    DhtWithoutImplementation,

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::EmptyTransports => "ERROR_EMPTY",
            _ => "ERR_INVALID_CONFIG",
        }
    }
}

/// Peer discovery settings. Keys other than `autoDial` (per-service
/// settings such as a bootstrap list) are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PeerDiscoveryConfig {
    pub auto_dial: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for PeerDiscoveryConfig {
    fn default() -> Self {
        Self {
            auto_dial: true,
            extra: Map::new(),
        }
    }
}

/// Random walk helper settings. Durations are milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RandomWalkConfig {
    pub enabled: bool,
    pub queries_per_period: u32,
    pub interval: u64,
    pub timeout: u64,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            queries_per_period: 1,
            interval: DEFAULT_RANDOM_WALK_INTERVAL_MS,
            timeout: DEFAULT_RANDOM_WALK_TIMEOUT_MS,
        }
    }
}

/// DHT settings. Unknown keys (selectors, validators, ...) are preserved
/// verbatim in `extra` and handed to the DHT factory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DhtConfig {
    pub k_bucket_size: usize,
    pub enabled: bool,
    pub random_walk: RandomWalkConfig,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for DhtConfig {
    fn default() -> Self {
        Self {
            k_bucket_size: DEFAULT_K_BUCKET_SIZE,
            enabled: false,
            random_walk: RandomWalkConfig::default(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PubSubConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HopConfig {
    pub active: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub enabled: bool,
    pub hop: HopConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hop: HopConfig::default(),
        }
    }
}

/// Per-module settings (`config` in the document).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModuleConfig {
    pub peer_discovery: PeerDiscoveryConfig,
    pub dht: DhtConfig,
    pub pubsub: PubSubConfig,
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionManagerConfig {
    pub min_peers: usize,
}

impl Default for ConnectionManagerConfig {
    fn default() -> Self {
        Self {
            min_peers: DEFAULT_MIN_PEERS,
        }
    }
}

/// Switch settings. Passed to the switch untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SwitchConfig {
    #[serde(rename = "blacklistTTL", skip_serializing_if = "Option::is_none")]
    pub blacklist_ttl: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub black_list_attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_parallel_dials: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cold_calls: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dial_timeout: Option<u64>,
}

/// Every serializable setting of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tuning {
    pub config: ModuleConfig,
    pub connection_manager: ConnectionManagerConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switch: Option<SwitchConfig>,
}

impl Tuning {
    /// Parse a (possibly partial) TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse a (possibly partial) JSON document.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Options as supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct NodeOptions {
    pub peer_info: Option<PeerInfo>,
    pub modules: Option<Modules>,
    pub tuning: Tuning,
}

/// A validated configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub peer_info: PeerInfo,
    pub modules: Modules,
    pub tuning: Tuning,
}

impl NodeConfig {
    /// Turn back into options, e.g. to validate again.
    pub fn into_options(self) -> NodeOptions {
        NodeOptions {
            peer_info: Some(self.peer_info),
            modules: Some(self.modules),
            tuning: self.tuning,
        }
    }
}

/// Check `options` and fill in defaults.
///
/// # Errors
///
/// - [`ConfigError::MissingPeerInfo`] / [`ConfigError::MissingModules`]
/// - [`ConfigError::EmptyTransports`] when no transport is configured
/// - [`ConfigError::DhtWithoutImplementation`] when the DHT is enabled
///   without a DHT module
pub fn validate(options: NodeOptions) -> Result<NodeConfig, ConfigError> {
    let peer_info = options.peer_info.ok_or(ConfigError::MissingPeerInfo)?;
    let modules = options.modules.ok_or(ConfigError::MissingModules)?;

    if modules.transport.is_empty() {
        return Err(ConfigError::EmptyTransports);
    }
    if options.tuning.config.dht.enabled && modules.dht.is_none() {
        return Err(ConfigError::DhtWithoutImplementation);
    }

    Ok(NodeConfig {
        peer_info,
        modules,
        tuning: options.tuning,
    })
}
