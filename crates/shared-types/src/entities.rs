//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `PeerId`
//! - **Peer records**: `PeerInfo`
//! - **Node modules**: `SubsystemId`

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Multihash code for sha2-256.
const SHA2_256_CODE: u8 = 0x12;

/// Digest length of sha2-256 in bytes.
const SHA2_256_LEN: u8 = 0x20;

/// Errors produced when decoding a peer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerIdError {
    /// The string is not valid base58.
    #[error("invalid base58 peer id: {0}")]
    InvalidBase58(String),

    /// The identifier decoded to zero bytes.
    #[error("peer id must not be empty")]
    Empty,
}

/// Identity of a peer: the multihash of its public key.
///
/// Every caller-facing API exposes peer identifiers in base58, which is also
/// the serialized form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeerId(Vec<u8>);

impl PeerId {
    /// Wrap raw multihash bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, PeerIdError> {
        if bytes.is_empty() {
            return Err(PeerIdError::Empty);
        }
        Ok(Self(bytes))
    }

    /// Derive the identifier of a public key (sha2-256 multihash).
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let digest = Sha256::digest(public_key);
        let mut bytes = Vec::with_capacity(2 + digest.len());
        bytes.push(SHA2_256_CODE);
        bytes.push(SHA2_256_LEN);
        bytes.extend_from_slice(&digest);
        Self(bytes)
    }

    /// Generate a fresh identity from random key material.
    pub fn random() -> Self {
        let key: [u8; 32] = rand::random();
        Self::from_public_key(&key)
    }

    /// Decode a base58 string.
    pub fn from_base58(encoded: &str) -> Result<Self, PeerIdError> {
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| PeerIdError::InvalidBase58(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Encode as base58.
    #[must_use]
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    /// Raw multihash bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.to_base58())
    }
}

impl TryFrom<String> for PeerId {
    type Error = PeerIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_base58(&value)
    }
}

impl From<PeerId> for String {
    fn from(id: PeerId) -> Self {
        id.to_base58()
    }
}

// =============================================================================
// CLUSTER B: PEER RECORDS
// =============================================================================

/// A peer's identity plus the addresses it can be reached on.
///
/// Owned by the switch; the orchestrator and the pubsub façade only read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    /// The peer's identity.
    pub id: PeerId,
    /// Known multiaddresses, in insertion order, without duplicates.
    pub multiaddrs: Vec<String>,
    /// Address of the live connection, if any. Maintained by the switch.
    pub connected: Option<String>,
}

impl PeerInfo {
    /// Create a record with no known addresses.
    pub fn new(id: PeerId) -> Self {
        Self {
            id,
            multiaddrs: Vec::new(),
            connected: None,
        }
    }

    /// Create a record for a freshly generated identity.
    pub fn random() -> Self {
        Self::new(PeerId::random())
    }

    /// Add a multiaddress unless it is already known.
    pub fn add_multiaddr(&mut self, addr: impl Into<String>) {
        let addr = addr.into();
        if !self.multiaddrs.contains(&addr) {
            self.multiaddrs.push(addr);
        }
    }

}

// =============================================================================
// CLUSTER C: NODE MODULES
// =============================================================================

/// Identifies each module the orchestrator drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubsystemId {
    /// Transport/dial layer.
    Switch,
    /// Connection manager.
    ConnectionManager,
    /// Distributed hash table.
    Dht,
    /// DHT random-walk helper.
    RandomWalk,
    /// Pubsub engine.
    PubSub,
}

impl SubsystemId {
    /// Stable module name used in logs and metrics labels.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Switch => "switch",
            Self::ConnectionManager => "connection-manager",
            Self::Dht => "dht",
            Self::RandomWalk => "dht-random-walk",
            Self::PubSub => "pubsub",
        }
    }
}

impl fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
