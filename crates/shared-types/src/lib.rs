//! # Shared Types Crate
//!
//! Types shared by every Meshnode crate.
//!
//! ## Contents
//!
//! - **Identity**: [`PeerId`] (base58 on the wire and in every public API)
//! - **Peer records**: [`PeerInfo`], owned by the switch, read by everyone else
//! - **Lifecycle**: the [`Subsystem`] trait that the orchestrator drives

pub mod entities;
pub mod subsystem_trait;

pub use entities::*;
pub use subsystem_trait::{Subsystem, SubsystemError, SubsystemErrorKind};
