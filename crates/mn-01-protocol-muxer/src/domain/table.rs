//! Protocol handler table.

use crate::domain::matchers::{self, MatchFn};
use crate::ports::ProtocolHandler;
use std::fmt;
use std::sync::Arc;

/// One registered protocol.
#[derive(Clone)]
pub struct ProtocolEntry {
    /// Registered protocol identifier, e.g. `/meshsub/1.0.0`.
    pub protocol: String,
    /// Receives negotiated connections.
    pub handler: Arc<dyn ProtocolHandler>,
    /// Decides whether a requested id selects this entry.
    pub matcher: MatchFn,
}

impl ProtocolEntry {
    /// Whether a peer asking for `requested` should get this handler.
    #[must_use]
    pub fn matches(&self, requested: &str) -> bool {
        (self.matcher)(&self.protocol, requested)
    }
}

impl fmt::Debug for ProtocolEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolEntry")
            .field("protocol", &self.protocol)
            .finish_non_exhaustive()
    }
}

/// Ordered set of protocol entries with unique keys.
///
/// Lookups walk entries in registration order and stop at the first match.
/// The multiplexer only ever reads a table; edits happen on a copy that is
/// then swapped in.
#[derive(Clone, Debug, Default)]
pub struct ProtocolTable {
    entries: Vec<ProtocolEntry>,
}

impl ProtocolTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `protocol`.
    ///
    /// An empty protocol id is ignored and `false` is returned. Registering
    /// an existing id replaces its handler and matcher but keeps its
    /// position. `matcher` defaults to exact equality.
    pub fn insert(
        &mut self,
        protocol: impl Into<String>,
        handler: Arc<dyn ProtocolHandler>,
        matcher: Option<MatchFn>,
    ) -> bool {
        let protocol = protocol.into();
        if protocol.is_empty() {
            return false;
        }
        let matcher = matcher.unwrap_or_else(matchers::exact);

        match self.entries.iter_mut().find(|e| e.protocol == protocol) {
            Some(entry) => {
                entry.handler = handler;
                entry.matcher = matcher;
            }
            None => self.entries.push(ProtocolEntry {
                protocol,
                handler,
                matcher,
            }),
        }
        true
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(
        mut self,
        protocol: impl Into<String>,
        handler: Arc<dyn ProtocolHandler>,
        matcher: Option<MatchFn>,
    ) -> Self {
        self.insert(protocol, handler, matcher);
        self
    }

    /// Remove the entry registered under `protocol`.
    pub fn remove(&mut self, protocol: &str) -> Option<ProtocolEntry> {
        let index = self.entries.iter().position(|e| e.protocol == protocol)?;
        Some(self.entries.remove(index))
    }

    /// First entry, in registration order, whose matcher accepts `requested`.
    #[must_use]
    pub fn find(&self, requested: &str) -> Option<&ProtocolEntry> {
        self.entries.iter().find(|e| e.matches(requested))
    }

    /// Registered ids in registration order.
    #[must_use]
    pub fn protocols(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.protocol.clone()).collect()
    }

    /// Whether `protocol` is registered.
    #[must_use]
    pub fn contains(&self, protocol: &str) -> bool {
        self.entries.iter().any(|e| e.protocol == protocol)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
