//! Shared types and identifiers for Tessera.
//!
//! This crate defines the core types used across the Tessera workspace:
//! the document model ([`Document`], [`Value`]), request identity
//! ([`DocumentId`], [`Namespace`], [`SplitTarget`]), erasure parameters
//! ([`ErasureConfig`]) and the reserved field names of the persisted
//! erasure-coded document layout.

use std::fmt;

use serde::{Deserialize, Serialize};

mod document;

pub use document::{Document, Value};

// ---------------------------------------------------------------------------
// Persisted layout
// ---------------------------------------------------------------------------

/// Reserved field holding the array of `m` split blobs (index = array position).
pub const SPLITS_FIELD: &str = "_splits";

/// Reserved field holding the original payload byte length.
pub const LENGTH_FIELD: &str = "_len";

/// Returns `true` if `name` is one of the reserved erasure-coding fields.
pub fn is_reserved_field(name: &str) -> bool {
    name == SPLITS_FIELD || name == LENGTH_FIELD
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Identifier of a stored document within a namespace.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create an identifier from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for DocumentId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

/// A collection namespace in `database.collection` form.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Namespace(String);

impl Namespace {
    /// Create a namespace from its full `database.collection` name.
    pub fn new(ns: impl Into<String>) -> Self {
        Self(ns.into())
    }

    /// The database part (everything before the first `.`).
    pub fn database(&self) -> &str {
        self.0.split_once('.').map_or(self.0.as_str(), |(db, _)| db)
    }

    /// The collection part (everything after the first `.`), empty if absent.
    pub fn collection(&self) -> &str {
        self.0.split_once('.').map_or("", |(_, coll)| coll)
    }

    /// Return the full namespace string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Namespace {
    fn from(ns: &str) -> Self {
        Self(ns.to_string())
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({})", self.0)
    }
}

/// The document a split collection request reconstructs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitTarget {
    /// Collection the document lives in.
    pub namespace: Namespace,
    /// Identifier the peers are queried by.
    pub id: DocumentId,
}

impl SplitTarget {
    /// Create a target from a namespace and document identifier.
    pub fn new(namespace: impl Into<Namespace>, id: impl Into<DocumentId>) -> Self {
        Self {
            namespace: namespace.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for SplitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.id)
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Erasure coding parameters.
///
/// `k` source splits plus `m - k` parity splits, one split per replica member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErasureConfig {
    /// Number of source splits (any `k` splits reconstruct the payload).
    pub k: usize,
    /// Total number of splits, equal to the replica member count.
    pub m: usize,
}

impl ErasureConfig {
    /// Create a new configuration. Validation happens when a coder is built.
    pub fn new(k: usize, m: usize) -> Self {
        Self { k, m }
    }

    /// Number of parity splits (`m - k`), zero if the config is inverted.
    pub fn parity(&self) -> usize {
        self.m.saturating_sub(self.k)
    }

    /// Number of remote splits a collector needs besides the local one.
    pub fn remote_quorum(&self) -> usize {
        self.k.saturating_sub(1)
    }
}
