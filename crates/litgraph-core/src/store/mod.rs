//! Storage collaborator interface for the resolution engine.
//!
//! The engine never talks to a database directly; it consumes this narrow
//! trait, which may be backed by a relational, document, or graph store. The
//! only semantics assumed are equality lookup and merge-on-key upsert;
//! idempotent writes are what make concurrent resolution runs over
//! overlapping reference sets race-free without application-level locking.

pub mod memory;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::placeholder::PlaceholderId;
use crate::{IdentifierType, Lid, MatchType, SourceRecord};

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage I/O error: {0}")]
    Io(String),
    #[error("invalid key for {ty}: {reason}")]
    InvalidKey { ty: IdentifierType, reason: String },
    #[error("corrupt stored record at {key}: {detail}")]
    Corrupt { key: String, detail: String },
}

/// A persisted alias fact: `(identifier type, normalized value) → LID`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasRecord {
    /// Stable handle derived from the key, identical across stores and runs.
    pub id: String,
    pub ty: IdentifierType,
    pub normalized_value: String,
    pub lid: Lid,
    pub confidence: f64,
    pub metadata: serde_json::Value,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
}

impl AliasRecord {
    /// The canonical handle for an alias key.
    pub fn handle(ty: IdentifierType, normalized_value: &str) -> String {
        format!("{}:{}", ty.as_str(), normalized_value)
    }
}

/// A requested alias write. Values must already be normalized.
#[derive(Debug, Clone)]
pub struct AliasSpec {
    pub ty: IdentifierType,
    pub normalized_value: String,
    pub lid: Lid,
    pub confidence: f64,
    pub metadata: serde_json::Value,
}

/// Outcome of an atomic alias merge.
#[derive(Debug, Clone)]
pub enum AliasWriteOutcome {
    /// The key was free and now maps to the requested LID.
    Created(AliasRecord),
    /// The key already mapped to the requested LID; nothing changed.
    Existing(AliasRecord),
    /// The key already mapped to a *different* LID. The original mapping
    /// wins; the rejected LID is reported so callers can log it.
    Conflict {
        existing: AliasRecord,
        rejected: Lid,
    },
}

impl AliasWriteOutcome {
    /// The alias record the key ends up pointing at, whichever way the
    /// write went.
    pub fn record(&self) -> &AliasRecord {
        match self {
            AliasWriteOutcome::Created(r) | AliasWriteOutcome::Existing(r) => r,
            AliasWriteOutcome::Conflict { existing, .. } => existing,
        }
    }
}

/// A candidate record supplied by the store for fuzzy scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub lid: Lid,
    pub record: SourceRecord,
}

/// Target of a citation edge: a catalogued work or a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationTarget {
    Literature(Lid),
    Unresolved(PlaceholderId),
}

impl CitationTarget {
    pub fn key(&self) -> &str {
        match self {
            CitationTarget::Literature(lid) => lid.as_str(),
            CitationTarget::Unresolved(id) => id.as_str(),
        }
    }
}

impl fmt::Display for CitationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A CITES relationship. At most one edge exists per (citing, cited) pair;
/// stores merge on that key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CitationEdge {
    pub from: Lid,
    pub to: CitationTarget,
    pub confidence: f64,
    /// The raw reference text, preserved verbatim.
    pub raw_text: String,
    pub source: String,
    pub created_at: u64,
}

/// Placeholder node for a cited work that is not yet catalogued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnresolvedNode {
    pub id: PlaceholderId,
    pub raw_text: String,
    /// The bibliographic fragments the ID was derived from.
    pub fragments: serde_json::Value,
    pub created_at: u64,
}

/// Alias table totals for statistics reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AliasCounts {
    pub total: u64,
    pub by_type: BTreeMap<IdentifierType, u64>,
}

/// Per-entry result of a batch alias write: the outer [`StoreFuture`] fails
/// only when the batch itself cannot start (e.g. no transaction).
pub type AliasWriteResult = Result<AliasWriteOutcome, StoreError>;

/// The narrow persistence interface the resolution core consumes.
///
/// All write operations are merge-on-key upserts. Implementations must be
/// safe to call concurrently from many tasks.
pub trait GraphStore: Send + Sync {
    /// Exact lookup of an alias key. `Ok(None)` means "not mapped".
    fn lookup_alias<'a>(
        &'a self,
        ty: IdentifierType,
        normalized_value: &'a str,
    ) -> StoreFuture<'a, Option<Lid>>;

    /// Atomically merge one alias fact; never reassigns an existing key.
    fn write_alias(&self, spec: AliasSpec) -> StoreFuture<'_, AliasWriteOutcome>;

    /// Merge a batch of alias facts in one transactional unit scoped to one
    /// literature. Individual entries may fail without aborting the rest.
    fn write_aliases(&self, specs: Vec<AliasSpec>) -> StoreFuture<'_, Vec<AliasWriteResult>>;

    /// Candidate pool for fuzzy matching against `record`.
    fn find_candidates<'a>(
        &'a self,
        record: &'a SourceRecord,
        match_type: MatchType,
    ) -> StoreFuture<'a, Vec<Candidate>>;

    /// Merge a CITES edge on its (citing, cited) key.
    fn upsert_citation_edge<'a>(&'a self, edge: &'a CitationEdge) -> StoreFuture<'a, ()>;

    /// Merge an unresolved placeholder node on its deterministic ID.
    fn upsert_unresolved<'a>(&'a self, node: &'a UnresolvedNode) -> StoreFuture<'a, ()>;

    /// Alias table totals.
    fn alias_counts(&self) -> StoreFuture<'_, AliasCounts>;
}

/// Wall-clock seconds since the Unix epoch.
pub fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
