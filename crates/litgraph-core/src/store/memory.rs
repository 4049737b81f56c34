//! In-memory [`GraphStore`] on lock-free concurrent maps.
//!
//! The default store for tests and for embedding the engine without an
//! external database. All upserts merge on their natural key, matching the
//! semantics a persistent backend must provide. A failure switch lets tests
//! exercise the engine's degraded paths.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{
    AliasCounts, AliasRecord, AliasSpec, AliasWriteOutcome, AliasWriteResult, Candidate,
    CitationEdge, GraphStore, StoreError, StoreFuture, UnresolvedNode, now_epoch,
};
use crate::{IdentifierType, Lid, MatchType, SourceRecord};

#[derive(Default)]
pub struct MemoryStore {
    aliases: DashMap<(IdentifierType, String), AliasRecord>,
    /// Candidate pool: the catalogued records fuzzy matching runs against.
    literature: DashMap<Lid, SourceRecord>,
    /// Keyed by (citing LID, cited key).
    edges: DashMap<(String, String), CitationEdge>,
    unresolved: DashMap<String, UnresolvedNode>,
    fail_storage: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a catalogued literature record in the candidate pool.
    pub fn insert_literature(&self, lid: Lid, record: SourceRecord) {
        self.literature.insert(lid, record);
    }

    /// When set, every store operation fails with
    /// [`StoreError::Unavailable`]. Test hook for degraded-mode behavior.
    pub fn set_fail_storage(&self, fail: bool) {
        self.fail_storage.store(fail, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.fail_storage.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("simulated outage".into()))
        } else {
            Ok(())
        }
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn unresolved_count(&self) -> usize {
        self.unresolved.len()
    }

    /// Edges leaving one citing work, for assertions in tests.
    pub fn edges_from(&self, citing: &Lid) -> Vec<CitationEdge> {
        self.edges
            .iter()
            .filter(|e| e.key().0 == citing.as_str())
            .map(|e| e.value().clone())
            .collect()
    }

    fn merge_alias(&self, spec: AliasSpec) -> AliasWriteOutcome {
        let key = (spec.ty, spec.normalized_value.clone());
        match self.aliases.entry(key) {
            Entry::Occupied(entry) => {
                let existing = entry.get().clone();
                if existing.lid == spec.lid {
                    AliasWriteOutcome::Existing(existing)
                } else {
                    AliasWriteOutcome::Conflict {
                        existing,
                        rejected: spec.lid,
                    }
                }
            }
            Entry::Vacant(entry) => {
                let record = AliasRecord {
                    id: AliasRecord::handle(spec.ty, &spec.normalized_value),
                    ty: spec.ty,
                    normalized_value: spec.normalized_value,
                    lid: spec.lid,
                    confidence: spec.confidence,
                    metadata: spec.metadata,
                    created_at: now_epoch(),
                };
                entry.insert(record.clone());
                AliasWriteOutcome::Created(record)
            }
        }
    }
}

impl GraphStore for MemoryStore {
    fn lookup_alias<'a>(
        &'a self,
        ty: IdentifierType,
        normalized_value: &'a str,
    ) -> StoreFuture<'a, Option<Lid>> {
        Box::pin(async move {
            self.check_available()?;
            Ok(self
                .aliases
                .get(&(ty, normalized_value.to_string()))
                .map(|r| r.lid.clone()))
        })
    }

    fn write_alias(&self, spec: AliasSpec) -> StoreFuture<'_, AliasWriteOutcome> {
        Box::pin(async move {
            self.check_available()?;
            Ok(self.merge_alias(spec))
        })
    }

    fn write_aliases(&self, specs: Vec<AliasSpec>) -> StoreFuture<'_, Vec<AliasWriteResult>> {
        Box::pin(async move {
            self.check_available()?;
            Ok(specs
                .into_iter()
                .map(|spec| Ok(self.merge_alias(spec)))
                .collect())
        })
    }

    fn find_candidates<'a>(
        &'a self,
        _record: &'a SourceRecord,
        _match_type: MatchType,
    ) -> StoreFuture<'a, Vec<Candidate>> {
        Box::pin(async move {
            self.check_available()?;
            // Small in-memory pools are scored in full; prefiltering is a
            // persistent-backend concern.
            Ok(self
                .literature
                .iter()
                .map(|entry| Candidate {
                    lid: entry.key().clone(),
                    record: entry.value().clone(),
                })
                .collect())
        })
    }

    fn upsert_citation_edge<'a>(&'a self, edge: &'a CitationEdge) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.check_available()?;
            let key = (edge.from.as_str().to_string(), edge.to.key().to_string());
            // First write wins; a re-run must not change the stored edge.
            self.edges.entry(key).or_insert_with(|| edge.clone());
            Ok(())
        })
    }

    fn upsert_unresolved<'a>(&'a self, node: &'a UnresolvedNode) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.check_available()?;
            self.unresolved
                .entry(node.id.as_str().to_string())
                .or_insert_with(|| node.clone());
            Ok(())
        })
    }

    fn alias_counts(&self) -> StoreFuture<'_, AliasCounts> {
        Box::pin(async move {
            self.check_available()?;
            let mut counts = AliasCounts {
                total: self.aliases.len() as u64,
                ..Default::default()
            };
            for entry in self.aliases.iter() {
                *counts.by_type.entry(entry.ty).or_insert(0) += 1;
            }
            Ok(counts)
        })
    }
}
