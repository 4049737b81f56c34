//! Alias index: external identifier → canonical LID.
//!
//! The cheap, exact front door of entity resolution. Every decision here is
//! conservative because alias integrity underlies every future dedup
//! decision: a key is bound once and never silently reassigned, lookups
//! degrade to "not found" on storage trouble instead of failing ingestion,
//! and batch registration reports per-entry outcomes rather than
//! all-or-nothing errors.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::norm::normalize_identifier;
use crate::store::{AliasRecord, AliasSpec, AliasWriteOutcome, GraphStore, StoreError};
use crate::{IdentifierType, Lid, SourceRecord};

/// Extract every identifier present on a record, keyed by type in lookup
/// precedence order. Values are raw (un-normalized); absent and empty
/// fields are omitted, never mapped to an empty string.
pub fn extract_aliases(record: &SourceRecord) -> BTreeMap<IdentifierType, String> {
    record
        .identifiers()
        .into_iter()
        .map(|(ty, value)| (ty, value.to_string()))
        .collect()
}

/// Per-entry outcome of a batch registration.
#[derive(Debug, Clone)]
pub enum EntryOutcome {
    /// A new mapping was written.
    Written(AliasRecord),
    /// The identical mapping already existed.
    AlreadyMapped(AliasRecord),
    /// The key was already bound to a different LID; the original mapping
    /// was kept and is returned.
    ConflictKept(AliasRecord),
    /// The entry could not be processed at all.
    Skipped {
        ty: IdentifierType,
        reason: String,
    },
}

impl EntryOutcome {
    /// The record the key points at after the write, if any.
    pub fn record(&self) -> Option<&AliasRecord> {
        match self {
            EntryOutcome::Written(r)
            | EntryOutcome::AlreadyMapped(r)
            | EntryOutcome::ConflictKept(r) => Some(r),
            EntryOutcome::Skipped { .. } => None,
        }
    }
}

/// Aggregate outcome of registering one literature's aliases.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub lid: Lid,
    pub entries: Vec<EntryOutcome>,
}

impl BatchOutcome {
    pub fn written_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, EntryOutcome::Written(_)))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, EntryOutcome::Skipped { .. }))
            .count()
    }
}

/// Alias table totals for observability. Never fails the caller: on storage
/// trouble the counts are zero and `degraded` is set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AliasStatistics {
    pub total_mappings: u64,
    pub mappings_by_type: BTreeMap<IdentifierType, u64>,
    pub degraded: bool,
}

/// The alias index over an injected store collaborator.
pub struct AliasIndex {
    store: Arc<dyn GraphStore>,
}

impl AliasIndex {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Resolve a record to a LID via its identifiers, cheapest-first.
    ///
    /// Tries each extracted alias in precedence order until one lookup
    /// hits. Returns `None` when nothing matches; callers must treat that
    /// as "unknown work", not as an error. A storage failure on one key is
    /// logged and treated as a miss for that key.
    pub async fn resolve(&self, record: &SourceRecord) -> Option<Lid> {
        for (ty, raw) in extract_aliases(record) {
            let key = normalize_identifier(ty, &raw);
            if key.is_empty() {
                continue;
            }
            match self.store.lookup_alias(ty, &key).await {
                Ok(Some(lid)) => {
                    tracing::trace!(%ty, key = %key, %lid, "alias hit");
                    return Some(lid);
                }
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(
                        %ty,
                        key = %key,
                        %error,
                        "alias lookup failed; treating as miss"
                    );
                }
            }
        }
        None
    }

    /// Bind one identifier to a LID.
    ///
    /// Idempotent: repeating an identical mapping returns the same handle.
    /// A key already bound to a *different* LID is never reassigned: the
    /// conflict is logged and the existing (winning) mapping is returned,
    /// so the caller always gets the key's actual binding.
    pub async fn create_mapping(
        &self,
        ty: IdentifierType,
        value: &str,
        lid: &Lid,
        confidence: f64,
        metadata: serde_json::Value,
    ) -> Result<AliasRecord, StoreError> {
        let key = normalize_identifier(ty, value);
        if key.is_empty() {
            return Err(StoreError::InvalidKey {
                ty,
                reason: "empty after normalization".to_string(),
            });
        }

        let spec = AliasSpec {
            ty,
            normalized_value: key,
            lid: lid.clone(),
            confidence,
            metadata,
        };
        let outcome = self.store.write_alias(spec).await?;
        Ok(log_outcome(outcome))
    }

    /// Register every identifier of a record for one literature, in a
    /// single store batch. Per-entry failures (empty keys, conflicts) are
    /// reported in the outcome, never as a batch error.
    pub async fn register_record(
        &self,
        record: &SourceRecord,
        lid: &Lid,
        confidence: f64,
        metadata: serde_json::Value,
    ) -> BatchOutcome {
        self.batch_create_mappings(lid, &extract_aliases(record), confidence, metadata)
            .await
    }

    /// Batch variant of [`create_mapping`](Self::create_mapping).
    ///
    /// The store applies the batch as one transactional unit scoped to this
    /// literature; an entry that cannot be written does not abort the
    /// others. When the batch itself cannot start (store down), every entry
    /// is reported as skipped.
    pub async fn batch_create_mappings(
        &self,
        lid: &Lid,
        values: &BTreeMap<IdentifierType, String>,
        confidence: f64,
        metadata: serde_json::Value,
    ) -> BatchOutcome {
        let mut entries = Vec::with_capacity(values.len());
        let mut specs = Vec::with_capacity(values.len());
        let mut spec_types = Vec::with_capacity(values.len());

        for (ty, raw) in values {
            let key = normalize_identifier(*ty, raw);
            if key.is_empty() {
                tracing::warn!(ty = %ty, %lid, "skipping alias with empty normalized value");
                entries.push(EntryOutcome::Skipped {
                    ty: *ty,
                    reason: "empty after normalization".to_string(),
                });
                continue;
            }
            spec_types.push(*ty);
            specs.push(AliasSpec {
                ty: *ty,
                normalized_value: key,
                lid: lid.clone(),
                confidence,
                metadata: metadata.clone(),
            });
        }

        match self.store.write_aliases(specs).await {
            Ok(results) => {
                for (ty, result) in spec_types.into_iter().zip(results) {
                    entries.push(match result {
                        Ok(outcome) => entry_from_outcome(outcome),
                        Err(error) => {
                            tracing::warn!(%ty, %lid, %error, "alias write failed in batch");
                            EntryOutcome::Skipped {
                                ty,
                                reason: error.to_string(),
                            }
                        }
                    });
                }
            }
            Err(error) => {
                tracing::warn!(%lid, %error, "alias batch failed to start");
                for ty in spec_types {
                    entries.push(EntryOutcome::Skipped {
                        ty,
                        reason: format!("batch failed: {error}"),
                    });
                }
            }
        }

        BatchOutcome {
            lid: lid.clone(),
            entries,
        }
    }

    /// Alias table totals. Never propagates storage errors.
    pub async fn statistics(&self) -> AliasStatistics {
        match self.store.alias_counts().await {
            Ok(counts) => AliasStatistics {
                total_mappings: counts.total,
                mappings_by_type: counts.by_type,
                degraded: false,
            },
            Err(error) => {
                tracing::warn!(%error, "alias statistics unavailable; reporting zeroes");
                AliasStatistics {
                    degraded: true,
                    ..Default::default()
                }
            }
        }
    }
}

fn log_outcome(outcome: AliasWriteOutcome) -> AliasRecord {
    match outcome {
        AliasWriteOutcome::Created(record) => {
            tracing::debug!(ty = %record.ty, key = %record.normalized_value, lid = %record.lid, "alias created");
            record
        }
        AliasWriteOutcome::Existing(record) => record,
        AliasWriteOutcome::Conflict { existing, rejected } => {
            tracing::warn!(
                ty = %existing.ty,
                key = %existing.normalized_value,
                existing_lid = %existing.lid,
                rejected_lid = %rejected,
                "alias conflict: key already mapped, keeping original"
            );
            existing
        }
    }
}

fn entry_from_outcome(outcome: AliasWriteOutcome) -> EntryOutcome {
    match outcome {
        AliasWriteOutcome::Created(record) => EntryOutcome::Written(record),
        AliasWriteOutcome::Existing(record) => EntryOutcome::AlreadyMapped(record),
        AliasWriteOutcome::Conflict { existing, rejected } => {
            tracing::warn!(
                ty = %existing.ty,
                key = %existing.normalized_value,
                existing_lid = %existing.lid,
                rejected_lid = %rejected,
                "alias conflict in batch: keeping original"
            );
            EntryOutcome::ConflictKept(existing)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use serde_json::{Value, json};

    fn index() -> (Arc<MemoryStore>, AliasIndex) {
        let store = Arc::new(MemoryStore::new());
        let idx = AliasIndex::new(store.clone() as Arc<dyn GraphStore>);
        (store, idx)
    }

    #[test]
    fn extract_skips_absent_and_empty() {
        let record = SourceRecord::from_json(&json!({
            "doi": "10.1/x",
            "title": "",
            "pmid": "42",
        }));
        let aliases = extract_aliases(&record);
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases[&IdentifierType::Doi], "10.1/x");
        assert_eq!(aliases[&IdentifierType::Pmid], "42");
    }

    #[tokio::test]
    async fn create_mapping_is_idempotent() {
        let (store, idx) = index();
        let lid = Lid::new("L1");
        let first = idx
            .create_mapping(IdentifierType::Doi, "10.1/X", &lid, 1.0, Value::Null)
            .await
            .unwrap();
        let second = idx
            .create_mapping(IdentifierType::Doi, "https://doi.org/10.1/X", &lid, 1.0, Value::Null)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.alias_count(), 1);
    }

    #[tokio::test]
    async fn conflict_keeps_first_mapping() {
        let (store, idx) = index();
        idx.create_mapping(IdentifierType::Doi, "10.1/x", &Lid::new("A"), 1.0, Value::Null)
            .await
            .unwrap();
        let kept = idx
            .create_mapping(IdentifierType::Doi, "10.1/x", &Lid::new("B"), 1.0, Value::Null)
            .await
            .unwrap();
        assert_eq!(kept.lid, Lid::new("A"));
        assert_eq!(store.alias_count(), 1);
    }

    #[tokio::test]
    async fn empty_value_is_invalid() {
        let (_, idx) = index();
        let err = idx
            .create_mapping(IdentifierType::Doi, "  doi:  ", &Lid::new("A"), 1.0, Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
    }

    #[tokio::test]
    async fn resolve_normalization_equivalence() {
        let (_, idx) = index();
        let lid = Lid::new("L1");
        idx.create_mapping(IdentifierType::Doi, "10.1/X", &lid, 1.0, Value::Null)
            .await
            .unwrap();

        let plain = SourceRecord::from_json(&json!({ "doi": "10.1/X" }));
        let url_form = SourceRecord::from_json(&json!({ "doi": "https://doi.org/10.1/X" }));
        assert_eq!(idx.resolve(&plain).await, Some(lid.clone()));
        assert_eq!(idx.resolve(&url_form).await, Some(lid));
    }

    #[tokio::test]
    async fn resolve_prefers_stronger_identifier() {
        let (_, idx) = index();
        idx.create_mapping(IdentifierType::Doi, "10.1/x", &Lid::new("by-doi"), 1.0, Value::Null)
            .await
            .unwrap();
        idx.create_mapping(
            IdentifierType::Title,
            "shared title",
            &Lid::new("by-title"),
            1.0,
            Value::Null,
        )
        .await
        .unwrap();

        let record = SourceRecord::from_json(&json!({
            "doi": "10.1/x",
            "title": "Shared Title",
        }));
        assert_eq!(idx.resolve(&record).await, Some(Lid::new("by-doi")));
    }

    #[tokio::test]
    async fn resolve_misses_fail_closed() {
        let (store, idx) = index();
        let record = SourceRecord::from_json(&json!({ "doi": "10.1/unknown" }));
        assert_eq!(idx.resolve(&record).await, None);

        store.set_fail_storage(true);
        assert_eq!(idx.resolve(&record).await, None);
    }

    #[tokio::test]
    async fn register_record_writes_all_identifiers() {
        let (store, idx) = index();
        let record = SourceRecord::from_json(&json!({
            "doi": "10.1/x",
            "arxiv_id": "arXiv:2101.00001",
            "title": "A Paper",
        }));
        let outcome = idx
            .register_record(&record, &Lid::new("L1"), 1.0, Value::Null)
            .await;
        assert_eq!(outcome.written_count(), 3);
        assert_eq!(store.alias_count(), 3);

        // Re-registration changes nothing.
        let again = idx
            .register_record(&record, &Lid::new("L1"), 1.0, Value::Null)
            .await;
        assert_eq!(again.written_count(), 0);
        assert_eq!(again.skipped_count(), 0);
        assert_eq!(store.alias_count(), 3);
    }

    #[tokio::test]
    async fn batch_reports_conflicts_per_entry() {
        let (store, idx) = index();
        idx.create_mapping(IdentifierType::Doi, "10.1/x", &Lid::new("A"), 1.0, Value::Null)
            .await
            .unwrap();

        let mut values = BTreeMap::new();
        values.insert(IdentifierType::Doi, "10.1/x".to_string());
        values.insert(IdentifierType::Pmid, "42".to_string());
        let outcome = idx
            .batch_create_mappings(&Lid::new("B"), &values, 1.0, Value::Null)
            .await;

        assert_eq!(outcome.entries.len(), 2);
        assert!(outcome.entries.iter().any(|e| matches!(
            e,
            EntryOutcome::ConflictKept(r) if r.lid == Lid::new("A")
        )));
        assert!(
            outcome
                .entries
                .iter()
                .any(|e| matches!(e, EntryOutcome::Written(_)))
        );
        assert_eq!(store.alias_count(), 2);
    }

    #[tokio::test]
    async fn batch_failure_reports_all_skipped() {
        let (store, idx) = index();
        store.set_fail_storage(true);
        let mut values = BTreeMap::new();
        values.insert(IdentifierType::Doi, "10.1/x".to_string());
        let outcome = idx
            .batch_create_mappings(&Lid::new("A"), &values, 1.0, Value::Null)
            .await;
        assert_eq!(outcome.skipped_count(), 1);
    }

    #[tokio::test]
    async fn statistics_degrade_gracefully() {
        let (store, idx) = index();
        idx.create_mapping(IdentifierType::Doi, "10.1/x", &Lid::new("A"), 1.0, Value::Null)
            .await
            .unwrap();

        let stats = idx.statistics().await;
        assert_eq!(stats.total_mappings, 1);
        assert!(!stats.degraded);

        store.set_fail_storage(true);
        let stats = idx.statistics().await;
        assert_eq!(stats.total_mappings, 0);
        assert!(stats.degraded);
    }
}
