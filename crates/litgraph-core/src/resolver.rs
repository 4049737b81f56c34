//! Citation resolver: turns raw reference lists into graph edges.
//!
//! Each reference runs the same short pipeline: parse a comparison record,
//! match it against the catalogue, then either write a CITES edge to the
//! matched work or to a deterministic placeholder. References are processed
//! independently: one bad reference never aborts the rest of the list, and
//! re-running a resolution leaves the graph unchanged because every write is
//! a merge on its natural key.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::engine::MatchEngine;
use crate::placeholder::{PlaceholderId, placeholder_id};
use crate::store::{CitationEdge, CitationTarget, GraphStore, StoreError, UnresolvedNode, now_epoch};
use crate::{Lid, MatchType, SourceRecord};

/// Source tag recorded on every edge this resolver writes.
pub const CITATION_SOURCE_TAG: &str = "citation_resolver";

/// How many engine candidates to consider per reference.
const CITATION_CANDIDATE_LIMIT: usize = 3;

/// One reference from a citing work's reference list.
///
/// The single explicit boundary type for reference input: whether the caller
/// holds an already-parsed object or a flat dictionary, it is flattened here
/// once and the pipeline only ever sees optional fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceInput {
    /// The reference as it appeared in the source document, verbatim.
    #[serde(default)]
    pub raw_text: String,
    /// Parsed bibliographic fragments, any subset may be present.
    #[serde(flatten)]
    pub record: SourceRecord,
}

impl ReferenceInput {
    pub fn new(raw_text: impl Into<String>, record: SourceRecord) -> Self {
        Self {
            raw_text: raw_text.into(),
            record,
        }
    }

    /// Flatten a loosely-typed reference dictionary.
    ///
    /// Accepts fragments at the top level or under a `parsed` sub-object;
    /// the raw citation text may appear under `raw`, `raw_text`, `text`, or
    /// `citation`.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let raw_text = ["raw", "raw_text", "text", "citation"]
            .iter()
            .find_map(|k| value.get(*k).and_then(serde_json::Value::as_str))
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        let mut record = SourceRecord::from_json(value);
        if let Some(parsed) = value.get("parsed") {
            let parsed = SourceRecord::from_json(parsed);
            record = merge_records(record, parsed);
        }

        Self { raw_text, record }
    }

    /// A reference lacking both title and DOI cannot be meaningfully
    /// compared against the catalogue.
    pub fn is_comparable(&self) -> bool {
        self.record.title.is_some() || self.record.doi.is_some()
    }

    fn fragments_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.record).unwrap_or(serde_json::Value::Null)
    }
}

/// Field-wise merge, `base` wins where both carry a value.
fn merge_records(base: SourceRecord, other: SourceRecord) -> SourceRecord {
    SourceRecord {
        title: base.title.or(other.title),
        authors: if base.authors.is_empty() {
            other.authors
        } else {
            base.authors
        },
        year: base.year.or(other.year),
        journal: base.journal.or(other.journal),
        doi: base.doi.or(other.doi),
        arxiv_id: base.arxiv_id.or(other.arxiv_id),
        pmid: base.pmid.or(other.pmid),
        url: base.url.or(other.url),
        pdf_url: base.pdf_url.or(other.pdf_url),
    }
}

/// What became of one reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ReferenceOutcome {
    /// Matched a catalogued work; an edge to it was merged.
    Cited { lid: Lid, confidence: f64 },
    /// No match cleared the citation floor; an edge to a deterministic
    /// placeholder was merged.
    Placeholder { id: PlaceholderId },
    /// The reference could not be processed (no hashable fragments, or a
    /// storage failure). Logged and skipped, never fatal.
    Skipped { reason: String },
}

/// Aggregate result of resolving one citing work's reference list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CitationReport {
    pub citing: Option<Lid>,
    pub resolved_count: usize,
    pub unresolved_count: usize,
    pub skipped_count: usize,
    /// Fraction of edge-producing references that resolved to a catalogued
    /// work.
    pub resolution_rate: f64,
    pub outcomes: Vec<ReferenceOutcome>,
}

/// Resolves reference lists into citation edges and placeholders.
pub struct CitationResolver {
    engine: MatchEngine,
    store: Arc<dyn GraphStore>,
}

impl CitationResolver {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            engine: MatchEngine::new(Arc::clone(&store)),
            store,
        }
    }

    /// Resolve a full reference list for one citing work.
    ///
    /// Safe to re-run: identical input produces identical final edge and
    /// placeholder counts.
    pub async fn resolve_citations(
        &self,
        citing: &Lid,
        references: &[ReferenceInput],
    ) -> CitationReport {
        let mut report = CitationReport {
            citing: Some(citing.clone()),
            ..Default::default()
        };

        for (index, reference) in references.iter().enumerate() {
            let outcome = match self.resolve_one(citing, reference).await {
                Ok(outcome) => outcome,
                Err(error) => {
                    tracing::warn!(
                        citing = %citing,
                        index,
                        %error,
                        "reference resolution failed; skipping"
                    );
                    ReferenceOutcome::Skipped {
                        reason: format!("storage error: {error}"),
                    }
                }
            };
            match &outcome {
                ReferenceOutcome::Cited { .. } => report.resolved_count += 1,
                ReferenceOutcome::Placeholder { .. } => report.unresolved_count += 1,
                ReferenceOutcome::Skipped { .. } => report.skipped_count += 1,
            }
            report.outcomes.push(outcome);
        }

        let edged = report.resolved_count + report.unresolved_count;
        report.resolution_rate = if edged == 0 {
            0.0
        } else {
            report.resolved_count as f64 / edged as f64
        };

        tracing::debug!(
            citing = %citing,
            resolved = report.resolved_count,
            unresolved = report.unresolved_count,
            skipped = report.skipped_count,
            "citation resolution complete"
        );
        report
    }

    /// Resolve a single reference: match, then cite or placehold.
    pub async fn resolve_one(
        &self,
        citing: &Lid,
        reference: &ReferenceInput,
    ) -> Result<ReferenceOutcome, StoreError> {
        if reference.is_comparable() {
            let matches = self
                .engine
                .find_matches(
                    &reference.record,
                    MatchType::Citation,
                    CITATION_CANDIDATE_LIMIT,
                )
                .await;
            if let Some(top) = matches.first() {
                self.upsert_edge(
                    citing,
                    CitationTarget::Literature(top.lid.clone()),
                    top.confidence,
                    reference,
                )
                .await?;
                return Ok(ReferenceOutcome::Cited {
                    lid: top.lid.clone(),
                    confidence: top.confidence,
                });
            }
        }

        self.placehold(citing, reference).await
    }

    async fn placehold(
        &self,
        citing: &Lid,
        reference: &ReferenceInput,
    ) -> Result<ReferenceOutcome, StoreError> {
        let Some(id) = placeholder_id(reference) else {
            tracing::debug!(citing = %citing, "reference has no hashable fragments; skipping");
            return Ok(ReferenceOutcome::Skipped {
                reason: "no comparable fields and no raw text".to_string(),
            });
        };

        let node = UnresolvedNode {
            id: id.clone(),
            raw_text: reference.raw_text.clone(),
            fragments: reference.fragments_json(),
            created_at: now_epoch(),
        };
        self.store.upsert_unresolved(&node).await?;
        self.upsert_edge(citing, CitationTarget::Unresolved(id.clone()), 0.0, reference)
            .await?;

        Ok(ReferenceOutcome::Placeholder { id })
    }

    async fn upsert_edge(
        &self,
        citing: &Lid,
        to: CitationTarget,
        confidence: f64,
        reference: &ReferenceInput,
    ) -> Result<(), StoreError> {
        let edge = CitationEdge {
            from: citing.clone(),
            to,
            confidence,
            raw_text: reference.raw_text.clone(),
            source: CITATION_SOURCE_TAG.to_string(),
            created_at: now_epoch(),
        };
        self.store.upsert_citation_edge(&edge).await
    }
}
