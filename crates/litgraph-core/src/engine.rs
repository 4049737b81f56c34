//! Weighted multi-strategy match engine.
//!
//! Combines the per-field strategy scores under a fixed per-[`MatchType`]
//! configuration and ranks candidates supplied by the store. The three
//! profiles trade precision against recall: deduplication must not merge
//! distinct works (a false merge corrupts the corpus), citation matching
//! must not miss real targets (a false negative only costs a placeholder
//! node), and the general profile sits between the two.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::{Candidate, GraphStore};
use crate::{Lid, MatchType, SourceRecord, strategy};

/// The comparable fields a match configuration can weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchField {
    Identifier,
    Title,
    Authors,
    Year,
}

impl MatchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchField::Identifier => "identifier",
            MatchField::Title => "title",
            MatchField::Authors => "authors",
            MatchField::Year => "year",
        }
    }
}

impl fmt::Display for MatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weighted strategy in a match configuration.
#[derive(Debug, Clone, Copy)]
pub struct StrategyConfig {
    pub field: MatchField,
    pub weight: f64,
    /// Scores below this contribute nothing to the numerator, but the
    /// field's weight still counts in the denominator.
    pub threshold: f64,
}

/// Fixed scoring profile for one [`MatchType`].
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub match_type: MatchType,
    pub strategies: Vec<StrategyConfig>,
    /// Candidates below this overall confidence are discarded.
    pub min_total: f64,
    /// Hard-reject candidates whose strong identifiers definitely differ.
    pub identifier_veto: bool,
}

impl MatchConfig {
    /// The fixed profile for a match scenario.
    pub fn for_type(match_type: MatchType) -> Self {
        let cfg = |field, weight, threshold| StrategyConfig {
            field,
            weight,
            threshold,
        };
        match match_type {
            MatchType::Deduplication => Self {
                match_type,
                strategies: vec![
                    cfg(MatchField::Identifier, 0.35, 1.0),
                    cfg(MatchField::Title, 0.35, 0.75),
                    cfg(MatchField::Authors, 0.20, 0.60),
                    cfg(MatchField::Year, 0.10, 0.70),
                ],
                min_total: 0.85,
                identifier_veto: true,
            },
            MatchType::Citation => Self {
                match_type,
                strategies: vec![
                    cfg(MatchField::Identifier, 0.30, 1.0),
                    cfg(MatchField::Title, 0.45, 0.50),
                    cfg(MatchField::Authors, 0.15, 0.50),
                    cfg(MatchField::Year, 0.10, 0.50),
                ],
                min_total: 0.60,
                identifier_veto: false,
            },
            MatchType::General => Self {
                match_type,
                strategies: vec![
                    cfg(MatchField::Identifier, 0.35, 1.0),
                    cfg(MatchField::Title, 0.35, 0.65),
                    cfg(MatchField::Authors, 0.20, 0.60),
                    cfg(MatchField::Year, 0.10, 0.60),
                ],
                min_total: 0.75,
                identifier_veto: false,
            },
        }
    }
}

/// Per-field detail of a scored candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldScore {
    pub field: MatchField,
    pub score: f64,
    pub weight: f64,
    pub passed: bool,
}

/// A ranked match candidate. Transient: produced fresh per call, never
/// persisted or cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub lid: Lid,
    /// Overall confidence in [0, 1].
    pub confidence: f64,
    /// Fields whose score cleared their per-field threshold.
    pub matched_fields: Vec<MatchField>,
    pub field_scores: Vec<FieldScore>,
    /// Snapshot of the candidate's record at scoring time.
    pub candidate: SourceRecord,
}

/// Match engine over an injected store collaborator.
pub struct MatchEngine {
    store: Arc<dyn GraphStore>,
}

impl MatchEngine {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self { store }
    }

    /// Score the store's candidate pool against `source` and return the
    /// ranked matches clearing the profile's floor, at most `limit` of them.
    ///
    /// A candidate-lookup failure degrades to "no matches" after logging;
    /// matching must never crash an ingestion run over a transient outage.
    pub async fn find_matches(
        &self,
        source: &SourceRecord,
        match_type: MatchType,
        limit: usize,
    ) -> Vec<MatchResult> {
        let candidates = match self.store.find_candidates(source, match_type).await {
            Ok(candidates) => candidates,
            Err(error) => {
                tracing::warn!(
                    %error,
                    ?match_type,
                    "candidate lookup failed; returning no matches"
                );
                return Vec::new();
            }
        };

        let config = MatchConfig::for_type(match_type);
        let mut results: Vec<MatchResult> = candidates
            .iter()
            .filter_map(|candidate| score_candidate(&config, source, candidate))
            .filter(|m| m.confidence >= config.min_total)
            .collect();

        results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        results.truncate(limit);
        results
    }
}

/// Score a single candidate under a configuration.
///
/// Returns `None` when the candidate is vetoed or shares no comparable
/// field with the source. A field participates only when it is comparable
/// at all: title/authors/year require the source to carry the field (a
/// candidate missing it scores 0 and is penalized through the weight), and
/// the identifier field requires an identifier *kind* present on both sides
/// (a DOI against an arXiv id is not a comparison). Participating fields
/// keep their full weight in the denominator even when the score misses its
/// threshold. A source carrying only an exactly-matching DOI therefore
/// scores 1.0, while a present-but-dissimilar title drags confidence down.
pub fn score_candidate(
    config: &MatchConfig,
    source: &SourceRecord,
    candidate: &Candidate,
) -> Option<MatchResult> {
    debug_assert!(!config.strategies.is_empty(), "match config has no strategies");

    if config.identifier_veto && strategy::identifier_conflict(source, &candidate.record) {
        tracing::debug!(lid = %candidate.lid, "candidate vetoed: identifier mismatch");
        return None;
    }

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let mut matched_fields = Vec::new();
    let mut field_scores = Vec::new();

    for sc in &config.strategies {
        if !field_applicable(source, &candidate.record, sc.field) {
            continue;
        }
        denominator += sc.weight;
        let score = score_field(sc.field, source, &candidate.record);
        let passed = score >= sc.threshold;
        if passed {
            numerator += sc.weight * score;
            matched_fields.push(sc.field);
        }
        field_scores.push(FieldScore {
            field: sc.field,
            score,
            weight: sc.weight,
            passed,
        });
    }

    if denominator <= 0.0 {
        return None;
    }

    Some(MatchResult {
        lid: candidate.lid.clone(),
        confidence: (numerator / denominator).clamp(0.0, 1.0),
        matched_fields,
        field_scores,
        candidate: candidate.record.clone(),
    })
}

fn field_applicable(source: &SourceRecord, candidate: &SourceRecord, field: MatchField) -> bool {
    match field {
        MatchField::Identifier => strategy::shares_identifier_kind(source, candidate),
        MatchField::Title => source.title.as_deref().is_some_and(|t| !t.trim().is_empty()),
        MatchField::Authors => !source.authors.is_empty(),
        MatchField::Year => source.year.is_some(),
    }
}

fn score_field(field: MatchField, source: &SourceRecord, candidate: &SourceRecord) -> f64 {
    match field {
        MatchField::Identifier => strategy::identifier_equality(source, candidate),
        MatchField::Title => {
            strategy::title_similarity(source.title.as_deref(), candidate.title.as_deref())
        }
        MatchField::Authors => strategy::authors_similarity(&source.authors, &candidate.authors),
        MatchField::Year => strategy::year_proximity(source.year, candidate.year),
    }
}
