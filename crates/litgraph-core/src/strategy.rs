//! Per-field similarity strategies.
//!
//! Each scorer is a pure function returning a score in [0, 1]. Absent fields
//! are always a valid input and score 0.0; absence is never evidence of a
//! match, and no scorer panics on missing data.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::authors::author_list_similarity;
use crate::norm::{normalize_identifier, normalize_text};
use crate::{IdentifierType, SourceRecord};

/// Blend weights for title similarity: character sequence vs. token overlap.
const TITLE_SEQUENCE_WEIGHT: f64 = 0.6;
const TITLE_JACCARD_WEIGHT: f64 = 0.4;

/// Years outside this window are treated as data errors.
const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 1900..=2030;

/// Identifier kinds that are globally unique per work and therefore
/// participate in equality scoring and the deduplication veto. URLs are
/// excluded: mirrors and proxies legitimately differ for the same work.
const STRONG_IDENTIFIERS: &[IdentifierType] = &[
    IdentifierType::Doi,
    IdentifierType::Arxiv,
    IdentifierType::Pmid,
];

/// Words carrying no discriminating signal in titles.
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "and", "as", "at", "by", "for", "from", "in", "is", "its", "of", "on", "or",
        "the", "to", "with",
    ]
    .into_iter()
    .collect()
});

/// 1.0 iff any strong identifier kind present on both sides matches exactly
/// after normalization; 0.0 otherwise, including when either side carries no
/// identifier at all.
pub fn identifier_equality(source: &SourceRecord, candidate: &SourceRecord) -> f64 {
    for ty in STRONG_IDENTIFIERS {
        if let (Some(a), Some(b)) = (source.identifier(*ty), candidate.identifier(*ty))
            && normalize_identifier(*ty, a) == normalize_identifier(*ty, b)
        {
            return 1.0;
        }
    }
    0.0
}

/// True when both sides carry the same strong identifier kind with
/// *different* normalized values, a definite signal the records describe
/// different works, no matter how similar their metadata looks.
pub fn identifier_conflict(source: &SourceRecord, candidate: &SourceRecord) -> bool {
    for ty in STRONG_IDENTIFIERS {
        if let (Some(a), Some(b)) = (source.identifier(*ty), candidate.identifier(*ty))
            && normalize_identifier(*ty, a) != normalize_identifier(*ty, b)
        {
            return true;
        }
    }
    false
}

/// Whether both records carry at least one strong identifier of the same
/// kind. Only then is identifier equality a comparable signal; a DOI on
/// one side and an arXiv id on the other say nothing about each other.
pub fn shares_identifier_kind(source: &SourceRecord, candidate: &SourceRecord) -> bool {
    STRONG_IDENTIFIERS
        .iter()
        .any(|ty| source.identifier(*ty).is_some() && candidate.identifier(*ty).is_some())
}

/// Title similarity: weighted blend of character-sequence similarity and
/// stop-worded token-set Jaccard, both over normalized text, clamped to 1.0.
pub fn title_similarity(source: Option<&str>, candidate: Option<&str>) -> f64 {
    let (Some(source), Some(candidate)) = (source, candidate) else {
        return 0.0;
    };
    let norm_a = normalize_text(source);
    let norm_b = normalize_text(candidate);
    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }

    let sequence = rapidfuzz::fuzz::ratio(norm_a.chars(), norm_b.chars());
    let jaccard = token_jaccard(&norm_a, &norm_b);

    (TITLE_SEQUENCE_WEIGHT * sequence + TITLE_JACCARD_WEIGHT * jaccard).clamp(0.0, 1.0)
}

/// Jaccard similarity of the non-stop-word token sets.
fn token_jaccard(norm_a: &str, norm_b: &str) -> f64 {
    let set_a: HashSet<&str> = norm_a
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(w))
        .collect();
    let set_b: HashSet<&str> = norm_b
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(w))
        .collect();

    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let intersection = set_a.intersection(&set_b).count() as f64;
    let union = set_a.union(&set_b).count() as f64;
    intersection / union
}

/// Author-list similarity, delegated to the greedy matcher.
pub fn authors_similarity(source: &[String], candidate: &[String]) -> f64 {
    author_list_similarity(source, candidate)
}

/// Year proximity on a stepped scale; missing or implausible years score 0.
pub fn year_proximity(source: Option<i32>, candidate: Option<i32>) -> f64 {
    let (Some(a), Some(b)) = (source, candidate) else {
        return 0.0;
    };
    if !PLAUSIBLE_YEARS.contains(&a) || !PLAUSIBLE_YEARS.contains(&b) {
        return 0.0;
    }
    match (a - b).abs() {
        0 => 1.0,
        1 => 0.9,
        2 => 0.7,
        3..=5 => 0.5,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: serde_json::Value) -> SourceRecord {
        SourceRecord::from_json(&json)
    }

    #[test]
    fn identifier_equality_exact_doi() {
        let a = record(serde_json::json!({ "doi": "10.1038/x" }));
        let b = record(serde_json::json!({ "doi": "https://doi.org/10.1038/X" }));
        assert_eq!(identifier_equality(&a, &b), 1.0);
    }

    #[test]
    fn identifier_equality_absence_never_matches() {
        let a = record(serde_json::json!({ "title": "T" }));
        let b = record(serde_json::json!({ "doi": "10.1/x" }));
        assert_eq!(identifier_equality(&a, &b), 0.0);
        assert_eq!(identifier_equality(&a, &a), 0.0);
    }

    #[test]
    fn identifier_equality_mismatch_is_zero() {
        let a = record(serde_json::json!({ "doi": "10.1/x" }));
        let b = record(serde_json::json!({ "doi": "10.1/y" }));
        assert_eq!(identifier_equality(&a, &b), 0.0);
        assert!(identifier_conflict(&a, &b));
    }

    #[test]
    fn conflict_requires_both_sides() {
        let a = record(serde_json::json!({ "doi": "10.1/x" }));
        let b = record(serde_json::json!({ "title": "T" }));
        assert!(!identifier_conflict(&a, &b));
    }

    #[test]
    fn conflict_ignores_urls() {
        let a = record(serde_json::json!({ "doi": "10.1/x", "url": "https://a.example" }));
        let b = record(serde_json::json!({ "doi": "10.1/x", "url": "https://b.example" }));
        assert!(!identifier_conflict(&a, &b));
        assert_eq!(identifier_equality(&a, &b), 1.0);
    }

    #[test]
    fn title_identical() {
        assert_eq!(
            title_similarity(Some("Deep Learning"), Some("Deep  Learning!")),
            1.0
        );
    }

    #[test]
    fn title_absent_scores_zero() {
        assert_eq!(title_similarity(None, Some("Deep Learning")), 0.0);
        assert_eq!(title_similarity(Some("Deep Learning"), None), 0.0);
    }

    #[test]
    fn title_subtitle_extension_scores_high() {
        let score = title_similarity(
            Some("Efficient Estimation of Word Representations"),
            Some("Efficient Estimation of Word Representations in Vector Space"),
        );
        assert!(score > 0.7, "score = {score}");
        assert!(score < 1.0);
    }

    #[test]
    fn title_unrelated_scores_low() {
        let score = title_similarity(
            Some("Efficient Estimation of Word Representations"),
            Some("A Field Guide to Alpine Botany"),
        );
        assert!(score < 0.4, "score = {score}");
    }

    #[test]
    fn year_steps() {
        assert_eq!(year_proximity(Some(2020), Some(2020)), 1.0);
        assert_eq!(year_proximity(Some(2020), Some(2021)), 0.9);
        assert_eq!(year_proximity(Some(2020), Some(2018)), 0.7);
        assert_eq!(year_proximity(Some(2020), Some(2015)), 0.5);
        assert_eq!(year_proximity(Some(2020), Some(2010)), 0.0);
    }

    #[test]
    fn year_missing_or_implausible() {
        assert_eq!(year_proximity(None, Some(2020)), 0.0);
        assert_eq!(year_proximity(Some(2020), None), 0.0);
        assert_eq!(year_proximity(Some(1850), Some(1850)), 0.0);
        assert_eq!(year_proximity(Some(2020), Some(2077)), 0.0);
    }
}
