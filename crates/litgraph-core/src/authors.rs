//! Author-list similarity.
//!
//! Author names arrive in wildly inconsistent shapes ("J. Smith",
//! "Smith, John", "John Smith"), so per-name comparison works on the
//! normalized word level and the list score uses greedy best-match
//! assignment rather than exact set intersection.

use std::collections::HashSet;

use crate::norm::normalize_text;

/// Minimum per-name similarity for a greedy pairing to count.
const NAME_ACCEPT_THRESHOLD: f64 = 0.7;

/// Score awarded when one name's words are a subset of the other's
/// (e.g. "Smith" vs. "John Smith").
const SUBSET_SCORE: f64 = 0.8;

/// Similarity of two author names in [0, 1].
///
/// Exact match after normalization scores 1.0; a word-subset match (either
/// direction) scores 0.8; otherwise the character sequence ratio, floored to
/// 0.0 when below the acceptance threshold.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let norm_a = normalize_text(a);
    let norm_b = normalize_text(b);

    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }
    if norm_a == norm_b {
        return 1.0;
    }

    let words_a: HashSet<&str> = norm_a.split_whitespace().collect();
    let words_b: HashSet<&str> = norm_b.split_whitespace().collect();
    if words_a.is_subset(&words_b) || words_b.is_subset(&words_a) {
        return SUBSET_SCORE;
    }

    let ratio = rapidfuzz::fuzz::ratio(norm_a.chars(), norm_b.chars());
    if ratio < NAME_ACCEPT_THRESHOLD { 0.0 } else { ratio }
}

/// Similarity of two author lists in [0, 1].
///
/// For each source author, greedily take the best-scoring not-yet-claimed
/// candidate author (greedy, not globally optimal); pairings below the
/// acceptance threshold are dropped. The sum of accepted scores is divided
/// by the longer list length, so missing or extra authors on either side
/// lower the score symmetrically.
///
/// Both lists empty scores 1.0 (nothing contradicts); exactly one empty
/// scores 0.0.
pub fn author_list_similarity(source: &[String], candidate: &[String]) -> f64 {
    let source: Vec<&str> = source
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();
    let candidate: Vec<&str> = candidate
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .collect();

    match (source.is_empty(), candidate.is_empty()) {
        (true, true) => return 1.0,
        (true, false) | (false, true) => return 0.0,
        (false, false) => {}
    }

    let mut claimed = vec![false; candidate.len()];
    let mut total = 0.0;

    for src_name in &source {
        let mut best: Option<(usize, f64)> = None;
        for (i, cand_name) in candidate.iter().enumerate() {
            if claimed[i] {
                continue;
            }
            let score = name_similarity(src_name, cand_name);
            if score >= NAME_ACCEPT_THRESHOLD
                && best.map_or(true, |(_, b)| score > b)
            {
                best = Some((i, score));
            }
        }
        if let Some((i, score)) = best {
            claimed[i] = true;
            total += score;
        }
    }

    total / source.len().max(candidate.len()) as f64
}
