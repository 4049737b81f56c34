//! Identifier and text canonicalization.
//!
//! Every alias key and every similarity comparison goes through these
//! functions, so two spellings of the same identifier (`10.1/X` vs.
//! `https://doi.org/10.1/X`) or the same title (accented vs. ASCII) land on
//! the same normalized form. All functions are total and deterministic; they
//! never fail on odd input.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::IdentifierType;

/// URL/scheme prefixes stripped from DOI values (checked case-insensitively,
/// longest first).
const DOI_PREFIXES: &[&str] = &[
    "https://dx.doi.org/",
    "http://dx.doi.org/",
    "https://doi.org/",
    "http://doi.org/",
    "dx.doi.org/",
    "doi.org/",
    "doi:",
];

/// Prefixes stripped from arXiv identifiers.
const ARXIV_PREFIXES: &[&str] = &[
    "https://arxiv.org/abs/",
    "http://arxiv.org/abs/",
    "arxiv.org/abs/",
    "arxiv:",
];

/// Prefixes stripped from PubMed identifiers.
const PMID_PREFIXES: &[&str] = &[
    "https://pubmed.ncbi.nlm.nih.gov/",
    "http://pubmed.ncbi.nlm.nih.gov/",
    "pmid:",
];

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Strip the first matching prefix, case-insensitively.
fn strip_prefixes<'a>(value: &'a str, prefixes: &[&str]) -> &'a str {
    for prefix in prefixes {
        if let Some(head) = value.get(..prefix.len())
            && head.eq_ignore_ascii_case(prefix)
        {
            return &value[prefix.len()..];
        }
    }
    value
}

/// Canonicalize one identifier value for its type.
///
/// - DOI: strip `doi:` / doi.org URL prefixes, lowercase.
/// - ArXiv: strip `arxiv:` / arxiv.org/abs URL prefixes, lowercase.
/// - PMID: strip `pmid:` / PubMed URL prefixes, trim a trailing slash.
/// - URL / PDF URL: pass through unchanged apart from trimming, since URLs are
///   case-sensitive.
/// - Title: lowercase and trim.
pub fn normalize_identifier(ty: IdentifierType, value: &str) -> String {
    let value = value.trim();
    match ty {
        IdentifierType::Doi => strip_prefixes(value, DOI_PREFIXES).trim().to_lowercase(),
        IdentifierType::Arxiv => strip_prefixes(value, ARXIV_PREFIXES).trim().to_lowercase(),
        IdentifierType::Pmid => strip_prefixes(value, PMID_PREFIXES)
            .trim()
            .trim_end_matches('/')
            .to_string(),
        IdentifierType::Url | IdentifierType::PdfUrl => value.to_string(),
        IdentifierType::Title => value.to_lowercase(),
    }
}

/// Normalize free text (titles, author names) for similarity comparison.
///
/// NFKD-decompose and drop non-ASCII (folds accents: "Rényi" → "Renyi"),
/// lowercase, replace punctuation runs with a single space, collapse
/// whitespace, trim.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text.nfkd().filter(|c| c.is_ascii()).collect();
    let lower = folded.to_lowercase();
    NON_ALNUM.replace_all(&lower, " ").trim().to_string()
}

/// Tokenize normalized text into words.
pub fn tokens(text: &str) -> Vec<String> {
    normalize_text(text)
        .split_whitespace()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doi_strips_url_prefix_and_lowercases() {
        assert_eq!(
            normalize_identifier(IdentifierType::Doi, "https://doi.org/10.1038/NATURE14539"),
            "10.1038/nature14539"
        );
        assert_eq!(
            normalize_identifier(IdentifierType::Doi, "doi:10.1/X"),
            "10.1/x"
        );
        assert_eq!(
            normalize_identifier(IdentifierType::Doi, "  10.1/x "),
            "10.1/x"
        );
    }

    #[test]
    fn doi_plain_and_url_forms_converge() {
        let plain = normalize_identifier(IdentifierType::Doi, "10.1/X");
        let url = normalize_identifier(IdentifierType::Doi, "https://doi.org/10.1/X");
        let dx = normalize_identifier(IdentifierType::Doi, "http://dx.doi.org/10.1/X");
        assert_eq!(plain, url);
        assert_eq!(plain, dx);
    }

    #[test]
    fn arxiv_strips_prefixes() {
        assert_eq!(
            normalize_identifier(IdentifierType::Arxiv, "arXiv:2101.00001v2"),
            "2101.00001v2"
        );
        assert_eq!(
            normalize_identifier(IdentifierType::Arxiv, "https://arxiv.org/abs/2101.00001"),
            "2101.00001"
        );
    }

    #[test]
    fn pmid_strips_url_and_trailing_slash() {
        assert_eq!(
            normalize_identifier(IdentifierType::Pmid, "https://pubmed.ncbi.nlm.nih.gov/12345/"),
            "12345"
        );
        assert_eq!(normalize_identifier(IdentifierType::Pmid, "PMID:678"), "678");
    }

    #[test]
    fn urls_keep_case() {
        let url = "https://Example.com/Paper.PDF";
        assert_eq!(normalize_identifier(IdentifierType::Url, url), url);
        assert_eq!(normalize_identifier(IdentifierType::PdfUrl, url), url);
    }

    #[test]
    fn title_lowercases_and_trims() {
        assert_eq!(
            normalize_identifier(IdentifierType::Title, "  Deep Learning "),
            "deep learning"
        );
    }

    #[test]
    fn normalize_text_folds_accents() {
        assert_eq!(normalize_text("Rényi divergence"), "renyi divergence");
        assert_eq!(normalize_text("Déjà Vu"), "deja vu");
    }

    #[test]
    fn normalize_text_strips_punctuation_and_collapses() {
        assert_eq!(
            normalize_text("Attention   Is All\tYou Need!?"),
            "attention is all you need"
        );
        assert_eq!(normalize_text("word2vec: a re-view"), "word2vec a re view");
    }

    #[test]
    fn normalize_text_empty_and_symbol_only() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("!!! ---"), "");
    }

    #[test]
    fn tokens_split() {
        assert_eq!(tokens("Deep, Learning."), vec!["deep", "learning"]);
    }
}
