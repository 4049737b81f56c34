use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub mod alias;
pub mod authors;
pub mod engine;
pub mod norm;
pub mod placeholder;
pub mod resolver;
pub mod store;
pub mod strategy;

// Re-export for convenience
pub use alias::{AliasIndex, AliasStatistics, BatchOutcome, EntryOutcome, extract_aliases};
pub use engine::{FieldScore, MatchConfig, MatchEngine, MatchField, MatchResult};
pub use placeholder::{PlaceholderId, placeholder_id};
pub use resolver::{CitationReport, CitationResolver, ReferenceInput, ReferenceOutcome};
pub use store::{
    AliasRecord, AliasSpec, AliasWriteOutcome, Candidate, CitationEdge, CitationTarget,
    GraphStore, StoreError, UnresolvedNode, memory::MemoryStore,
};

/// Canonical, immutable identifier for one literature record.
///
/// Assigned once by the ingestion pipeline and never regenerated; this crate
/// only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lid(pub String);

impl Lid {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Lid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kinds of external identifiers that can alias a literature record.
///
/// Variant order is the lookup precedence used by [`AliasIndex::resolve`]:
/// strong global identifiers first, free-text title last.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierType {
    Doi,
    Arxiv,
    Pmid,
    Url,
    PdfUrl,
    Title,
}

impl IdentifierType {
    pub fn all() -> &'static [IdentifierType] {
        &[
            IdentifierType::Doi,
            IdentifierType::Arxiv,
            IdentifierType::Pmid,
            IdentifierType::Url,
            IdentifierType::PdfUrl,
            IdentifierType::Title,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierType::Doi => "doi",
            IdentifierType::Arxiv => "arxiv",
            IdentifierType::Pmid => "pmid",
            IdentifierType::Url => "url",
            IdentifierType::PdfUrl => "pdf_url",
            IdentifierType::Title => "title",
        }
    }
}

impl fmt::Display for IdentifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IdentifierType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdentifierType::all()
            .iter()
            .copied()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| format!("unknown identifier type: {s}"))
    }
}

/// The comparison scenario a match runs under. Each type selects a fixed
/// weight/threshold profile in [`MatchConfig::for_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Minimize false merges: tight thresholds, identifier-mismatch veto.
    Deduplication,
    /// Minimize false negatives: an unmatched citation only costs a
    /// placeholder node.
    Citation,
    /// Balanced default for ad-hoc lookups.
    General,
}

/// A bibliographic record as supplied by the surrounding ingestion pipeline.
///
/// This is the single explicit input type at the engine boundary. Loosely
/// typed source dictionaries (possibly with nested `identifiers` / `metadata`
/// sub-objects) are flattened once via [`SourceRecord::from_json`]; everything
/// past that boundary works with plain optional fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arxiv_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

impl SourceRecord {
    /// Flatten a loosely-typed source dictionary into an explicit record.
    ///
    /// Top-level fields win over `identifiers.*`, which win over
    /// `metadata.*`. Absent and empty-string fields stay `None`; an empty
    /// string is never a valid identifier value.
    pub fn from_json(value: &serde_json::Value) -> Self {
        let mut record = Self::default();
        record.absorb(value);
        if let Some(ids) = value.get("identifiers") {
            record.absorb(ids);
        }
        if let Some(meta) = value.get("metadata") {
            record.absorb(meta);
        }
        record
    }

    fn absorb(&mut self, value: &serde_json::Value) {
        fn text(value: &serde_json::Value, keys: &[&str]) -> Option<String> {
            keys.iter().find_map(|k| {
                value
                    .get(k)
                    .and_then(serde_json::Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
            })
        }

        self.title = self.title.take().or_else(|| text(value, &["title"]));
        self.journal = self
            .journal
            .take()
            .or_else(|| text(value, &["journal", "venue"]));
        self.doi = self.doi.take().or_else(|| text(value, &["doi"]));
        self.arxiv_id = self
            .arxiv_id
            .take()
            .or_else(|| text(value, &["arxiv_id", "arxiv"]));
        self.pmid = self.pmid.take().or_else(|| text(value, &["pmid"]));
        self.url = self.url.take().or_else(|| text(value, &["url"]));
        self.pdf_url = self.pdf_url.take().or_else(|| text(value, &["pdf_url"]));

        if self.year.is_none() {
            self.year = value.get("year").and_then(|y| {
                y.as_i64()
                    .map(|n| n as i32)
                    .or_else(|| y.as_str().and_then(|s| s.trim().parse().ok()))
            });
        }

        if self.authors.is_empty()
            && let Some(arr) = value.get("authors").and_then(serde_json::Value::as_array)
        {
            self.authors = arr
                .iter()
                .filter_map(|a| {
                    a.as_str()
                        .or_else(|| a.get("name").and_then(serde_json::Value::as_str))
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                })
                .collect();
        }
    }

    /// Raw (un-normalized) value for one identifier type, if present.
    pub fn identifier(&self, ty: IdentifierType) -> Option<&str> {
        let value = match ty {
            IdentifierType::Doi => self.doi.as_deref(),
            IdentifierType::Arxiv => self.arxiv_id.as_deref(),
            IdentifierType::Pmid => self.pmid.as_deref(),
            IdentifierType::Url => self.url.as_deref(),
            IdentifierType::PdfUrl => self.pdf_url.as_deref(),
            IdentifierType::Title => self.title.as_deref(),
        };
        value.map(str::trim).filter(|s| !s.is_empty())
    }

    /// All identifier values present on this record, keyed by type.
    pub fn identifiers(&self) -> BTreeMap<IdentifierType, &str> {
        IdentifierType::all()
            .iter()
            .filter_map(|ty| self.identifier(*ty).map(|v| (*ty, v)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.identifiers().is_empty() && self.authors.is_empty() && self.year.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_flat() {
        let record = SourceRecord::from_json(&json!({
            "title": "Deep Learning",
            "doi": "10.1038/nature14539",
            "authors": ["Yann LeCun", "Yoshua Bengio", "Geoffrey Hinton"],
            "year": 2015,
        }));
        assert_eq!(record.title.as_deref(), Some("Deep Learning"));
        assert_eq!(record.doi.as_deref(), Some("10.1038/nature14539"));
        assert_eq!(record.authors.len(), 3);
        assert_eq!(record.year, Some(2015));
    }

    #[test]
    fn from_json_nested_identifiers() {
        let record = SourceRecord::from_json(&json!({
            "title": "Some Paper",
            "identifiers": { "doi": "10.1/abc", "arxiv_id": "2101.00001" },
            "metadata": { "journal": "Nature", "year": "2021" },
        }));
        assert_eq!(record.doi.as_deref(), Some("10.1/abc"));
        assert_eq!(record.arxiv_id.as_deref(), Some("2101.00001"));
        assert_eq!(record.journal.as_deref(), Some("Nature"));
        assert_eq!(record.year, Some(2021));
    }

    #[test]
    fn from_json_top_level_wins_over_nested() {
        let record = SourceRecord::from_json(&json!({
            "doi": "10.1/top",
            "identifiers": { "doi": "10.1/nested" },
        }));
        assert_eq!(record.doi.as_deref(), Some("10.1/top"));
    }

    #[test]
    fn from_json_empty_strings_are_absent() {
        let record = SourceRecord::from_json(&json!({
            "doi": "",
            "title": "   ",
            "pmid": "123",
        }));
        assert!(record.doi.is_none());
        assert!(record.title.is_none());
        assert_eq!(record.pmid.as_deref(), Some("123"));
    }

    #[test]
    fn from_json_author_objects() {
        let record = SourceRecord::from_json(&json!({
            "authors": [{ "name": "Ada Lovelace" }, "Charles Babbage", ""],
        }));
        assert_eq!(record.authors, vec!["Ada Lovelace", "Charles Babbage"]);
    }

    #[test]
    fn identifiers_map_follows_precedence_order() {
        let record = SourceRecord::from_json(&json!({
            "title": "T",
            "doi": "10.1/x",
            "pmid": "99",
        }));
        let keys: Vec<_> = record.identifiers().into_keys().collect();
        assert_eq!(
            keys,
            vec![IdentifierType::Doi, IdentifierType::Pmid, IdentifierType::Title]
        );
    }

    #[test]
    fn year_from_string() {
        let record = SourceRecord::from_json(&json!({ "year": " 1999 " }));
        assert_eq!(record.year, Some(1999));
    }
}
