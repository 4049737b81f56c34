//! Deterministic IDs for not-yet-catalogued cited works.
//!
//! Two citing works referencing the same uncatalogued paper must converge on
//! one placeholder node, so the ID is a content hash of the best available
//! bibliographic fragment rather than anything time- or sequence-derived.
//! Preference order: title, then DOI, then authors, then year, with the
//! normalized raw citation text as the final deterministic fallback. A
//! reference with no fragment at all (not even raw text) has no identity to
//! hash and gets no placeholder.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::norm::{normalize_identifier, normalize_text};
use crate::resolver::ReferenceInput;
use crate::IdentifierType;

/// Deterministic identifier of an unresolved placeholder node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderId(pub String);

impl PlaceholderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the placeholder ID for a reference, or `None` when the reference
/// carries nothing hashable.
///
/// The fragment kind is part of the hashed key, so a title and a raw text
/// that happen to normalize identically still produce distinct IDs.
pub fn placeholder_id(reference: &ReferenceInput) -> Option<PlaceholderId> {
    let record = &reference.record;

    let key = if let Some(title) = non_empty(record.title.as_deref().map(normalize_text)) {
        format!("title:{title}")
    } else if let Some(doi) = record.doi.as_deref() {
        format!("doi:{}", normalize_identifier(IdentifierType::Doi, doi))
    } else if !record.authors.is_empty() {
        let names: Vec<String> = record.authors.iter().map(|a| normalize_text(a)).collect();
        format!("authors:{}", names.join(";"))
    } else if let Some(year) = record.year {
        format!("year:{year}")
    } else if let Some(raw) = non_empty(Some(normalize_text(&reference.raw_text))) {
        format!("raw:{raw}")
    } else {
        return None;
    };

    let digest = Sha256::digest(key.as_bytes());
    Some(PlaceholderId(format!(
        "unresolved:{}",
        hex::encode(&digest[..8])
    )))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}
