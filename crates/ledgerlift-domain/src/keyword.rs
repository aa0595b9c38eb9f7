//! Keyword search results

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Where a keyword match was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Stringified scalar field
    Regular,
    /// Decoded blob field
    Blob,
}

impl MatchKind {
    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Regular => "regular",
            MatchKind::Blob => "blob",
        }
    }
}

/// Provenance of one keyword hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMatch {
    /// Field the keyword was found in
    pub field: String,
    /// The keyword as listed in the vocabulary
    pub keyword: String,
    /// Text surrounding the first occurrence
    pub excerpt: String,
    /// Scalar or blob
    pub kind: MatchKind,
}

/// Result of searching one record against a keyword set
///
/// Presence per keyword is boolean; there is no ranking across keywords.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSearchResult {
    /// Union of matched keywords
    pub found: BTreeSet<String>,
    /// One entry per (field, keyword) hit
    pub matches: Vec<KeywordMatch>,
    /// Search details (fields scanned, blobs discarded, ...)
    pub metadata: BTreeMap<String, String>,
}

impl KeywordSearchResult {
    /// Whether any keyword matched
    pub fn has_matches(&self) -> bool {
        !self.found.is_empty()
    }

    /// Record a hit
    pub fn push(&mut self, hit: KeywordMatch) {
        self.found.insert(hit.keyword.clone());
        self.matches.push(hit);
    }
}
