//! Keyword tagging of records
//!
//! Scalar fields are stringified and matched directly. Blob fields are
//! decoded first; decoded content shorter than the configured minimum is
//! treated as noise. Matching is a case-insensitive substring test, so stems
//! like "роз" match every inflection.

use crate::blob::BlobContentExtractor;
use crate::config::ExtractorConfig;
use ledgerlift_domain::{FieldValue, KeywordMatch, KeywordSearchResult, MatchKind, Record};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Defects, damage and returns
const QUALITY: &[&str] = &[
    "брак",
    "дефект",
    "поврежд",
    "некачеств",
    "гнил",
    "увяд",
    "претензи",
    "недостач",
    "пересорт",
    "уценк",
];

/// Business document kinds
const DOCUMENT_TYPE: &[&str] = &[
    "поступлен",
    "реализац",
    "возврат",
    "перемещен",
    "списан",
    "инвентаризац",
    "заказ",
    "счет",
    "накладн",
    "оплат",
    "платеж",
    "приходн",
    "расходн",
];

/// Flower goods
pub const FLOWER: &[&str] = &[
    "роз",
    "тюльпан",
    "хризантем",
    "гвоздик",
    "орхиде",
    "пион",
    "букет",
    "цвет",
    "rose",
    "tulip",
    "flower",
];

/// Decor goods
pub const DECOR: &[&str] = &[
    "декор",
    "ваз",
    "лент",
    "упаковк",
    "корзин",
    "кашпо",
    "decor",
];

/// Flower and decor goods together
const DOMAIN: &[&str] = &[
    "роз",
    "тюльпан",
    "хризантем",
    "гвоздик",
    "орхиде",
    "пион",
    "букет",
    "цвет",
    "rose",
    "tulip",
    "flower",
    "декор",
    "ваз",
    "лент",
    "упаковк",
    "корзин",
    "кашпо",
    "decor",
];

/// Built-in keyword vocabularies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
    /// Quality and defect terms
    Quality,
    /// Document type terms
    DocumentType,
    /// Flower and decor goods
    Domain,
}

impl Vocabulary {
    /// All built-in vocabularies
    pub const ALL: [Vocabulary; 3] = [
        Vocabulary::Quality,
        Vocabulary::DocumentType,
        Vocabulary::Domain,
    ];

    /// Lowercase keyword stems
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Vocabulary::Quality => QUALITY,
            Vocabulary::DocumentType => DOCUMENT_TYPE,
            Vocabulary::Domain => DOMAIN,
        }
    }

    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Vocabulary::Quality => "quality",
            Vocabulary::DocumentType => "document_type",
            Vocabulary::Domain => "domain",
        }
    }

    /// Parse a vocabulary name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == name)
    }
}

/// A named list of keywords to search for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet {
    name: String,
    keywords: Vec<String>,
}

impl KeywordSet {
    /// One of the built-in vocabularies
    pub fn vocabulary(vocabulary: Vocabulary) -> Self {
        Self {
            name: vocabulary.as_str().to_string(),
            keywords: vocabulary.keywords().iter().map(|k| k.to_string()).collect(),
        }
    }

    /// An arbitrary keyword list; blank entries are dropped
    pub fn custom<I, S>(name: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty() && seen.insert(k.clone()))
            .collect();
        Self {
            name: name.into(),
            keywords,
        }
    }

    /// All built-in vocabularies merged into one set
    pub fn builtin() -> Self {
        let mut keywords: Vec<String> = Vocabulary::ALL
            .iter()
            .flat_map(|v| v.keywords().iter().map(|k| k.to_string()))
            .collect();
        keywords.sort();
        keywords.dedup();
        Self {
            name: "builtin".to_string(),
            keywords,
        }
    }

    /// Set name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keywords in search order
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Searches record fields for keywords
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    extractor: BlobContentExtractor,
    min_content_len: usize,
    excerpt_radius: usize,
}

impl KeywordClassifier {
    /// Create a classifier
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            min_content_len: config.min_keyword_content_len,
            excerpt_radius: config.excerpt_radius,
            extractor: BlobContentExtractor::new(config),
        }
    }

    /// Search every field of a record
    pub fn search(&self, record: &Record, set: &KeywordSet) -> KeywordSearchResult {
        let mut result = KeywordSearchResult::default();
        let mut scanned = 0usize;
        let mut decoded = 0usize;
        let mut discarded = 0usize;

        for (name, value) in &record.fields {
            let (text, kind) = match value {
                FieldValue::Scalar(scalar) if scalar.is_null() => continue,
                FieldValue::Scalar(scalar) => (scalar.to_string(), MatchKind::Regular),
                FieldValue::Blob(handle) => {
                    let extraction = self.extractor.extract(handle.as_ref(), None);
                    let Some(content) = extraction.content else {
                        continue;
                    };
                    decoded += 1;
                    if content.chars().count() < self.min_content_len {
                        debug!(field = %name, "Blob content below noise threshold");
                        discarded += 1;
                        continue;
                    }
                    (content, MatchKind::Blob)
                }
            };
            scanned += 1;

            let lowered = text.to_lowercase();
            for keyword in &set.keywords {
                if let Some(pos) = lowered.find(keyword.as_str()) {
                    result.push(KeywordMatch {
                        field: name.clone(),
                        keyword: keyword.clone(),
                        excerpt: self.excerpt(&text, &lowered, pos, keyword),
                        kind,
                    });
                }
            }
        }

        let metadata = &mut result.metadata;
        metadata.insert("keyword_set".to_string(), set.name.clone());
        metadata.insert("fields_scanned".to_string(), scanned.to_string());
        metadata.insert("blobs_decoded".to_string(), decoded.to_string());
        metadata.insert("blobs_discarded".to_string(), discarded.to_string());
        result
    }

    /// Text around the hit at byte offset `pos` of `lowered`
    fn excerpt(&self, text: &str, lowered: &str, pos: usize, keyword: &str) -> String {
        let start = lowered[..pos].chars().count();
        let end = start + keyword.chars().count();

        // Lowercasing can change the char count; fall back to the lowered text
        let source = if text.chars().count() == lowered.chars().count() {
            text
        } else {
            lowered
        };

        source
            .chars()
            .skip(start.saturating_sub(self.excerpt_radius))
            .take(end + self.excerpt_radius - start.saturating_sub(self.excerpt_radius))
            .collect::<String>()
            .trim()
            .to_string()
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}
