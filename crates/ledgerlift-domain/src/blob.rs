//! Blob extraction results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A step that contributed to a blob extraction
///
/// The first five are access strategies, the rest are byte decodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Direct value accessor
    DirectValue,
    /// Iteration-protocol concatenation
    Iteration,
    /// Raw byte-buffer access
    RawBytes,
    /// Generic string coercion
    StringCoercion,
    /// Internal storage buffer access
    InternalBuffer,
    /// Bytes decoded as UTF-16LE
    TextUtf16,
    /// Bytes decoded as UTF-8
    TextUtf8,
    /// Bytes decoded with the legacy windows-1251 code page
    TextCp1251,
    /// Bytes rendered as hexadecimal (always succeeds)
    Hex,
}

impl ExtractionMethod {
    /// Stable snake_case name used in output artifacts
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::DirectValue => "direct_value",
            ExtractionMethod::Iteration => "iteration",
            ExtractionMethod::RawBytes => "raw_bytes",
            ExtractionMethod::StringCoercion => "string_coercion",
            ExtractionMethod::InternalBuffer => "internal_buffer",
            ExtractionMethod::TextUtf16 => "text_utf16",
            ExtractionMethod::TextUtf8 => "text_utf8",
            ExtractionMethod::TextCp1251 => "text_cp1251",
            ExtractionMethod::Hex => "hex",
        }
    }

    /// Whether this is a byte decoding rather than an access strategy
    pub fn is_decoding(&self) -> bool {
        matches!(
            self,
            ExtractionMethod::TextUtf16
                | ExtractionMethod::TextUtf8
                | ExtractionMethod::TextCp1251
                | ExtractionMethod::Hex
        )
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one blob visit
///
/// Invariant: a non-empty `methods` list implies non-empty `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobExtractionResult {
    /// Decoded text, `None` when every strategy failed
    pub content: Option<String>,

    /// Methods that produced the content, in the order they were applied
    pub methods: Vec<ExtractionMethod>,

    /// Length of `content` in characters
    pub content_length: usize,

    /// Advisory quality score in [0, 1]
    pub quality_score: f64,

    /// One entry per strategy that was attempted and failed
    pub errors: Vec<String>,

    /// Free-form details (declared length, truncation, ...)
    pub metadata: BTreeMap<String, String>,
}

impl BlobExtractionResult {
    /// Result for a blob no strategy could read
    pub fn failed(errors: Vec<String>, metadata: BTreeMap<String, String>) -> Self {
        Self {
            content: None,
            methods: Vec::new(),
            content_length: 0,
            quality_score: 0.0,
            errors,
            metadata,
        }
    }

    /// Result carrying content
    ///
    /// Falls back to [`BlobExtractionResult::failed`] when `content` is empty
    /// so the success invariant cannot be violated.
    pub fn succeeded(
        content: String,
        methods: Vec<ExtractionMethod>,
        quality_score: f64,
        errors: Vec<String>,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        if content.is_empty() || methods.is_empty() {
            return Self::failed(errors, metadata);
        }

        Self {
            content_length: content.chars().count(),
            content: Some(content),
            methods,
            quality_score: quality_score.clamp(0.0, 1.0),
            errors,
            metadata,
        }
    }

    /// Whether any content was extracted
    pub fn is_success(&self) -> bool {
        self.content.is_some()
    }

    /// The byte decoding applied, if the winning strategy returned bytes
    pub fn encoding(&self) -> Option<ExtractionMethod> {
        self.methods.iter().copied().find(ExtractionMethod::is_decoding)
    }

    /// The access strategy that won
    pub fn strategy(&self) -> Option<ExtractionMethod> {
        self.methods.iter().copied().find(|m| !m.is_decoding())
    }
}

/// Condensed blob extraction kept inside a [`crate::Document`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobSummary {
    /// Decoded text, if any
    pub content: Option<String>,
    /// Methods that produced the content
    pub methods: Vec<ExtractionMethod>,
    /// Declared blob length in bytes
    pub declared_length: usize,
    /// Advisory quality score
    pub quality_score: f64,
    /// Strategy failures
    pub errors: Vec<String>,
}

impl BlobSummary {
    /// Fold an extraction result into a summary
    pub fn from_result(result: BlobExtractionResult, declared_length: usize) -> Self {
        Self {
            content: result.content,
            methods: result.methods,
            declared_length,
            quality_score: result.quality_score,
            errors: result.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_is_never_success() {
        let result = BlobExtractionResult::succeeded(
            String::new(),
            vec![ExtractionMethod::RawBytes],
            0.9,
            Vec::new(),
            BTreeMap::new(),
        );
        assert!(!result.is_success());
        assert!(result.methods.is_empty());
        assert_eq!(result.quality_score, 0.0);
    }

    #[test]
    fn test_strategy_and_encoding_split() {
        let result = BlobExtractionResult::succeeded(
            "ROSES".into(),
            vec![ExtractionMethod::RawBytes, ExtractionMethod::TextUtf8],
            0.4,
            Vec::new(),
            BTreeMap::new(),
        );
        assert_eq!(result.strategy(), Some(ExtractionMethod::RawBytes));
        assert_eq!(result.encoding(), Some(ExtractionMethod::TextUtf8));
        assert_eq!(result.content_length, 5);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(ExtractionMethod::TextUtf8.as_str(), "text_utf8");
        assert_eq!(
            serde_json::to_string(&ExtractionMethod::StringCoercion).unwrap(),
            "\"string_coercion\""
        );
    }
}
