//! Blob content extraction
//!
//! A blob handle is probed with an ordered list of access strategies. Each
//! strategy reports an outcome instead of raising; the first one that yields
//! non-empty content wins and no later strategy runs. Byte content goes
//! through [`decode_bytes`].

use crate::config::ExtractorConfig;
use crate::encoding::decode_bytes;
use crate::keywords::Vocabulary;
use ledgerlift_domain::{
    quality_score, BlobAccessError, BlobExtractionResult, BlobHandle, BlobValue,
    ExtractionMethod, QualityInputs,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// What the caller expects the blob to describe
///
/// Enables the keyword density term of the quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    /// Business document text (document-type vocabulary)
    Document,
    /// Goods description (domain vocabulary)
    Goods,
}

impl TypeHint {
    fn vocabulary(&self) -> Vocabulary {
        match self {
            TypeHint::Document => Vocabulary::DocumentType,
            TypeHint::Goods => Vocabulary::Domain,
        }
    }
}

/// Outcome of one access strategy
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    /// The handle lacks the capability
    Inapplicable,
    /// The capability worked but produced nothing
    Empty,
    /// The capability raised
    Failed(String),
    /// The capability produced content
    Content(BlobValue),
}

impl From<Option<Result<BlobValue, BlobAccessError>>> for StrategyOutcome {
    fn from(access: Option<Result<BlobValue, BlobAccessError>>) -> Self {
        match access {
            None => StrategyOutcome::Inapplicable,
            Some(Err(e)) => StrategyOutcome::Failed(e.to_string()),
            Some(Ok(value)) if value.is_empty() => StrategyOutcome::Empty,
            Some(Ok(value)) => StrategyOutcome::Content(value),
        }
    }
}

type Strategy = fn(&dyn BlobHandle) -> StrategyOutcome;

/// Access strategies in the order they are tried
const STRATEGIES: [(ExtractionMethod, Strategy); 5] = [
    (ExtractionMethod::DirectValue, direct_value),
    (ExtractionMethod::Iteration, iteration),
    (ExtractionMethod::RawBytes, raw_bytes),
    (ExtractionMethod::StringCoercion, string_coercion),
    (ExtractionMethod::InternalBuffer, internal_buffer),
];

fn direct_value(handle: &dyn BlobHandle) -> StrategyOutcome {
    handle.value().into()
}

fn iteration(handle: &dyn BlobHandle) -> StrategyOutcome {
    let Some(pieces) = handle.chunks() else {
        return StrategyOutcome::Inapplicable;
    };

    let mut text = String::new();
    let mut bytes = Vec::new();
    let mut saw_bytes = false;

    for piece in pieces {
        match piece {
            Ok(BlobValue::Text(s)) => text.push_str(&s),
            Ok(BlobValue::Bytes(b)) => {
                saw_bytes = true;
                bytes.extend_from_slice(&b);
            }
            Err(e) => return StrategyOutcome::Failed(e.to_string()),
        }
    }

    // Mixed pieces are joined as bytes
    let value = if saw_bytes {
        let mut joined = text.into_bytes();
        joined.extend(bytes);
        BlobValue::Bytes(joined)
    } else {
        BlobValue::Text(text)
    };
    if value.is_empty() {
        StrategyOutcome::Empty
    } else {
        StrategyOutcome::Content(value)
    }
}

fn raw_bytes(handle: &dyn BlobHandle) -> StrategyOutcome {
    handle.bytes().map(|r| r.map(BlobValue::Bytes)).into()
}

fn string_coercion(handle: &dyn BlobHandle) -> StrategyOutcome {
    handle.coerce_string().map(|r| r.map(BlobValue::Text)).into()
}

fn internal_buffer(handle: &dyn BlobHandle) -> StrategyOutcome {
    handle.internal_buffer().map(|r| r.map(BlobValue::Bytes)).into()
}

/// Successful extractions per access strategy and per decoding
///
/// Totals are folded from [`BlobExtractionResult`] method lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobCounters {
    /// Wins of the direct value accessor
    pub direct_value: usize,
    /// Wins of iteration concatenation
    pub iteration: usize,
    /// Wins of raw byte access
    pub raw_bytes: usize,
    /// Wins of string coercion
    pub string_coercion: usize,
    /// Wins of internal buffer access
    pub internal_buffer: usize,
    /// Byte content decoded as UTF-16LE
    pub utf16: usize,
    /// Byte content decoded as UTF-8
    pub utf8: usize,
    /// Byte content decoded as windows-1251
    pub cp1251: usize,
    /// Byte content rendered as hex
    pub hex: usize,
    /// Blobs where every strategy failed
    pub failed: usize,
}

impl BlobCounters {
    /// Count the methods of one blob visit
    pub fn record(&mut self, methods: &[ExtractionMethod]) {
        if methods.is_empty() {
            self.failed += 1;
            return;
        }
        for method in methods {
            let slot = match method {
                ExtractionMethod::DirectValue => &mut self.direct_value,
                ExtractionMethod::Iteration => &mut self.iteration,
                ExtractionMethod::RawBytes => &mut self.raw_bytes,
                ExtractionMethod::StringCoercion => &mut self.string_coercion,
                ExtractionMethod::InternalBuffer => &mut self.internal_buffer,
                ExtractionMethod::TextUtf16 => &mut self.utf16,
                ExtractionMethod::TextUtf8 => &mut self.utf8,
                ExtractionMethod::TextCp1251 => &mut self.cp1251,
                ExtractionMethod::Hex => &mut self.hex,
            };
            *slot += 1;
        }
    }

    /// Add another set of counters
    pub fn merge(&mut self, other: &BlobCounters) {
        self.direct_value += other.direct_value;
        self.iteration += other.iteration;
        self.raw_bytes += other.raw_bytes;
        self.string_coercion += other.string_coercion;
        self.internal_buffer += other.internal_buffer;
        self.utf16 += other.utf16;
        self.utf8 += other.utf8;
        self.cp1251 += other.cp1251;
        self.hex += other.hex;
        self.failed += other.failed;
    }

    /// Successful blob visits
    pub fn successful(&self) -> usize {
        self.direct_value
            + self.iteration
            + self.raw_bytes
            + self.string_coercion
            + self.internal_buffer
    }
}

/// Extracts readable content from opaque blob handles
#[derive(Debug, Clone)]
pub struct BlobContentExtractor {
    config: ExtractorConfig,
}

impl BlobContentExtractor {
    /// Create an extractor
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract content from a blob handle
    ///
    /// Never fails: when no strategy yields content the result carries no
    /// content, no methods, a zero score and one error per strategy that was
    /// attempted and failed.
    pub fn extract(&self, handle: &dyn BlobHandle, hint: Option<TypeHint>) -> BlobExtractionResult {
        let mut errors = Vec::new();
        let mut metadata = BTreeMap::new();
        metadata.insert("declared_length".to_string(), handle.len().to_string());

        for (method, strategy) in STRATEGIES {
            let value = match strategy(handle) {
                StrategyOutcome::Inapplicable => continue,
                StrategyOutcome::Empty => {
                    debug!(strategy = %method, "Strategy produced no content");
                    continue;
                }
                StrategyOutcome::Failed(message) => {
                    debug!(strategy = %method, error = %message, "Strategy failed");
                    errors.push(format!("{}: {}", method, message));
                    continue;
                }
                StrategyOutcome::Content(value) => value,
            };

            let (content, methods) = match value {
                BlobValue::Text(text) => (text.trim_end_matches('\0').to_string(), vec![method]),
                BlobValue::Bytes(bytes) => {
                    let (text, encoding) = decode_bytes(&bytes);
                    (text, vec![method, encoding])
                }
            };
            if content.is_empty() {
                continue;
            }

            let content = self.truncate(content, &mut metadata);
            let score = self.score(&content, methods.len(), errors.len(), hint);
            return BlobExtractionResult::succeeded(content, methods, score, errors, metadata);
        }

        BlobExtractionResult::failed(errors, metadata)
    }

    fn truncate(&self, content: String, metadata: &mut BTreeMap<String, String>) -> String {
        let limit = self.config.max_content_chars;
        match content.char_indices().nth(limit) {
            Some((cut, _)) => {
                metadata.insert(
                    "truncated_from".to_string(),
                    content.chars().count().to_string(),
                );
                content[..cut].to_string()
            }
            None => content,
        }
    }

    fn score(
        &self,
        content: &str,
        method_count: usize,
        error_count: usize,
        hint: Option<TypeHint>,
    ) -> f64 {
        let keyword_density = hint.map(|hint| {
            let keywords = hint.vocabulary().keywords();
            let lowered = content.to_lowercase();
            let found = keywords.iter().filter(|k| lowered.contains(*k)).count();
            found as f64 / keywords.len().max(1) as f64
        });

        quality_score(
            &QualityInputs {
                content_length: content.chars().count(),
                method_count,
                error_count,
                keyword_density,
            },
            &self.config.weights(),
        )
    }
}

impl Default for BlobContentExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}
