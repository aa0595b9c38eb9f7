//! Ledgerlift Extractor
//!
//! Turns raw container records into classified documents.
//!
//! # Overview
//!
//! The container does not declare what its fields mean, and blob fields do
//! not even declare an encoding. Everything here is best-effort heuristics:
//! every decision records which rule or method produced it, and no single
//! field can fail a whole record.
//!
//! # Components
//!
//! - [`BlobContentExtractor`]: ordered access strategies and a byte decoding
//!   chain (UTF-16LE, UTF-8, windows-1251, hex) with an advisory quality score
//! - [`TableStructureAnalyzer`]: bounded table sampling, priority classes and
//!   time estimates
//! - [`KeywordClassifier`]: vocabulary tagging over scalars and decoded blobs
//! - [`DocumentStructureAnalyzer`]: rule-table role assignment, blob
//!   attribute matching and table-part line items
//!
//! # Example Usage
//!
//! ```no_run
//! use ledgerlift_domain::{Record, ScalarValue};
//! use ledgerlift_extractor::{DocumentStructureAnalyzer, ExtractorConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let analyzer = DocumentStructureAnalyzer::new(ExtractorConfig::default())?;
//! let record = Record::new(
//!     0,
//!     vec![("_NUMBER".to_string(), ScalarValue::Text("0001".into()).into())],
//! );
//!
//! let doc = analyzer.classify(&record, "_DOCUMENT163", 0);
//! println!("Number: {:?}", doc.document_number);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod blob;
mod config;
mod document;
mod encoding;
mod error;
mod keywords;
mod rules;
mod table;

#[cfg(test)]
mod tests;

pub use blob::{BlobContentExtractor, BlobCounters, StrategyOutcome, TypeHint};
pub use config::ExtractorConfig;
pub use document::{line_item, DocumentStructureAnalyzer, TablePartIndex, REF_FIELD};
pub use encoding::decode_bytes;
pub use error::{ExtractorError, FieldError};
pub use keywords::{KeywordClassifier, KeywordSet, Vocabulary};
pub use rules::{default_rules, FieldProbe, Patterns, RoleRule, DATE_FIELD, NUMBER_FIELD};
pub use table::{Complexity, TableStructureAnalyzer};
