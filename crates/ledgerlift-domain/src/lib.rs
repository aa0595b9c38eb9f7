//! Ledgerlift Domain Layer
//!
//! This crate contains the data model shared by every stage of the extraction
//! pipeline and the trait interfaces the container reader must satisfy.
//!
//! ## Key Concepts
//!
//! - **Container**: a read-only binary database exposing named tables
//! - **Record**: a positional tuple of field values, possibly an empty tombstone
//! - **Blob Handle**: an opaque, length-bearing field with an undeclared encoding
//! - **Document**: the normalized, classified projection of one record
//! - **Quality score**: an advisory 0..1 ranking of a blob extraction
//!
//! ## Architecture
//!
//! - Pure data types and traits only
//! - The container reader, extractors, orchestrator and store live in other crates
//! - Every persisted type is serde-serializable so the extract and convert
//!   stages can run as separate processes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod blob;
pub mod document;
pub mod error;
pub mod keyword;
pub mod quality;
pub mod record;
pub mod table;
pub mod traits;
pub mod value;

// Re-exports for convenience
pub use blob::{BlobExtractionResult, BlobSummary, ExtractionMethod};
pub use document::{
    BlobCategory, BlobStats, Document, FieldRole, LineItem, RoleAssignment,
};
pub use error::{BlobAccessError, ReaderError};
pub use keyword::{KeywordMatch, KeywordSearchResult, MatchKind};
pub use quality::{quality_score, QualityInputs, QualityWeights};
pub use record::Record;
pub use table::{EntityKind, FieldKind, Priority, TableAnalysis};
pub use traits::{Container, ContainerSource, Table};
pub use value::{BlobHandle, BlobValue, FieldValue, ScalarValue};
