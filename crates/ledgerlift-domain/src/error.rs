//! Error types raised at the container reader boundary

use thiserror::Error;

/// Errors produced by a container reader
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReaderError {
    /// The container could not be opened at all (fatal for a run)
    #[error("Failed to open container: {0}")]
    Open(String),

    /// A table name was requested that the container does not hold
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// A record index outside the table bounds
    #[error("Record index {index} out of range for table {table} ({len} records)")]
    IndexOutOfRange {
        /// Table name
        table: String,
        /// Requested index
        index: usize,
        /// Table length
        len: usize,
    },

    /// A record slot exists but its bytes could not be decoded
    #[error("Corrupt record {index} in table {table}: {reason}")]
    CorruptRecord {
        /// Table name
        table: String,
        /// Record index
        index: usize,
        /// Reader-provided reason
        reason: String,
    },

    /// The schema declares a field type code the reader has no width for
    #[error("Unknown field type code: {0}")]
    UnknownFieldType(String),

    /// Invalid container data outside of a single record
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Errors raised by a single blob access capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlobAccessError {
    /// The backing pages of the blob could not be read
    #[error("Blob read failed: {0}")]
    Read(String),

    /// The capability exists but produced a value it cannot represent
    #[error("Blob conversion failed: {0}")]
    Conversion(String),
}
