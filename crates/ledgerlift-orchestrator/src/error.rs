//! Error types for extraction runs

use ledgerlift_domain::ReaderError;
use thiserror::Error;

/// Errors that terminate a run or fail result-set persistence
///
/// Per-field and per-record failures never show up here; they are counted in
/// [`crate::RunStatistics`].
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The container could not be opened
    #[error("Container error: {0}")]
    Open(#[from] ReaderError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Result-set file could not be written or read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Result-set JSON could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
