//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Container could not be opened or read
    #[error("Container error: {0}")]
    Reader(#[from] ledgerlift_domain::ReaderError),

    /// Analyzer setup failed
    #[error("Extractor error: {0}")]
    Extractor(#[from] ledgerlift_extractor::ExtractorError),

    /// Extraction run failed
    #[error("Extraction error: {0}")]
    Orchestrator(#[from] ledgerlift_orchestrator::OrchestratorError),

    /// Conversion failed
    #[error("Conversion error: {0}")]
    Store(#[from] ledgerlift_store::StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The blocking worker panicked or was cancelled
    #[error("Worker failed: {0}")]
    Worker(String),
}
