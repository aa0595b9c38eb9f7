//! Error types for the extractors

use thiserror::Error;

/// Errors raised while constructing an analyzer
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Configuration rejected by validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// A built-in or custom pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

/// A classification failure confined to one field
///
/// Never aborts the record: the raw value is kept and the field falls back
/// to the `Other` role.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    /// A floating point value that is NaN or infinite
    #[error("Field {field}: non-finite number {value}")]
    NonFiniteNumber {
        /// Field name
        field: String,
        /// Rendered value
        value: String,
    },

    /// Amount-looking content that does not parse as a number
    #[error("Field {field}: unparsable amount '{value}'")]
    UnparsableAmount {
        /// Field name
        field: String,
        /// Raw text
        value: String,
    },
}
