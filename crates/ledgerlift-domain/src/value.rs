//! Field values as surfaced by the container reader
//!
//! A field is either a scalar the reader could decode from its fixed-width
//! slot, or a handle to a variable-length blob whose encoding is unknown.

use crate::error::BlobAccessError;
use crate::table::FieldKind;
use chrono::{NaiveDateTime, Timelike};
use std::fmt;

/// A decoded fixed-width field value
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// SQL-style null (nullable field with the null flag set)
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Packed decimal kept as its exact literal text
    Decimal(String),
    /// Character data
    Text(String),
    /// Date/time value
    DateTime(NaiveDateTime),
    /// Fixed binary (references, versions)
    Binary(Vec<u8>),
}

impl ScalarValue {
    /// Runtime kind of this value
    pub fn kind(&self) -> FieldKind {
        match self {
            ScalarValue::Null => FieldKind::Null,
            ScalarValue::Bool(_) => FieldKind::Bool,
            ScalarValue::Int(_) => FieldKind::Int,
            ScalarValue::Float(_) => FieldKind::Float,
            ScalarValue::Decimal(_) => FieldKind::Decimal,
            ScalarValue::Text(_) => FieldKind::Text,
            ScalarValue::DateTime(_) => FieldKind::DateTime,
            ScalarValue::Binary(_) => FieldKind::Binary,
        }
    }

    /// Whether this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int(i) => Some(*i as f64),
            ScalarValue::Float(f) => Some(*f),
            ScalarValue::Decimal(d) => d.trim().parse().ok(),
            _ => None,
        }
    }

    /// Text view of the value, if it is character data
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// JSON projection: primitives stay primitive, everything else is stringified
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;

        match self {
            ScalarValue::Null => Value::Null,
            ScalarValue::Bool(b) => Value::Bool(*b),
            ScalarValue::Int(i) => Value::from(*i),
            ScalarValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(f.to_string())),
            other => Value::String(other.to_string()),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => Ok(()),
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Int(i) => write!(f, "{}", i),
            ScalarValue::Float(v) => write!(f, "{}", v),
            ScalarValue::Decimal(d) => write!(f, "{}", d),
            ScalarValue::Text(s) => write!(f, "{}", s),
            ScalarValue::DateTime(dt) => {
                if dt.time().num_seconds_from_midnight() == 0 {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                }
            }
            ScalarValue::Binary(bytes) => write!(f, "{}", hex::encode(bytes)),
        }
    }
}

/// Content produced by a blob capability before any decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobValue {
    /// The reader already produced text
    Text(String),
    /// Raw bytes with unknown encoding
    Bytes(Vec<u8>),
}

impl BlobValue {
    /// Whether the value carries no content
    pub fn is_empty(&self) -> bool {
        match self {
            BlobValue::Text(s) => s.is_empty(),
            BlobValue::Bytes(b) => b.is_empty(),
        }
    }
}

/// Opaque handle to a variable-length blob field
///
/// Readers expose whichever access paths their storage format supports.
/// Every capability method returns `None` when the capability is absent and
/// `Some(Err(..))` when it exists but failed.
pub trait BlobHandle: fmt::Debug {
    /// Declared length of the blob in bytes
    fn len(&self) -> usize;

    /// Whether the blob declares zero length
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Direct value accessor
    fn value(&self) -> Option<Result<BlobValue, BlobAccessError>> {
        None
    }

    /// Iteration protocol yielding successive pieces of the blob
    fn chunks(
        &self,
    ) -> Option<Box<dyn Iterator<Item = Result<BlobValue, BlobAccessError>> + '_>> {
        None
    }

    /// Raw byte-buffer access
    fn bytes(&self) -> Option<Result<Vec<u8>, BlobAccessError>> {
        None
    }

    /// Generic string coercion
    fn coerce_string(&self) -> Option<Result<String, BlobAccessError>> {
        None
    }

    /// Access to the reader's internal storage buffer
    fn internal_buffer(&self) -> Option<Result<Vec<u8>, BlobAccessError>> {
        None
    }
}

/// A field value as enumerated from a record
#[derive(Debug)]
pub enum FieldValue {
    /// Decoded fixed-width value
    Scalar(ScalarValue),
    /// Handle to a variable-length blob
    Blob(Box<dyn BlobHandle>),
}

impl FieldValue {
    /// Whether the field is a blob handle
    pub fn is_blob(&self) -> bool {
        matches!(self, FieldValue::Blob(_))
    }

    /// Scalar view of the field, if it is one
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            FieldValue::Scalar(v) => Some(v),
            FieldValue::Blob(_) => None,
        }
    }

    /// Runtime kind of the field
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Scalar(v) => v.kind(),
            FieldValue::Blob(_) => FieldKind::Blob,
        }
    }
}

impl From<ScalarValue> for FieldValue {
    fn from(value: ScalarValue) -> Self {
        FieldValue::Scalar(value)
    }
}
