//! Record model

use crate::value::{FieldValue, ScalarValue};

/// A positional tuple of field values read from one table slot
///
/// Empty records are tombstoned slots (deleted rows). They are part of the
/// table length but carry no fields and must be skipped by consumers.
#[derive(Debug)]
pub struct Record {
    /// Slot index within the table, stable for the duration of a run
    pub index: usize,

    /// Tombstone flag
    pub empty: bool,

    /// Fields in schema order
    pub fields: Vec<(String, FieldValue)>,
}

impl Record {
    /// Create a populated record
    pub fn new(index: usize, fields: Vec<(String, FieldValue)>) -> Self {
        Self {
            index,
            empty: false,
            fields,
        }
    }

    /// Create a tombstoned record
    pub fn tombstone(index: usize) -> Self {
        Self {
            index,
            empty: true,
            fields: Vec::new(),
        }
    }

    /// Whether this slot is a tombstone
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Look up a field by exact name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Look up a scalar field by exact name
    pub fn scalar(&self, name: &str) -> Option<&ScalarValue> {
        self.get(name).and_then(FieldValue::as_scalar)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterate over field names in schema order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }
}
