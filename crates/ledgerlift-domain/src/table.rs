//! Table-level analysis types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Runtime kind of a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Null
    Null,
    /// Boolean
    Bool,
    /// Integer
    Int,
    /// Floating point
    Float,
    /// Packed decimal
    Decimal,
    /// Text
    Text,
    /// Date/time
    DateTime,
    /// Fixed binary
    Binary,
    /// Blob handle
    Blob,
}

/// Processing priority of a table
///
/// Variants are ordered from most to least important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    /// Process first
    Critical,
    /// Process early
    High,
    /// Process if budget allows
    Medium,
    /// Process last
    Low,
}

impl Priority {
    /// Upper-case label used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity kind of a table, derived from its name prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Business documents (`_DOCUMENT...`)
    Documents,
    /// Reference catalogs (`_REFERENCE...`)
    References,
    /// Accumulation and information registers (`_ACCUMRG...`, `_INFORG...`)
    Registers,
}

impl EntityKind {
    /// All kinds in output order
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Documents,
        EntityKind::References,
        EntityKind::Registers,
    ];

    /// Classify a table name by prefix; unknown prefixes count as documents
    pub fn from_table_name(name: &str) -> Self {
        let upper = name.to_ascii_uppercase();
        if upper.starts_with("_REFERENCE") {
            EntityKind::References
        } else if upper.starts_with("_ACCUMRG")
            || upper.starts_with("_ACCRG")
            || upper.starts_with("_INFORG")
        {
            EntityKind::Registers
        } else {
            EntityKind::Documents
        }
    }

    /// Artifact and SQL table name
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Documents => "documents",
            EntityKind::References => "references",
            EntityKind::Registers => "registers",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one table scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableAnalysis {
    /// Table name
    pub table_name: String,
    /// Number of record slots, tombstones included
    pub record_count: usize,
    /// First-observed kind per field name
    pub field_types: BTreeMap<String, FieldKind>,
    /// Sampled non-empty records as JSON maps
    pub sample_records: Vec<BTreeMap<String, serde_json::Value>>,
    /// Whether the sampled prefix contained tombstones
    pub has_empty_records: bool,
    /// Processing priority
    pub priority: Priority,
}
