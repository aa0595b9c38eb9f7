//! Normalized documents
//!
//! A [`Document`] is the classified projection of one raw record. It is
//! built once during orchestration and not modified after it joins a result set.

use crate::blob::BlobSummary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Semantic role assigned to a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    /// Document number
    Number,
    /// Document date
    Date,
    /// Monetary amount
    Amount,
    /// Document type description
    Type,
    /// Free-text description
    Description,
    /// Anything else
    Other,
}

impl FieldRole {
    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldRole::Number => "number",
            FieldRole::Date => "date",
            FieldRole::Amount => "amount",
            FieldRole::Type => "type",
            FieldRole::Description => "description",
            FieldRole::Other => "other",
        }
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role a field received and which rule assigned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Assigned role
    pub role: FieldRole,
    /// Name of the rule that matched first
    pub rule: String,
    /// Heuristic confidence of that rule in [0, 1]
    pub confidence: f64,
}

/// Category inferred from decoded blob text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobCategory {
    /// Flower goods
    Flower,
    /// Decor goods
    Decor,
    /// The blob describes a document type
    Type,
}

impl BlobCategory {
    /// Stable snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobCategory::Flower => "flower",
            BlobCategory::Decor => "decor",
            BlobCategory::Type => "type",
        }
    }
}

/// One row of a child table-part
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Line number within the parent document
    pub line_number: Option<i64>,
    /// Goods or service reference
    pub nomenclature: Option<String>,
    /// Quantity
    pub quantity: Option<f64>,
    /// Unit price
    pub price: Option<f64>,
    /// Line amount
    pub amount: Option<f64>,
}

/// Blob extraction counters for one document
///
/// `total == successful + failed` holds by construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobStats {
    /// Blob fields visited
    pub total: usize,
    /// Visits that produced content
    pub successful: usize,
    /// Visits where every strategy failed
    pub failed: usize,
    /// Fields whose classification raised an error
    pub field_errors: usize,
}

impl BlobStats {
    /// Record one blob visit
    pub fn record_blob(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.successful += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Normalized projection of one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Source table
    pub table_name: String,
    /// Source record index
    pub row_index: usize,

    /// Classified document number
    pub document_number: Option<String>,
    /// Classified document date
    pub document_date: Option<String>,
    /// Classified document type
    pub document_type: Option<String>,
    /// Classified amount
    pub total_amount: Option<f64>,
    /// Store name found in blob text
    pub store_name: Option<String>,
    /// Store code found in blob text
    pub store_code: Option<String>,
    /// Category found in blob text
    pub category: Option<BlobCategory>,
    /// Counterpart names found in text fields
    #[serde(default)]
    pub counterpart_names: Vec<String>,

    /// Role per field name
    #[serde(default)]
    pub field_roles: BTreeMap<String, RoleAssignment>,
    /// Raw scalar fields as JSON values
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
    /// Blob fields after extraction
    #[serde(default)]
    pub blobs: BTreeMap<String, BlobSummary>,
    /// Child table-part rows
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    /// Keywords found by the keyword classifier
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Blob extraction counters
    #[serde(default)]
    pub stats: BlobStats,
    /// Messages of per-field classification errors
    #[serde(default)]
    pub field_errors: Vec<String>,
}

impl Document {
    /// Create an empty document for a record identity
    pub fn new(table_name: impl Into<String>, row_index: usize) -> Self {
        Self {
            table_name: table_name.into(),
            row_index,
            document_number: None,
            document_date: None,
            document_type: None,
            total_amount: None,
            store_name: None,
            store_code: None,
            category: None,
            counterpart_names: Vec::new(),
            field_roles: BTreeMap::new(),
            fields: BTreeMap::new(),
            blobs: BTreeMap::new(),
            line_items: Vec::new(),
            keywords: Vec::new(),
            stats: BlobStats::default(),
            field_errors: Vec::new(),
        }
    }

    /// Attach keywords (sorted, deduplicated)
    pub fn with_keywords<I>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut keywords: Vec<String> = keywords.into_iter().collect();
        keywords.sort();
        keywords.dedup();
        self.keywords = keywords;
        self
    }

    /// Number of raw scalar fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Number of blob fields
    pub fn blob_count(&self) -> usize {
        self.blobs.len()
    }

    /// Fields that received a given role, in name order
    pub fn fields_with_role(&self, role: FieldRole) -> impl Iterator<Item = &str> {
        self.field_roles
            .iter()
            .filter(move |(_, assignment)| assignment.role == role)
            .map(|(name, _)| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_stats_invariant() {
        let mut stats = BlobStats::default();
        stats.record_blob(true);
        stats.record_blob(false);
        stats.record_blob(true);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.successful, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.total, stats.successful + stats.failed);
    }

    #[test]
    fn test_keywords_sorted_and_deduplicated() {
        let doc = Document::new("_DOCUMENT1", 0).with_keywords(vec![
            "роз".to_string(),
            "брак".to_string(),
            "роз".to_string(),
        ]);
        assert_eq!(doc.keywords, vec!["брак", "роз"]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut doc = Document::new("_DOCUMENT1", 4);
        doc.document_number = Some("12345".into());
        doc.total_amount = Some(1500.5);
        doc.category = Some(BlobCategory::Flower);
        doc.fields.insert("_NUMBER".into(), serde_json::json!("12345"));

        let json = serde_json::to_string(&doc).unwrap();
        let parsed: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, doc);
        assert!(json.contains("\"flower\""));
    }
}
