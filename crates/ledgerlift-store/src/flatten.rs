//! Flattening of documents into table rows
//!
//! Every row carries the fixed base columns. Raw fields and blobs add one text
//! column each, named `field_<name>` and `blob_<name>`; a dynamic name that
//! collides with a base column or an earlier dynamic column gets `_raw`
//! suffixes until it is unique.

use ledgerlift_domain::Document;
use std::collections::BTreeMap;

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// UTF-8 text
    Text,
    /// 64-bit integer
    Int,
    /// 64-bit float
    Float,
}

impl ColumnType {
    /// SQLite column affinity
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Int => "INTEGER",
            ColumnType::Float => "REAL",
        }
    }
}

/// Fixed columns present in every artifact, in output order
pub const BASE_COLUMNS: [(&str, ColumnType); 17] = [
    ("table_name", ColumnType::Text),
    ("row_index", ColumnType::Int),
    ("document_number", ColumnType::Text),
    ("document_date", ColumnType::Text),
    ("document_type", ColumnType::Text),
    ("total_amount", ColumnType::Float),
    ("store_name", ColumnType::Text),
    ("store_code", ColumnType::Text),
    ("category", ColumnType::Text),
    ("counterparts", ColumnType::Text),
    ("keywords", ColumnType::Text),
    ("line_item_count", ColumnType::Int),
    ("field_count", ColumnType::Int),
    ("blob_count", ColumnType::Int),
    ("blobs_total", ColumnType::Int),
    ("blobs_successful", ColumnType::Int),
    ("blobs_failed", ColumnType::Int),
];

/// One cell
#[derive(Debug, Clone, PartialEq)]
pub enum FlatValue {
    /// Missing value
    Null,
    /// Integer cell
    Int(i64),
    /// Float cell
    Float(f64),
    /// Text cell
    Text(String),
}

impl FlatValue {
    fn text(value: Option<&str>) -> Self {
        value.map_or(FlatValue::Null, |s| FlatValue::Text(s.to_string()))
    }

    fn count(n: usize) -> Self {
        FlatValue::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }

    /// Text rendering, `None` for nulls
    pub fn as_text(&self) -> Option<String> {
        match self {
            FlatValue::Null => None,
            FlatValue::Int(i) => Some(i.to_string()),
            FlatValue::Float(f) => Some(f.to_string()),
            FlatValue::Text(s) => Some(s.clone()),
        }
    }

    /// Integer value, `None` for nulls and non-integers
    pub fn as_int(&self) -> Option<i64> {
        match self {
            FlatValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float value, integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FlatValue::Float(f) => Some(*f),
            FlatValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

/// A flattened document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRow {
    cells: BTreeMap<String, FlatValue>,
}

impl FlatRow {
    /// Cell of a column, `Null` when absent
    pub fn get(&self, column: &str) -> &FlatValue {
        self.cells.get(column).unwrap_or(&FlatValue::Null)
    }

    /// Column names other than the base columns
    pub fn dynamic_columns(&self) -> impl Iterator<Item = &str> {
        self.cells
            .keys()
            .map(String::as_str)
            .filter(|name| !is_base_column(name))
    }

    /// Cells of the dynamic columns, in column order
    pub fn dynamic_cells(&self) -> impl Iterator<Item = (&str, &FlatValue)> {
        self.cells
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .filter(|(name, _)| !is_base_column(name))
    }

    fn set(&mut self, column: impl Into<String>, value: FlatValue) {
        self.cells.insert(column.into(), value);
    }
}

fn is_base_column(name: &str) -> bool {
    BASE_COLUMNS.iter().any(|(base, _)| *base == name)
}

impl FlatRow {
    /// Column for a raw field or blob, suffixed with `_raw` until it is free
    fn dynamic_name(&self, prefix: &str, name: &str) -> String {
        let mut column = format!("{}_{}", prefix, name);
        while is_base_column(&column) || self.cells.contains_key(&column) {
            column.push_str("_raw");
        }
        column
    }
}

/// Project a document onto the row layout
pub fn flatten(doc: &Document) -> FlatRow {
    let mut row = FlatRow::default();

    row.set("table_name", FlatValue::Text(doc.table_name.clone()));
    row.set("row_index", FlatValue::count(doc.row_index));
    row.set("document_number", FlatValue::text(doc.document_number.as_deref()));
    row.set("document_date", FlatValue::text(doc.document_date.as_deref()));
    row.set("document_type", FlatValue::text(doc.document_type.as_deref()));
    row.set(
        "total_amount",
        doc.total_amount.map_or(FlatValue::Null, FlatValue::Float),
    );
    row.set("store_name", FlatValue::text(doc.store_name.as_deref()));
    row.set("store_code", FlatValue::text(doc.store_code.as_deref()));
    row.set(
        "category",
        FlatValue::text(doc.category.as_ref().map(|c| c.as_str())),
    );
    row.set("counterparts", joined(&doc.counterpart_names, "; "));
    row.set("keywords", joined(&doc.keywords, ", "));
    row.set("line_item_count", FlatValue::count(doc.line_items.len()));
    row.set("field_count", FlatValue::count(doc.field_count()));
    row.set("blob_count", FlatValue::count(doc.blob_count()));
    row.set("blobs_total", FlatValue::count(doc.stats.total));
    row.set("blobs_successful", FlatValue::count(doc.stats.successful));
    row.set("blobs_failed", FlatValue::count(doc.stats.failed));

    for (name, value) in &doc.fields {
        let cell = match value {
            serde_json::Value::Null => FlatValue::Null,
            serde_json::Value::String(s) => FlatValue::Text(s.clone()),
            other => FlatValue::Text(other.to_string()),
        };
        let column = row.dynamic_name("field", name);
        row.set(column, cell);
    }
    for (name, blob) in &doc.blobs {
        let column = row.dynamic_name("blob", name);
        row.set(column, FlatValue::text(blob.content.as_deref()));
    }

    row
}

fn joined(items: &[String], separator: &str) -> FlatValue {
    if items.is_empty() {
        FlatValue::Null
    } else {
        FlatValue::Text(items.join(separator))
    }
}
