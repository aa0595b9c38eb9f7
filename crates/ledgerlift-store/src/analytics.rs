//! SQLite analytical store
//!
//! One table per entity kind with the base columns of the parquet artifact,
//! a `<kind>_fields` companion holding raw field and blob cells as rows, two
//! indexes per entity table and a fixed set of summary queries. The summaries
//! are computed for operators and are not stored.

use crate::error::StoreError;
use crate::flatten::{FlatRow, FlatValue, BASE_COLUMNS};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Result of one summary query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySummary {
    /// Query name
    pub name: String,
    /// Table the query ran against
    pub table: String,
    /// Column labels
    pub columns: Vec<String>,
    /// Rows rendered as text, NULL as an empty string
    pub rows: Vec<Vec<String>>,
}

impl QuerySummary {
    /// Multi-line text rendering for logs
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("{} ({})", self.name, self.table),
            format!("  {}", self.columns.join(" | ")),
        ];
        for row in &self.rows {
            lines.push(format!("  {}", row.join(" | ")));
        }
        lines.join("\n")
    }
}

impl ToSql for FlatValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            FlatValue::Null => ToSqlOutput::Owned(Value::Null),
            FlatValue::Int(i) => ToSqlOutput::Owned(Value::Integer(*i)),
            FlatValue::Float(f) => ToSqlOutput::Owned(Value::Real(*f)),
            FlatValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
        })
    }
}

/// Embedded analytical database
pub struct AnalyticsStore {
    conn: Connection,
}

impl AnalyticsStore {
    /// Create a fresh database file, replacing any existing one
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    /// In-memory database (useful for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Create the tables for one entity kind, insert the rows and build the indexes
    ///
    /// The entity table holds the base columns keyed by `document_id`. Raw
    /// field and blob cells go to `<table>_fields` as `(document_id, field,
    /// value)` rows, so the column count stays fixed however many distinct
    /// field names the source tables carry.
    pub fn load(&mut self, table: &str, rows: &[FlatRow]) -> Result<usize, StoreError> {
        let fields_table = fields_table(table);
        let definitions: Vec<String> = std::iter::once("document_id INTEGER PRIMARY KEY".to_string())
            .chain(
                BASE_COLUMNS
                    .iter()
                    .map(|(name, ty)| format!("{} {}", quote(name), ty.sql_type())),
            )
            .collect();

        self.conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {fields};
             DROP TABLE IF EXISTS {t};
             CREATE TABLE {t} ({definitions});
             CREATE TABLE {fields} (
                 document_id INTEGER NOT NULL REFERENCES {t} (document_id),
                 field TEXT NOT NULL,
                 value TEXT NOT NULL
             );",
            t = quote(table),
            fields = quote(&fields_table),
            definitions = definitions.join(", "),
        ))?;

        let names: Vec<String> = BASE_COLUMNS.iter().map(|(name, _)| quote(name)).collect();
        let insert = format!(
            "INSERT INTO {} (document_id, {}) VALUES (?, {})",
            quote(table),
            names.join(", "),
            vec!["?"; BASE_COLUMNS.len()].join(", ")
        );
        let insert_field = format!(
            "INSERT INTO {} (document_id, field, value) VALUES (?1, ?2, ?3)",
            quote(&fields_table)
        );

        let mut cells = 0usize;
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&insert)?;
            let mut field_stmt = tx.prepare(&insert_field)?;
            for (id, row) in rows.iter().enumerate() {
                let id = i64::try_from(id).unwrap_or(i64::MAX);
                let base = BASE_COLUMNS.iter().map(|(name, _)| row.get(name));
                stmt.execute(params_from_iter(
                    std::iter::once(&FlatValue::Int(id)).chain(base),
                ))?;
                for (field, value) in row.dynamic_cells() {
                    if let Some(text) = value.as_text() {
                        field_stmt.execute(rusqlite::params![id, field, text])?;
                        cells += 1;
                    }
                }
            }
        }
        tx.commit()?;

        self.conn.execute_batch(&format!(
            "CREATE INDEX {idx_table} ON {t} (table_name);
             CREATE INDEX {idx_type} ON {t} (document_type, total_amount);
             CREATE INDEX {idx_field} ON {fields} (field, document_id);",
            idx_table = quote(&format!("idx_{}_table_name", table)),
            idx_type = quote(&format!("idx_{}_type_amount", table)),
            idx_field = quote(&format!("idx_{}_field", fields_table)),
            t = quote(table),
            fields = quote(&fields_table),
        ))?;

        info!(table, rows = rows.len(), cells, "Loaded analytical table");
        Ok(rows.len())
    }

    /// Run the summary queries against one loaded table
    pub fn summaries(&self, table: &str, top_types: usize) -> Result<Vec<QuerySummary>, StoreError> {
        let t = quote(table);
        let queries = [
            (
                "records_per_table",
                format!(
                    "SELECT table_name, COUNT(*) AS records FROM {t} \
                     GROUP BY table_name ORDER BY records DESC, table_name"
                ),
            ),
            (
                "blob_success_rate",
                format!(
                    "SELECT COALESCE(SUM(blobs_total), 0) AS total, \
                     COALESCE(SUM(blobs_successful), 0) AS successful, \
                     ROUND(100.0 * SUM(blobs_successful) / NULLIF(SUM(blobs_total), 0), 1) AS rate_pct \
                     FROM {t}"
                ),
            ),
            (
                "top_document_types",
                format!(
                    "SELECT document_type, COUNT(*) AS records, \
                     ROUND(SUM(total_amount), 2) AS amount FROM {t} \
                     WHERE document_type IS NOT NULL \
                     GROUP BY document_type ORDER BY records DESC, document_type LIMIT {top_types}"
                ),
            ),
        ];

        let mut out = Vec::with_capacity(queries.len());
        for (name, sql) in queries {
            let summary = self.query(name, table, &sql)?;
            debug!(query = name, table, rows = summary.rows.len(), "Ran summary query");
            out.push(summary);
        }
        Ok(out)
    }

    /// Number of rows in a table
    pub fn count(&self, table: &str) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", quote(table)), [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn query(&self, name: &str, table: &str, sql: &str) -> Result<QuerySummary, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(render))
                    .collect::<rusqlite::Result<Vec<String>>>()
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(QuerySummary {
            name: name.to_string(),
            table: table.to_string(),
            columns,
            rows,
        })
    }
}

fn render(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// Companion table holding the raw field and blob cells of `table`
fn fields_table(table: &str) -> String {
    format!("{}_fields", table)
}

/// SQLite identifier quoting
fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}
