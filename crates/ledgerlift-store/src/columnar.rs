//! Arrow record batches and parquet files

use crate::error::StoreError;
use crate::flatten::{ColumnType, FlatRow, BASE_COLUMNS};
use arrow::array::{ArrayRef, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Column layout shared by all rows of one entity kind
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    columns: Vec<(String, ColumnType)>,
}

impl TableLayout {
    /// Base columns followed by every dynamic column seen in `rows`, sorted
    pub fn from_rows(rows: &[FlatRow]) -> Self {
        let dynamic: BTreeSet<&str> = rows.iter().flat_map(FlatRow::dynamic_columns).collect();

        let columns = BASE_COLUMNS
            .iter()
            .map(|(name, ty)| (name.to_string(), *ty))
            .chain(dynamic.into_iter().map(|name| (name.to_string(), ColumnType::Text)))
            .collect();
        Self { columns }
    }

    /// Columns in output order
    pub fn columns(&self) -> &[(String, ColumnType)] {
        &self.columns
    }

    /// Arrow schema; every column is nullable
    pub fn schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|(name, ty)| {
                let data_type = match ty {
                    ColumnType::Text => DataType::Utf8,
                    ColumnType::Int => DataType::Int64,
                    ColumnType::Float => DataType::Float64,
                };
                Field::new(name, data_type, true)
            })
            .collect();
        Arc::new(Schema::new(fields))
    }
}

/// Build one record batch from a slice of rows
pub fn to_record_batch(layout: &TableLayout, rows: &[FlatRow]) -> Result<RecordBatch, StoreError> {
    let arrays: Vec<ArrayRef> = layout
        .columns()
        .iter()
        .map(|(name, ty)| column_array(name, *ty, rows))
        .collect();

    Ok(RecordBatch::try_new(layout.schema(), arrays)?)
}

fn column_array(name: &str, ty: ColumnType, rows: &[FlatRow]) -> ArrayRef {
    match ty {
        ColumnType::Text => {
            let mut builder = StringBuilder::new();
            for row in rows {
                builder.append_option(row.get(name).as_text());
            }
            Arc::new(builder.finish())
        }
        ColumnType::Int => {
            let mut builder = Int64Builder::with_capacity(rows.len());
            for row in rows {
                builder.append_option(row.get(name).as_int());
            }
            Arc::new(builder.finish())
        }
        ColumnType::Float => {
            let mut builder = Float64Builder::with_capacity(rows.len());
            for row in rows {
                builder.append_option(row.get(name).as_float());
            }
            Arc::new(builder.finish())
        }
    }
}

/// Write rows to a parquet file, replacing any existing file
///
/// Returns the number of rows written.
pub fn write_parquet(
    path: &Path,
    layout: &TableLayout,
    rows: &[FlatRow],
    compression: Compression,
    batch_size: usize,
) -> Result<usize, StoreError> {
    let props = WriterProperties::builder()
        .set_compression(compression)
        .build();
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, layout.schema(), Some(props))?;

    for chunk in rows.chunks(batch_size.max(1)) {
        let batch = to_record_batch(layout, chunk)?;
        writer.write(&batch)?;
        debug!(path = %path.display(), rows = chunk.len(), "Wrote record batch");
    }
    writer.close()?;

    Ok(rows.len())
}
