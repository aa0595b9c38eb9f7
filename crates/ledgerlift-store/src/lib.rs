//! Ledgerlift Storage Layer
//!
//! Turns an extraction result set into columnar artifacts and an embedded
//! analytical database.
//!
//! # Architecture
//!
//! - [`flatten`] projects each document onto a fixed base schema plus one
//!   text column per raw field (`field_<name>`) and blob (`blob_<name>`)
//! - Arrow record batches are written to one parquet file per entity kind
//!   (`documents.parquet`, `references.parquet`, `registers.parquet`)
//! - The same rows are loaded into SQLite (`analytics.db`): base columns in
//!   one table per kind, indexed on `table_name` and
//!   `(document_type, total_amount)`, and the dynamic cells as
//!   `(document_id, field, value)` rows in `<kind>_fields`
//! - A fixed set of summary queries is run and logged; results are returned
//!   in the [`ConversionReport`] and never stored
//!
//! # Examples
//!
//! ```no_run
//! use ledgerlift_orchestrator::ResultSet;
//! use ledgerlift_store::{StoreConfig, TabularConverter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let results = ResultSet::load("results.json")?;
//! let converter = TabularConverter::new(StoreConfig::in_dir("output"))?;
//!
//! let report = converter.convert(&results)?;
//! println!("{} rows in {} files", report.total_rows(), report.artifacts.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod analytics;
mod columnar;
mod config;
mod converter;
mod error;
mod flatten;

pub use analytics::{AnalyticsStore, QuerySummary};
pub use columnar::{to_record_batch, write_parquet, TableLayout};
pub use config::StoreConfig;
pub use converter::{Artifact, ConversionReport, TabularConverter};
pub use error::StoreError;
pub use flatten::{flatten, ColumnType, FlatRow, FlatValue, BASE_COLUMNS};
