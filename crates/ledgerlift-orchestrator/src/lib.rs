//! Ledgerlift Orchestrator
//!
//! Drives an extraction run over one container and collects the result set.
//!
//! # Overview
//!
//! A run opens the container once, plans which tables to read and walks them
//! record by record:
//!
//! ```text
//! SELECT_TABLE -> ANALYZE -> ITERATE { READ -> CLASSIFY -> TAG -> APPEND } -> FLUSH
//! ```
//!
//! - **Planning**: allow-listed tables first, each capped at
//!   `critical_record_limit`, then a bounded number of tables discovered by
//!   name prefix, capped at `additional_record_limit`
//! - **Fault isolation**: unreadable records are logged and skipped; once
//!   the same read error recurs past `error_threshold` the current table is
//!   abandoned and the run moves on
//! - **Interruption**: an [`InterruptFlag`] is polled before every table and
//!   every record; an interrupted run still returns everything collected
//! - **Resources**: the container is dropped before the run returns, on every
//!   path
//!
//! Only a container that cannot be opened fails a run.
//!
//! # Usage
//!
//! ```no_run
//! use ledgerlift_extractor::ExtractorConfig;
//! use ledgerlift_orchestrator::{ExtractionOrchestrator, OrchestratorConfig, ResultSet};
//! use ledgerlift_reader::FixtureSource;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OrchestratorConfig {
//!     critical_tables: vec!["_Document163".to_string()],
//!     ..OrchestratorConfig::survey()
//! };
//! let mut orchestrator = ExtractionOrchestrator::new(config, ExtractorConfig::default())?;
//!
//! let results = orchestrator.run(&FixtureSource::new("container.json"))?;
//! results.save("out/results.json")?;
//!
//! let reloaded = ResultSet::load("out/results.json")?;
//! assert_eq!(reloaded.len(), results.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [orchestrator]
//! critical_tables = ["_Document163", "_Reference85"]
//! critical_record_limit = 50000
//! max_additional_tables = 20
//! additional_record_limit = 10000
//! error_threshold = 100
//! keyword_vocabularies = ["quality", "document_type", "domain"]
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod interrupt;
mod metrics;
mod orchestrator;
mod result_set;

pub use config::{OrchestratorConfig, DEFAULT_PREFIXES, TABLE_PART_MARKER};
pub use error::OrchestratorError;
pub use interrupt::InterruptFlag;
pub use metrics::{RunStatistics, TableSummary};
pub use orchestrator::{ExtractionOrchestrator, PlannedTable, ProgressEvent};
pub use result_set::{ResultSet, RunMetadata};
