//! Result set to artifacts

use crate::analytics::{AnalyticsStore, QuerySummary};
use crate::columnar::{write_parquet, TableLayout};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::flatten::{flatten, FlatRow};
use ledgerlift_domain::EntityKind;
use ledgerlift_orchestrator::ResultSet;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// One written parquet file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artifact {
    /// Entity kind stored in the file
    pub kind: EntityKind,
    /// File path
    pub path: PathBuf,
    /// Rows written
    pub rows: usize,
    /// Columns written
    pub columns: usize,
}

/// What a conversion produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionReport {
    /// Parquet files, one per non-empty entity kind
    pub artifacts: Vec<Artifact>,
    /// SQLite database path
    pub database: PathBuf,
    /// Summary query results, for operators only
    pub summaries: Vec<QuerySummary>,
}

impl ConversionReport {
    /// Rows written over all artifacts
    pub fn total_rows(&self) -> usize {
        self.artifacts.iter().map(|a| a.rows).sum()
    }
}

/// Flattens result sets into parquet files and an SQLite database
#[derive(Debug, Clone)]
pub struct TabularConverter {
    config: StoreConfig,
}

impl TabularConverter {
    /// Create a converter
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        config.validate().map_err(StoreError::Config)?;
        Ok(Self { config })
    }

    /// Current configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Write every artifact for a result set
    ///
    /// Entity kinds without documents get no parquet file and no table.
    /// Artifacts of an earlier conversion in the same directory are replaced.
    pub fn convert(&self, results: &ResultSet) -> Result<ConversionReport, StoreError> {
        let compression = self
            .config
            .parquet_compression()
            .map_err(StoreError::Config)?;
        std::fs::create_dir_all(&self.config.output_dir)?;

        let database = self.config.database_path();
        let mut store = AnalyticsStore::create(&database)?;
        let mut summaries = Vec::new();

        // Every table is loaded before the first parquet file is written
        let mut pending = Vec::new();
        for kind in EntityKind::ALL {
            let path = self
                .config
                .output_dir
                .join(format!("{}.parquet", kind.as_str()));
            let documents = results.entities(kind);
            if documents.is_empty() {
                if path.exists() {
                    std::fs::remove_file(&path)?;
                }
                continue;
            }

            let rows: Vec<FlatRow> = documents.iter().map(flatten).collect();
            store.load(kind.as_str(), &rows)?;
            for summary in store.summaries(kind.as_str(), self.config.top_types)? {
                info!("\n{}", summary.render());
                summaries.push(summary);
            }
            pending.push((kind, path, rows));
        }

        let mut artifacts = Vec::with_capacity(pending.len());
        for (kind, path, rows) in pending {
            let layout = TableLayout::from_rows(&rows);
            let written =
                write_parquet(&path, &layout, &rows, compression, self.config.batch_size)?;
            info!(
                kind = %kind,
                path = %path.display(),
                rows = written,
                columns = layout.columns().len(),
                "Wrote parquet artifact"
            );

            artifacts.push(Artifact {
                kind,
                path,
                rows: written,
                columns: layout.columns().len(),
            });
        }

        Ok(ConversionReport {
            artifacts,
            database,
            summaries,
        })
    }
}
