//! Run-scoped result set and its JSON persistence

use crate::error::OrchestratorError;
use crate::metrics::RunStatistics;
use chrono::{DateTime, Utc};
use ledgerlift_domain::{Document, EntityKind};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Facts about one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Unique run identifier (UUIDv7, time-ordered)
    pub run_id: Uuid,
    /// Description of the container source
    pub container: String,
    /// Run start
    pub started_at: DateTime<Utc>,
    /// Run end, unset while the run is in progress
    pub finished_at: Option<DateTime<Utc>>,
    /// Whether the run stopped on an interruption
    pub interrupted: bool,
    /// Documents from document tables
    pub documents: usize,
    /// Documents from reference tables
    pub references: usize,
    /// Documents from register tables
    pub registers: usize,
    /// Records turned into documents
    pub successful_records: usize,
    /// Records that failed to read
    pub failed_records: usize,
}

impl RunMetadata {
    /// Metadata for a run that is starting now
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            container: container.into(),
            started_at: Utc::now(),
            finished_at: None,
            interrupted: false,
            documents: 0,
            references: 0,
            registers: 0,
            successful_records: 0,
            failed_records: 0,
        }
    }
}

/// Every document of a run, grouped by entity kind, plus run metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Run metadata
    pub metadata: RunMetadata,
    /// Documents from `_DOCUMENT` tables
    pub documents: Vec<Document>,
    /// Documents from `_REFERENCE` tables
    pub references: Vec<Document>,
    /// Documents from register tables
    pub registers: Vec<Document>,
    /// Run statistics
    pub statistics: RunStatistics,
}

impl ResultSet {
    /// Empty result set
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            metadata,
            documents: Vec::new(),
            references: Vec::new(),
            registers: Vec::new(),
            statistics: RunStatistics::new(),
        }
    }

    /// Append a document to the list of its entity kind
    pub fn push(&mut self, doc: Document) {
        match EntityKind::from_table_name(&doc.table_name) {
            EntityKind::Documents => self.documents.push(doc),
            EntityKind::References => self.references.push(doc),
            EntityKind::Registers => self.registers.push(doc),
        }
    }

    /// Documents of one entity kind
    pub fn entities(&self, kind: EntityKind) -> &[Document] {
        match kind {
            EntityKind::Documents => &self.documents,
            EntityKind::References => &self.references,
            EntityKind::Registers => &self.registers,
        }
    }

    /// All documents in entity-kind order
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents
            .iter()
            .chain(&self.references)
            .chain(&self.registers)
    }

    /// Number of documents of every kind
    pub fn len(&self) -> usize {
        self.documents.len() + self.references.len() + self.registers.len()
    }

    /// Whether no document was produced
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close the run: stamp the end time and the tallies
    pub fn finish(&mut self, interrupted: bool) {
        self.metadata.finished_at = Some(Utc::now());
        self.metadata.interrupted = interrupted;
        self.metadata.documents = self.documents.len();
        self.metadata.references = self.references.len();
        self.metadata.registers = self.registers.len();
        self.metadata.successful_records = self.len();
        self.metadata.failed_records = self.statistics.records_failed;
    }

    /// Write as pretty JSON, replacing any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), OrchestratorError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;

        info!(path = %path.display(), documents = self.len(), "Saved result set");
        Ok(())
    }

    /// Read a result set written by [`ResultSet::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OrchestratorError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_routes_by_entity_kind() {
        let mut set = ResultSet::new(RunMetadata::new("memory"));
        set.push(Document::new("_Document12", 0));
        set.push(Document::new("_Reference5", 0));
        set.push(Document::new("_AccumRg40", 0));
        set.push(Document::new("_InfoRg41", 1));

        assert_eq!(set.documents.len(), 1);
        assert_eq!(set.references.len(), 1);
        assert_eq!(set.entities(EntityKind::Registers).len(), 2);
        assert_eq!(set.len(), 4);
        assert_eq!(set.iter().last().map(|d| d.row_index), Some(1));
    }

    #[test]
    fn test_finish_stamps_tallies() {
        let mut set = ResultSet::new(RunMetadata::new("memory"));
        set.push(Document::new("_Document12", 0));
        set.statistics.records_failed = 3;
        set.finish(true);

        assert!(set.metadata.finished_at.is_some());
        assert!(set.metadata.interrupted);
        assert_eq!(set.metadata.documents, 1);
        assert_eq!(set.metadata.successful_records, 1);
        assert_eq!(set.metadata.failed_records, 3);
    }
}
