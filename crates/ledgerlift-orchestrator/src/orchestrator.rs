//! Table and record iteration

use crate::config::OrchestratorConfig;
use crate::error::OrchestratorError;
use crate::interrupt::InterruptFlag;
use crate::metrics::TableSummary;
use crate::result_set::{ResultSet, RunMetadata};
use ledgerlift_domain::{Container, ContainerSource, Priority, ReaderError, Table};
use ledgerlift_extractor::{
    DocumentStructureAnalyzer, ExtractorConfig, KeywordClassifier, KeywordSet, TablePartIndex,
    TableStructureAnalyzer,
};
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// A table selected for processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTable {
    /// Table name as the container reports it
    pub table_name: String,
    /// Slots in the table
    pub record_count: usize,
    /// Maximum slots to visit
    pub record_limit: usize,
    /// Planning priority
    pub priority: Priority,
    /// Whether the table came from the allow-list
    pub critical: bool,
}

/// Progress notifications sent during a run
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// The table plan is ready
    Planned {
        /// Tables in the plan
        tables: usize,
    },
    /// A table is about to be iterated
    TableStarted {
        /// Table name
        table: String,
        /// Slots that will be visited at most
        record_limit: usize,
    },
    /// Periodic record progress within a table
    Records {
        /// Table name
        table: String,
        /// Slots visited so far
        seen: usize,
        /// Documents produced so far in this table
        documents: usize,
    },
    /// A table is done
    TableFinished(TableSummary),
}

type ProgressCallback = Box<dyn FnMut(&ProgressEvent) + Send>;

/// Drives a run over one container
///
/// Owns its analyzers; nothing is shared between orchestrators.
///
/// # Examples
///
/// ```no_run
/// use ledgerlift_extractor::ExtractorConfig;
/// use ledgerlift_orchestrator::{ExtractionOrchestrator, OrchestratorConfig};
/// use ledgerlift_reader::FixtureSource;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = FixtureSource::new("container.json");
/// let mut orchestrator =
///     ExtractionOrchestrator::new(OrchestratorConfig::default(), ExtractorConfig::default())?;
///
/// let results = orchestrator.run(&source)?;
/// results.save("results.json")?;
/// println!("{}", results.statistics.summary());
/// # Ok(())
/// # }
/// ```
pub struct ExtractionOrchestrator {
    config: OrchestratorConfig,
    tables: TableStructureAnalyzer,
    documents: DocumentStructureAnalyzer,
    keywords: KeywordClassifier,
    keyword_set: Option<KeywordSet>,
    table_part_row_cap: usize,
    interrupt: InterruptFlag,
    progress: Option<ProgressCallback>,
}

impl ExtractionOrchestrator {
    /// Create an orchestrator with freshly built analyzers
    pub fn new(
        config: OrchestratorConfig,
        extractor: ExtractorConfig,
    ) -> Result<Self, OrchestratorError> {
        config.validate().map_err(OrchestratorError::Config)?;
        let documents = DocumentStructureAnalyzer::new(extractor.clone())
            .map_err(|e| OrchestratorError::Config(e.to_string()))?;

        Ok(Self {
            tables: TableStructureAnalyzer::new(extractor.sample_size)
                .with_critical_tables(config.critical_tables.clone()),
            keywords: KeywordClassifier::new(extractor.clone()),
            keyword_set: config.keyword_set(),
            table_part_row_cap: extractor.table_part_row_cap,
            documents,
            config,
            interrupt: InterruptFlag::new(),
            progress: None,
        })
    }

    /// Poll this flag instead of a private one
    pub fn with_interrupt(mut self, flag: InterruptFlag) -> Self {
        self.interrupt = flag;
        self
    }

    /// Receive progress events
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ProgressEvent) + Send + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Flag polled at record and table boundaries
    pub fn interrupt_flag(&self) -> InterruptFlag {
        self.interrupt.clone()
    }

    /// Current configuration
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run over every planned table of the container
    ///
    /// Only a failure to open the container is returned as an error. Record
    /// and field failures are counted in the statistics, and an interruption
    /// returns whatever was collected so far with `metadata.interrupted` set.
    pub fn run(&mut self, source: &dyn ContainerSource) -> Result<ResultSet, OrchestratorError> {
        let description = source.describe();
        info!(container = %description, "Opening container");

        let container = source.open().map_err(|e| {
            error!(container = %description, error = %e, "Failed to open container");
            OrchestratorError::Open(e)
        })?;

        let mut results = ResultSet::new(RunMetadata::new(description));
        let plan = self.plan(container.as_ref());
        results.statistics.tables_planned = plan.len();
        info!(tables = plan.len(), "Table plan ready");
        self.emit(ProgressEvent::Planned { tables: plan.len() });

        let mut interrupted = false;
        for entry in &plan {
            if self.interrupt.is_interrupted() {
                interrupted = true;
                break;
            }
            let Some(table) = container.table(&entry.table_name) else {
                warn!(table = %entry.table_name, "Planned table disappeared");
                continue;
            };

            let summary = self.process_table(container.as_ref(), table, entry, &mut results);
            interrupted = summary.interrupted;
            results.statistics.record_table(summary.clone());
            self.emit(ProgressEvent::TableFinished(summary));
            if interrupted {
                break;
            }
        }

        drop(container);
        if interrupted {
            info!(documents = results.len(), "Run interrupted, keeping collected documents");
        }
        results.finish(interrupted);
        info!("\n{}", results.statistics.summary());
        Ok(results)
    }

    /// Order in which tables are processed
    ///
    /// Allow-listed tables present in the container come first, in list
    /// order. Then up to `max_additional_tables` discovered tables, most
    /// important first.
    pub fn plan(&self, container: &dyn Container) -> Vec<PlannedTable> {
        let names = container.table_names();
        let mut planned = Vec::new();
        let mut taken = HashSet::new();

        for critical in &self.config.critical_tables {
            let Some(name) = names.iter().find(|n| n.eq_ignore_ascii_case(critical)) else {
                debug!(table = %critical, "Allow-listed table not in container");
                continue;
            };
            let Some(table) = container.table(name) else {
                continue;
            };
            if taken.insert(name.to_ascii_uppercase()) {
                planned.push(PlannedTable {
                    table_name: name.clone(),
                    record_count: table.len(),
                    record_limit: self.config.critical_record_limit,
                    priority: Priority::Critical,
                    critical: true,
                });
            }
        }

        let mut discovered: Vec<PlannedTable> = names
            .iter()
            .filter(|name| self.config.is_discoverable(name))
            .filter(|name| !taken.contains(&name.to_ascii_uppercase()))
            .filter_map(|name| container.table(name))
            .filter(|table| !table.is_empty())
            .map(|table| PlannedTable {
                table_name: table.name().to_string(),
                record_count: table.len(),
                record_limit: self.config.additional_record_limit,
                priority: self.tables.priority(table.name(), table.len()),
                critical: false,
            })
            .collect();

        discovered.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(b.record_count.cmp(&a.record_count))
                .then_with(|| a.table_name.cmp(&b.table_name))
        });
        discovered.truncate(self.config.max_additional_tables);

        planned.extend(discovered);
        planned
    }

    /// Analyze a table, then read, classify and tag its records
    fn process_table(
        &mut self,
        container: &dyn Container,
        table: &dyn Table,
        entry: &PlannedTable,
        results: &mut ResultSet,
    ) -> TableSummary {
        let started = Instant::now();
        let name = table.name().to_string();
        let analysis = self.tables.analyze(table);
        let limit = table.len().min(entry.record_limit);
        let mut summary = TableSummary::new(&name, entry.priority, table.len(), limit);

        let parts = if self.config.table_parts {
            let interrupt = self.interrupt.clone();
            TablePartIndex::build_until(container, &name, self.table_part_row_cap, || {
                interrupt.is_interrupted()
            })
        } else {
            TablePartIndex::default()
        };
        summary.table_parts = parts.tables().len();

        info!(
            table = %name,
            records = analysis.record_count,
            fields = analysis.field_types.len(),
            limit,
            priority = %entry.priority,
            "Processing table"
        );
        self.emit(ProgressEvent::TableStarted {
            table: name.clone(),
            record_limit: limit,
        });

        let mut errors: HashMap<String, usize> = HashMap::new();
        for index in 0..limit {
            if self.interrupt.is_interrupted() {
                info!(table = %name, index, "Interrupted");
                summary.interrupted = true;
                break;
            }
            summary.records_seen += 1;

            let record = match table.record(index) {
                Ok(record) => record,
                Err(e) => {
                    summary.records_failed += 1;
                    warn!(table = %name, index, error = %e, "Skipping unreadable record");

                    let key = error_key(&e);
                    results.statistics.record_error(&key);
                    let count = errors.entry(key).or_insert(0);
                    *count += 1;
                    if *count > self.config.error_threshold {
                        warn!(
                            table = %name,
                            occurrences = *count,
                            error = %e,
                            "Repeated error, aborting table"
                        );
                        summary.aborted = true;
                        break;
                    }
                    continue;
                }
            };

            if record.is_empty() {
                summary.records_empty += 1;
                continue;
            }

            let mut doc = self
                .documents
                .classify_with_parts(&record, &name, index, &parts);
            if let Some(set) = &self.keyword_set {
                let hits = self.keywords.search(&record, set);
                doc = doc.with_keywords(hits.found);
            }
            debug!(
                table = %name,
                index,
                number = doc.document_number.as_deref().unwrap_or(""),
                "Classified record"
            );

            results.statistics.record_document(&doc);
            results.push(doc);
            summary.documents += 1;

            if summary.records_seen % self.config.progress_interval == 0 {
                self.emit(ProgressEvent::Records {
                    table: name.clone(),
                    seen: summary.records_seen,
                    documents: summary.documents,
                });
            }
        }

        summary.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            table = %name,
            documents = summary.documents,
            failed = summary.records_failed,
            empty = summary.records_empty,
            aborted = summary.aborted,
            "Finished table"
        );
        summary
    }

    fn emit(&mut self, event: ProgressEvent) {
        if let Some(callback) = self.progress.as_mut() {
            callback(&event);
        }
    }
}

/// Circuit breaker key of a read error
///
/// Record positions are left out so that one recurring fault maps to one key.
fn error_key(error: &ReaderError) -> String {
    match error {
        ReaderError::CorruptRecord { reason, .. } => format!("Corrupt record: {}", reason),
        ReaderError::IndexOutOfRange { table, .. } => {
            format!("Record index out of range for table {}", table)
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_key_drops_record_position() {
        let first = ReaderError::CorruptRecord {
            table: "_DOCUMENT1".into(),
            index: 3,
            reason: "bad page".into(),
        };
        let second = ReaderError::CorruptRecord {
            table: "_DOCUMENT1".into(),
            index: 9,
            reason: "bad page".into(),
        };
        assert_eq!(error_key(&first), error_key(&second));
        assert_eq!(error_key(&first), "Corrupt record: bad page");
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = OrchestratorConfig {
            critical_record_limit: 0,
            ..OrchestratorConfig::default()
        };
        let result = ExtractionOrchestrator::new(config, ExtractorConfig::default());
        assert!(matches!(result, Err(OrchestratorError::Config(_))));
    }
}
