//! Run statistics

use ledgerlift_domain::{Document, Priority};
use ledgerlift_extractor::BlobCounters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of processing one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Table name
    pub table_name: String,
    /// Priority the table was planned with
    pub priority: Priority,
    /// Slots in the table
    pub record_count: usize,
    /// Slots the record cap allowed
    pub record_limit: usize,
    /// Slots visited
    pub records_seen: usize,
    /// Tombstones skipped
    pub records_empty: usize,
    /// Slots that failed to read
    pub records_failed: usize,
    /// Documents produced
    pub documents: usize,
    /// Table-part tables linked to this table
    pub table_parts: usize,
    /// Stopped by the circuit breaker
    pub aborted: bool,
    /// Stopped by an interruption
    pub interrupted: bool,
    /// Wall time in milliseconds
    pub duration_ms: u64,
}

impl TableSummary {
    /// Empty summary for a table about to be processed
    pub fn new(
        table_name: impl Into<String>,
        priority: Priority,
        record_count: usize,
        record_limit: usize,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            priority,
            record_count,
            record_limit,
            records_seen: 0,
            records_empty: 0,
            records_failed: 0,
            documents: 0,
            table_parts: 0,
            aborted: false,
            interrupted: false,
            duration_ms: 0,
        }
    }

    /// Whether every capped slot was visited
    pub fn is_complete(&self) -> bool {
        !self.aborted && !self.interrupted && self.records_seen == self.record_limit
    }
}

/// Counters collected over a whole run
///
/// Known categories are named fields; only raw error messages, which are
/// unbounded, live in a keyed map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Tables in the plan
    pub tables_planned: usize,
    /// Tables that were started
    pub tables_processed: usize,
    /// Tables stopped by the circuit breaker
    pub tables_aborted: usize,
    /// Record slots visited
    pub records_seen: usize,
    /// Tombstones skipped
    pub records_empty: usize,
    /// Record slots that failed to read
    pub records_failed: usize,
    /// Documents produced
    pub documents: usize,
    /// Documents with at least one keyword
    pub tagged_documents: usize,
    /// Line items attached to documents
    pub line_items: usize,
    /// Blob fields visited
    pub blobs_total: usize,
    /// Blob fields with content
    pub blobs_successful: usize,
    /// Blob fields where every strategy failed
    pub blobs_failed: usize,
    /// Scalar fields whose classification failed
    pub field_errors: usize,
    /// Winning strategies and decodings
    pub blob_methods: BlobCounters,
    /// Occurrences of each record read error message
    pub error_messages: BTreeMap<String, usize>,
    /// Per-table outcomes in processing order
    pub tables: Vec<TableSummary>,
}

impl RunStatistics {
    /// Create new empty statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one document into the totals
    pub fn record_document(&mut self, doc: &Document) {
        self.documents += 1;
        if !doc.keywords.is_empty() {
            self.tagged_documents += 1;
        }
        self.line_items += doc.line_items.len();
        self.blobs_total += doc.stats.total;
        self.blobs_successful += doc.stats.successful;
        self.blobs_failed += doc.stats.failed;
        self.field_errors += doc.stats.field_errors;
        for blob in doc.blobs.values() {
            self.blob_methods.record(&blob.methods);
        }
    }

    /// Count one record read error
    pub fn record_error(&mut self, message: &str) {
        *self.error_messages.entry(message.to_string()).or_insert(0) += 1;
    }

    /// Fold a finished table into the totals
    pub fn record_table(&mut self, summary: TableSummary) {
        self.tables_processed += 1;
        if summary.aborted {
            self.tables_aborted += 1;
        }
        self.records_seen += summary.records_seen;
        self.records_empty += summary.records_empty;
        self.records_failed += summary.records_failed;
        self.tables.push(summary);
    }

    /// Share of blob fields that produced content
    pub fn blob_success_rate(&self) -> f64 {
        if self.blobs_total == 0 {
            0.0
        } else {
            self.blobs_successful as f64 / self.blobs_total as f64
        }
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Extraction Summary".to_string(),
            "==================".to_string(),
            format!(
                "Tables: {} processed of {} planned ({} aborted)",
                self.tables_processed, self.tables_planned, self.tables_aborted
            ),
            format!(
                "Records: {} seen, {} empty, {} failed",
                self.records_seen, self.records_empty, self.records_failed
            ),
            format!(
                "Documents: {} ({} tagged, {} line items)",
                self.documents, self.tagged_documents, self.line_items
            ),
            format!(
                "Blobs: {} total, {} successful, {} failed ({:.1}%)",
                self.blobs_total,
                self.blobs_successful,
                self.blobs_failed,
                self.blob_success_rate() * 100.0
            ),
            format!("Field errors: {}", self.field_errors),
            String::new(),
        ];

        if !self.tables.is_empty() {
            lines.push("Per table:".to_string());
            for table in &self.tables {
                let status = if table.aborted {
                    " [aborted]"
                } else if table.interrupted {
                    " [interrupted]"
                } else {
                    ""
                };
                lines.push(format!(
                    "  {} ({}): {} documents, {} failed{}",
                    table.table_name, table.priority, table.documents, table.records_failed, status
                ));
            }
            lines.push(String::new());
        }

        if !self.error_messages.is_empty() {
            lines.push("Errors:".to_string());
            for (message, count) in &self.error_messages {
                lines.push(format!("  {}x {}", count, message));
            }
        }

        lines.join("\n")
    }
}
