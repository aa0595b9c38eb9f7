//! Table sampling and prioritization

use ledgerlift_domain::{Container, FieldKind, Priority, Table, TableAnalysis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Record count from which a table is critical regardless of name
pub const CRITICAL_THRESHOLD: usize = 100_000;
/// Record count from which a table has high priority
pub const HIGH_THRESHOLD: usize = 10_000;
/// Record count from which a table has medium priority
pub const MEDIUM_THRESHOLD: usize = 1_000;

/// Per-record processing cost class, used for time estimates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    /// Few scalar fields
    Simple,
    /// Many fields or some blobs
    Moderate,
    /// Blob-heavy records with table parts
    Complex,
}

impl Complexity {
    /// Estimated cost of one record
    pub fn per_record(&self) -> Duration {
        match self {
            Complexity::Simple => Duration::from_micros(500),
            Complexity::Moderate => Duration::from_millis(2),
            Complexity::Complex => Duration::from_millis(5),
        }
    }

    /// Guess the class from an analysis
    pub fn from_analysis(analysis: &TableAnalysis) -> Self {
        let blobs = analysis
            .field_types
            .values()
            .filter(|kind| **kind == FieldKind::Blob)
            .count();
        match (blobs, analysis.field_types.len()) {
            (0, n) if n <= 20 => Complexity::Simple,
            (b, _) if b <= 2 => Complexity::Moderate,
            _ => Complexity::Complex,
        }
    }
}

/// Samples tables and assigns processing priority
#[derive(Debug, Clone)]
pub struct TableStructureAnalyzer {
    sample_size: usize,
    critical_tables: Vec<String>,
}

impl TableStructureAnalyzer {
    /// Create an analyzer sampling at most `sample_size` slots per table
    pub fn new(sample_size: usize) -> Self {
        Self {
            sample_size,
            critical_tables: Vec::new(),
        }
    }

    /// Tables that are always critical, whatever their size
    pub fn with_critical_tables<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.critical_tables = names.into_iter().map(Into::into).collect();
        self
    }

    /// Scan the first slots of a table
    ///
    /// Field kinds are taken from the first record that carries the field;
    /// later records never change them.
    pub fn analyze(&self, table: &dyn Table) -> TableAnalysis {
        let record_count = table.len();
        let mut field_types = BTreeMap::new();
        let mut sample_records = Vec::new();
        let mut has_empty_records = false;

        for index in 0..record_count.min(self.sample_size) {
            let record = match table.record(index) {
                Ok(record) => record,
                Err(e) => {
                    warn!(table = %table.name(), index, error = %e, "Skipping unreadable sample record");
                    continue;
                }
            };
            if record.is_empty() {
                has_empty_records = true;
                continue;
            }

            let mut sample = BTreeMap::new();
            for (name, value) in &record.fields {
                field_types.entry(name.clone()).or_insert_with(|| value.kind());
                let json = match value.as_scalar() {
                    Some(scalar) => scalar.to_json(),
                    None => serde_json::Value::String("<blob>".to_string()),
                };
                sample.insert(name.clone(), json);
            }
            sample_records.push(sample);
        }

        let priority = self.priority(table.name(), record_count);
        debug!(
            table = %table.name(),
            record_count,
            fields = field_types.len(),
            priority = %priority,
            "Analyzed table"
        );

        TableAnalysis {
            table_name: table.name().to_string(),
            record_count,
            field_types,
            sample_records,
            has_empty_records,
            priority,
        }
    }

    /// Priority class of a table
    pub fn priority(&self, name: &str, record_count: usize) -> Priority {
        if record_count == 0 {
            return Priority::Low;
        }
        if self
            .critical_tables
            .iter()
            .any(|critical| critical.eq_ignore_ascii_case(name))
        {
            return Priority::Critical;
        }
        match record_count {
            n if n >= CRITICAL_THRESHOLD => Priority::Critical,
            n if n >= HIGH_THRESHOLD => Priority::High,
            n if n >= MEDIUM_THRESHOLD => Priority::Medium,
            _ => Priority::Low,
        }
    }

    /// Linear processing time estimate, for operator planning only
    pub fn estimate_time(&self, record_count: usize, complexity: Complexity) -> Duration {
        let count = u32::try_from(record_count).unwrap_or(u32::MAX);
        complexity.per_record().saturating_mul(count)
    }

    /// Analyze every table of a container, most important first
    pub fn rank(&self, container: &dyn Container) -> Vec<TableAnalysis> {
        let mut analyses: Vec<TableAnalysis> = container
            .table_names()
            .iter()
            .filter_map(|name| container.table(name))
            .map(|table| self.analyze(table))
            .collect();

        analyses.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(b.record_count.cmp(&a.record_count))
                .then_with(|| a.table_name.cmp(&b.table_name))
        });
        analyses
    }
}

impl Default for TableStructureAnalyzer {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_thresholds() {
        let analyzer = TableStructureAnalyzer::default();
        assert_eq!(analyzer.priority("_DOCUMENT1", 0), Priority::Low);
        assert_eq!(analyzer.priority("_DOCUMENT1", 999), Priority::Low);
        assert_eq!(analyzer.priority("_DOCUMENT1", 1_000), Priority::Medium);
        assert_eq!(analyzer.priority("_DOCUMENT1", 10_000), Priority::High);
        assert_eq!(analyzer.priority("_DOCUMENT1", 100_000), Priority::Critical);
    }

    #[test]
    fn test_allow_list_is_critical_unless_empty() {
        let analyzer = TableStructureAnalyzer::default().with_critical_tables(["_Document163"]);
        assert_eq!(analyzer.priority("_DOCUMENT163", 5), Priority::Critical);
        assert_eq!(analyzer.priority("_DOCUMENT163", 0), Priority::Low);
    }

    #[test]
    fn test_estimate_time_is_linear() {
        let analyzer = TableStructureAnalyzer::default();
        assert_eq!(
            analyzer.estimate_time(1_000, Complexity::Simple),
            Duration::from_millis(500)
        );
        assert_eq!(
            analyzer.estimate_time(1_000, Complexity::Complex),
            Duration::from_secs(5)
        );
        assert_eq!(analyzer.estimate_time(0, Complexity::Moderate), Duration::ZERO);
    }
}
