//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use ledgerlift_domain::{MatchKind, TableAnalysis};
use ledgerlift_extractor::Complexity;
use ledgerlift_orchestrator::RunStatistics;
use ledgerlift_store::{ConversionReport, QuerySummary};
use serde::Serialize;
use std::time::Duration;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// One analyzed table with its processing estimate.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRow {
    /// Scan result
    #[serde(flatten)]
    pub analysis: TableAnalysis,
    /// Cost class used for the estimate
    pub complexity: Complexity,
    /// Estimated processing time in milliseconds
    pub estimated_ms: u64,
}

impl AnalysisRow {
    /// Pair an analysis with its estimate.
    pub fn new(analysis: TableAnalysis, complexity: Complexity, estimate: Duration) -> Self {
        Self {
            analysis,
            complexity,
            estimated_ms: u64::try_from(estimate.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// One keyword hit found by the search command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Table the record came from
    pub table: String,
    /// Record index
    pub row: usize,
    /// Field holding the keyword
    pub field: String,
    /// Matched keyword
    pub keyword: String,
    /// Scalar or blob
    pub kind: MatchKind,
    /// Text around the hit
    pub excerpt: String,
}

/// Output formatter.
#[derive(Debug, Clone)]
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Whether machine-readable output was requested.
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Format ranked tables.
    pub fn format_analyses(&self, rows: &[AnalysisRow]) -> Result<String> {
        if self.is_json() {
            return Ok(serde_json::to_string_pretty(rows)?);
        }
        if rows.is_empty() {
            return Ok(self.colorize("No tables found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Table", "Records", "Priority", "Fields", "Gaps", "Complexity", "Estimate"]);

        for row in rows {
            let a = &row.analysis;
            builder.push_record([
                a.table_name.clone(),
                a.record_count.to_string(),
                a.priority.to_string(),
                a.field_types.len().to_string(),
                if a.has_empty_records { "yes" } else { "" }.to_string(),
                complexity_name(row.complexity).to_string(),
                format_millis(row.estimated_ms),
            ]);
        }

        Ok(self.render(builder))
    }

    /// Format the statistics of an extraction run.
    pub fn format_statistics(&self, stats: &RunStatistics) -> Result<String> {
        if self.is_json() {
            return Ok(serde_json::to_string_pretty(stats)?);
        }

        let mut lines = vec![
            format!(
                "Tables: {} processed of {} planned ({} aborted)",
                stats.tables_processed, stats.tables_planned, stats.tables_aborted
            ),
            format!(
                "Records: {} seen, {} empty, {} failed",
                stats.records_seen, stats.records_empty, stats.records_failed
            ),
            format!(
                "Documents: {} ({} tagged, {} line items)",
                stats.documents, stats.tagged_documents, stats.line_items
            ),
            format!(
                "Blobs: {} of {} decoded ({:.1}%)",
                stats.blobs_successful,
                stats.blobs_total,
                stats.blob_success_rate() * 100.0
            ),
        ];

        if !stats.tables.is_empty() {
            let mut builder = Builder::default();
            builder.push_record(["Table", "Priority", "Limit", "Seen", "Documents", "Failed", "Status", "Time"]);
            for table in &stats.tables {
                let status = if table.aborted {
                    self.colorize("aborted", "red")
                } else if table.interrupted {
                    self.colorize("interrupted", "yellow")
                } else {
                    self.colorize("done", "green")
                };
                builder.push_record([
                    table.table_name.clone(),
                    table.priority.to_string(),
                    table.record_limit.to_string(),
                    table.records_seen.to_string(),
                    table.documents.to_string(),
                    table.records_failed.to_string(),
                    status,
                    format_millis(table.duration_ms),
                ]);
            }
            lines.push(self.render(builder));
        }

        if !stats.error_messages.is_empty() {
            lines.push(self.colorize("Read errors:", "yellow"));
            for (message, count) in &stats.error_messages {
                lines.push(format!("  {}x {}", count, message));
            }
        }

        Ok(lines.join("\n"))
    }

    /// Format the outcome of a conversion.
    pub fn format_report(&self, report: &ConversionReport) -> Result<String> {
        if self.is_json() {
            return Ok(serde_json::to_string_pretty(report)?);
        }
        if report.artifacts.is_empty() {
            return Ok(self.colorize("Nothing to convert.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Kind", "File", "Rows", "Columns"]);
        for artifact in &report.artifacts {
            builder.push_record([
                artifact.kind.to_string(),
                artifact.path.display().to_string(),
                artifact.rows.to_string(),
                artifact.columns.to_string(),
            ]);
        }

        let mut sections = vec![
            self.render(builder),
            format!("Database: {}", report.database.display()),
        ];
        for summary in &report.summaries {
            sections.push(self.format_summary(summary));
        }
        Ok(sections.join("\n\n"))
    }

    /// Format keyword hits.
    pub fn format_hits(&self, hits: &[SearchHit]) -> Result<String> {
        if self.is_json() {
            return Ok(serde_json::to_string_pretty(hits)?);
        }
        if hits.is_empty() {
            return Ok(self.colorize("No matches found.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Table", "Row", "Field", "Keyword", "Kind", "Excerpt"]);
        for hit in hits {
            builder.push_record([
                hit.table.clone(),
                hit.row.to_string(),
                hit.field.clone(),
                self.colorize(&hit.keyword, "cyan"),
                hit.kind.as_str().to_string(),
                hit.excerpt.replace('\n', " "),
            ]);
        }
        Ok(self.render(builder))
    }

    fn format_summary(&self, summary: &QuerySummary) -> String {
        let title = self.colorize(&format!("{} ({})", summary.name, summary.table), "magenta");
        if summary.rows.is_empty() {
            return format!("{}\n  (no rows)", title);
        }

        let mut builder = Builder::default();
        builder.push_record(summary.columns.clone());
        for row in &summary.rows {
            builder.push_record(row.clone());
        }
        format!("{}\n{}", title, self.render(builder))
    }

    fn render(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

fn complexity_name(complexity: Complexity) -> &'static str {
    match complexity {
        Complexity::Simple => "simple",
        Complexity::Moderate => "moderate",
        Complexity::Complex => "complex",
    }
}

/// Render milliseconds as `850ms`, `12.5s` or `3m 20s`.
pub fn format_millis(ms: u64) -> String {
    match ms {
        0..=999 => format!("{}ms", ms),
        1_000..=59_999 => format!("{:.1}s", ms as f64 / 1000.0),
        _ => format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlift_domain::{FieldKind, Priority};
    use ledgerlift_orchestrator::TableSummary;
    use std::collections::BTreeMap;

    fn analysis_row() -> AnalysisRow {
        let mut field_types = BTreeMap::new();
        field_types.insert("_NUMBER".to_string(), FieldKind::Text);
        let analysis = TableAnalysis {
            table_name: "_Document163".into(),
            record_count: 12_000,
            field_types,
            sample_records: Vec::new(),
            has_empty_records: true,
            priority: Priority::High,
        };
        AnalysisRow::new(analysis, Complexity::Simple, Duration::from_millis(6_000))
    }

    fn statistics() -> RunStatistics {
        let mut stats = RunStatistics::new();
        stats.tables_planned = 1;
        let mut summary = TableSummary::new("_Document163", Priority::Critical, 10, 10);
        summary.records_seen = 10;
        summary.documents = 9;
        summary.records_failed = 1;
        summary.aborted = true;
        stats.record_table(summary);
        stats.record_error("Corrupt record: bad page");
        stats
    }

    #[test]
    fn test_analysis_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_analyses(&[analysis_row()]).unwrap();
        assert!(output.contains("_Document163"));
        assert!(output.contains("HIGH"));
        assert!(output.contains("6.0s"));
    }

    #[test]
    fn test_analysis_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_analyses(&[analysis_row()]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["table_name"], "_Document163");
        assert_eq!(parsed[0]["estimated_ms"], 6000);
        assert_eq!(parsed[0]["complexity"], "simple");
    }

    #[test]
    fn test_statistics_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_statistics(&statistics()).unwrap();
        assert!(output.contains("aborted"));
        assert!(output.contains("1x Corrupt record: bad page"));
    }

    #[test]
    fn test_empty_hits() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_hits(&[]).unwrap();
        assert!(output.contains("No matches found"));
    }

    #[test]
    fn test_hits_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let hit = SearchHit {
            table: "_Document1".into(),
            row: 3,
            field: "_FLD7".into(),
            keyword: "роз".into(),
            kind: MatchKind::Blob,
            excerpt: "красные\nрозы".into(),
        };
        let output = formatter.format_hits(&[hit]).unwrap();
        assert!(output.contains("красные розы"));
        assert!(output.contains("blob"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let msg = formatter.success("test");
        assert_eq!(msg, "✓ test");
    }

    #[test]
    fn test_format_millis() {
        assert_eq!(format_millis(850), "850ms");
        assert_eq!(format_millis(12_500), "12.5s");
        assert_eq!(format_millis(200_000), "3m 20s");
    }
}
