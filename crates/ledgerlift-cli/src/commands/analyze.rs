//! Analyze command implementation.

use crate::cli::AnalyzeArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::{AnalysisRow, Formatter};
use ledgerlift_domain::{Container, ContainerSource};
use ledgerlift_extractor::{Complexity, TableStructureAnalyzer};
use ledgerlift_reader::FixtureSource;
use std::time::Duration;

/// Execute the analyze command.
pub fn execute_analyze(args: AnalyzeArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let source = FixtureSource::new(args.container).with_config(config.reader.clone());
    let container = source.open()?;

    let mut rows = rank_tables(container.as_ref(), config);
    if let Some(top) = args.top {
        rows.truncate(top);
    }

    println!("{}", formatter.format_analyses(&rows)?);
    if !formatter.is_json() && !rows.is_empty() {
        let total: Duration = rows
            .iter()
            .map(|row| Duration::from_millis(row.estimated_ms))
            .sum();
        println!(
            "{}",
            formatter.info(&format!(
                "{} tables, estimated {:.1}s for a full pass",
                rows.len(),
                total.as_secs_f64()
            ))
        );
    }

    Ok(())
}

/// Analyze every table of a container, most important first.
pub fn rank_tables(container: &dyn Container, config: &Config) -> Vec<AnalysisRow> {
    let analyzer = TableStructureAnalyzer::new(config.extractor.sample_size)
        .with_critical_tables(config.orchestrator.critical_tables.clone());

    analyzer
        .rank(container)
        .into_iter()
        .map(|analysis| {
            let complexity = Complexity::from_analysis(&analysis);
            let estimate = analyzer.estimate_time(analysis.record_count, complexity);
            AnalysisRow::new(analysis, complexity, estimate)
        })
        .collect()
}
