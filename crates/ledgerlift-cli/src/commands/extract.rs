//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::{format_millis, Formatter};
use ledgerlift_domain::ContainerSource;
use ledgerlift_orchestrator::{ExtractionOrchestrator, InterruptFlag, ProgressEvent, ResultSet};
use ledgerlift_reader::FixtureSource;
use std::path::Path;

/// Execute the extract command.
pub fn execute_extract(
    args: ExtractArgs,
    mut config: Config,
    interrupt: &InterruptFlag,
    formatter: &Formatter,
) -> Result<()> {
    config.apply_plan(&args.plan)?;

    let source = FixtureSource::new(args.container).with_config(config.reader.clone());
    let results = extract(&source, &config, interrupt, formatter)?;
    save(&results, &args.output, formatter)
}

/// Run the orchestrator over one container and print its statistics.
pub fn extract(
    source: &dyn ContainerSource,
    config: &Config,
    interrupt: &InterruptFlag,
    formatter: &Formatter,
) -> Result<ResultSet> {
    let progress = formatter.clone();
    let mut orchestrator =
        ExtractionOrchestrator::new(config.orchestrator.clone(), config.extractor.clone())?
            .with_interrupt(interrupt.clone())
            .with_progress(move |event| report_progress(&progress, event));

    let results = orchestrator.run(source)?;

    println!("{}", formatter.format_statistics(&results.statistics)?);
    if results.metadata.interrupted {
        eprintln!(
            "{}",
            formatter.warning("Run interrupted; the result set holds what was collected")
        );
    }
    Ok(results)
}

/// Persist a result set and confirm it on stderr.
pub fn save(results: &ResultSet, path: &Path, formatter: &Formatter) -> Result<()> {
    results.save(path)?;
    eprintln!(
        "{}",
        formatter.success(&format!(
            "Saved {} records to {}",
            results.len(),
            path.display()
        ))
    );
    Ok(())
}

fn report_progress(formatter: &Formatter, event: &ProgressEvent) {
    if formatter.is_json() {
        return;
    }
    match event {
        ProgressEvent::Planned { tables } => {
            eprintln!("{}", formatter.info(&format!("{} tables planned", tables)));
        }
        ProgressEvent::TableStarted {
            table,
            record_limit,
        } => {
            eprintln!(
                "{}",
                formatter.info(&format!("{}: reading up to {} records", table, record_limit))
            );
        }
        ProgressEvent::Records { .. } => {}
        ProgressEvent::TableFinished(summary) => {
            let line = format!(
                "{}: {} documents from {} records in {}",
                summary.table_name,
                summary.documents,
                summary.records_seen,
                format_millis(summary.duration_ms)
            );
            if summary.aborted {
                eprintln!("{}", formatter.warning(&format!("{} (aborted)", line)));
            } else {
                eprintln!("{}", formatter.success(&line));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use ledgerlift_domain::ScalarValue;
    use ledgerlift_reader::{MemorySource, MemoryTable};

    fn source() -> MemorySource {
        MemorySource::new(vec![MemoryTable::new("_Document1")
            .with_row([("_NUMBER", ScalarValue::Text("0001".into()))])
            .with_tombstone()
            .with_row([("_NUMBER", ScalarValue::Text("0002".into()))])])
    }

    #[test]
    fn test_extract_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.json");
        let formatter = Formatter::new(OutputFormat::Json, false);

        let source = source();
        let results = extract(&source, &Config::default(), &InterruptFlag::new(), &formatter)
            .unwrap();
        save(&results, &path, &formatter).unwrap();

        assert_eq!(results.len(), 2);
        assert!(source.is_released());
        assert_eq!(ResultSet::load(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_interrupted_before_start() {
        let interrupt = InterruptFlag::new();
        interrupt.interrupt();
        let formatter = Formatter::new(OutputFormat::Json, false);

        let results = extract(&source(), &Config::default(), &interrupt, &formatter).unwrap();
        assert!(results.is_empty());
        assert!(results.metadata.interrupted);
    }

    #[test]
    fn test_open_failure_is_reported() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let source = MemorySource::failing("disk gone");
        assert!(extract(&source, &Config::default(), &InterruptFlag::new(), &formatter).is_err());
    }
}
