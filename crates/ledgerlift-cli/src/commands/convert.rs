//! Convert command implementation.

use crate::cli::ConvertArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use ledgerlift_orchestrator::ResultSet;
use ledgerlift_store::{ConversionReport, StoreConfig, TabularConverter};

/// Execute the convert command.
pub fn execute_convert(args: ConvertArgs, mut config: Config, formatter: &Formatter) -> Result<()> {
    config.apply_store(args.output_dir.as_deref(), args.compression.as_deref())?;

    let results = ResultSet::load(&args.input)?;
    eprintln!(
        "{}",
        formatter.info(&format!(
            "Loaded {} records from {}",
            results.len(),
            args.input.display()
        ))
    );

    convert(&results, config.store, formatter)?;
    Ok(())
}

/// Write the artifacts of a result set and print the report.
pub fn convert(
    results: &ResultSet,
    store: StoreConfig,
    formatter: &Formatter,
) -> Result<ConversionReport> {
    let converter = TabularConverter::new(store)?;
    let report = converter.convert(results)?;

    println!("{}", formatter.format_report(&report)?);
    eprintln!(
        "{}",
        formatter.success(&format!(
            "Wrote {} rows to {}",
            report.total_rows(),
            converter.config().output_dir.display()
        ))
    );
    Ok(report)
}
