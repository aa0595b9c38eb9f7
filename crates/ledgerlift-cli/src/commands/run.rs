//! Run command implementation.

use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use ledgerlift_orchestrator::InterruptFlag;
use ledgerlift_reader::FixtureSource;

use super::convert::convert;
use super::extract::{extract, save};

/// Execute the run command: extract, save, then convert.
pub fn execute_run(
    args: RunArgs,
    mut config: Config,
    interrupt: &InterruptFlag,
    formatter: &Formatter,
) -> Result<()> {
    config.apply_plan(&args.plan)?;
    config.apply_store(args.output_dir.as_deref(), args.compression.as_deref())?;

    let results_path = args
        .results
        .unwrap_or_else(|| config.store.output_dir.join("results.json"));

    let source = FixtureSource::new(args.container).with_config(config.reader.clone());
    let results = extract(&source, &config, interrupt, formatter)?;
    save(&results, &results_path, formatter)?;

    // An interrupted run is still converted
    convert(&results, config.store, formatter)?;
    Ok(())
}
