//! Ledgerlift CLI - Command-line interface for ERP container extraction.

use clap::Parser;
use ledgerlift_cli::commands;
use ledgerlift_cli::{Cli, CliError, Command, Config, Formatter};
use ledgerlift_orchestrator::InterruptFlag;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> ledgerlift_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;
    config.validate()?;

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    // Ctrl-C stops the run at the next record boundary
    let interrupt = InterruptFlag::new();
    let listener = interrupt.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping at the next record");
            listener.interrupt();
        }
    });

    let command = cli.command;
    tokio::task::spawn_blocking(move || dispatch(command, config, &interrupt, &formatter))
        .await
        .map_err(|e| CliError::Worker(e.to_string()))?
}

fn dispatch(
    command: Command,
    config: Config,
    interrupt: &InterruptFlag,
    formatter: &Formatter,
) -> ledgerlift_cli::Result<()> {
    match command {
        Command::Analyze(args) => commands::execute_analyze(args, &config, formatter),
        Command::Extract(args) => commands::execute_extract(args, config, interrupt, formatter),
        Command::Convert(args) => commands::execute_convert(args, config, formatter),
        Command::Run(args) => commands::execute_run(args, config, interrupt, formatter),
        Command::Search(args) => commands::execute_search(args, &config, interrupt, formatter),
    }
}
