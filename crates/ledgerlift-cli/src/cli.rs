//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Ledgerlift CLI - Extract business records from an ERP container.
#[derive(Debug, Parser)]
#[command(name = "ledgerlift")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "LEDGERLIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Default log filter for the requested verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rank the tables of a container by processing priority
    Analyze(AnalyzeArgs),

    /// Extract documents and save the result set as JSON
    Extract(ExtractArgs),

    /// Convert a saved result set into parquet files and an SQLite database
    Convert(ConvertArgs),

    /// Extract and convert in one go
    Run(RunArgs),

    /// Search container records for keywords
    Search(SearchArgs),
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Container fixture file
    pub container: PathBuf,

    /// Show only the first N tables
    #[arg(short, long)]
    pub top: Option<usize>,
}

/// Overrides for the table plan.
#[derive(Debug, Clone, Default, Parser)]
pub struct PlanArgs {
    /// Start from a preset instead of the configured caps
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Tables that are always processed first (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub critical: Vec<String>,

    /// Records read per critical table
    #[arg(long)]
    pub critical_limit: Option<usize>,

    /// Tables discovered by prefix beyond the critical ones
    #[arg(long)]
    pub additional_tables: Option<usize>,

    /// Records read per discovered table
    #[arg(long)]
    pub additional_limit: Option<usize>,

    /// Repeated read errors tolerated before a table is abandoned
    #[arg(long)]
    pub error_threshold: Option<usize>,
}

/// Plan presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PresetArg {
    /// Small caps for a quick look
    Survey,
    /// Balanced defaults
    Default,
    /// Large caps for a full extraction
    Exhaustive,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Container fixture file
    pub container: PathBuf,

    /// Result set output path
    #[arg(short, long, default_value = "results.json")]
    pub output: PathBuf,

    #[command(flatten)]
    pub plan: PlanArgs,
}

/// Arguments for the convert command.
#[derive(Debug, Parser)]
pub struct ConvertArgs {
    /// Saved result set
    #[arg(default_value = "results.json")]
    pub input: PathBuf,

    /// Directory receiving the artifacts
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Parquet compression (none, snappy, zstd)
    #[arg(long)]
    pub compression: Option<String>,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Container fixture file
    pub container: PathBuf,

    /// Directory receiving the artifacts
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Result set path (defaults to results.json inside the output directory)
    #[arg(long)]
    pub results: Option<PathBuf>,

    /// Parquet compression (none, snappy, zstd)
    #[arg(long)]
    pub compression: Option<String>,

    #[command(flatten)]
    pub plan: PlanArgs,
}

/// Arguments for the search command.
#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Container fixture file
    pub container: PathBuf,

    /// Keywords to look for; the configured vocabularies are used when empty
    pub keywords: Vec<String>,

    /// Restrict the search to these tables (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub tables: Vec<String>,

    /// Records scanned per table
    #[arg(long, default_value = "1000")]
    pub max_records: usize,

    /// Maximum number of matches shown
    #[arg(short, long, default_value = "50")]
    pub limit: usize,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}
