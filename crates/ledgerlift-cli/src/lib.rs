//! Ledgerlift CLI library.
//!
//! This library provides the core functionality for the `ledgerlift` operator
//! binary: configuration loading, command execution and output formatting.
//! The commands are synchronous; the binary runs them on a blocking thread and
//! forwards Ctrl-C to the shared [`InterruptFlag`](ledgerlift_orchestrator::InterruptFlag).

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
