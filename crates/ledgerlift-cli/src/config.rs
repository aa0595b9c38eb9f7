//! Configuration management for the CLI.
//!
//! One TOML file carries a section per library crate; every section and
//! every field is optional.
//!
//! ```toml
//! [reader]
//! compat_shim = true
//!
//! [extractor]
//! sample_size = 10
//!
//! [orchestrator]
//! critical_tables = ["_Document163"]
//!
//! [store]
//! output_dir = "output"
//! ```

use crate::cli::{PlanArgs, PresetArg};
use crate::error::{CliError, Result};
use ledgerlift_extractor::ExtractorConfig;
use ledgerlift_orchestrator::OrchestratorConfig;
use ledgerlift_reader::ReaderConfig;
use ledgerlift_store::StoreConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File picked up from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "ledgerlift.toml";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Container reader settings
    pub reader: ReaderConfig,

    /// Analyzer settings
    pub extractor: ExtractorConfig,

    /// Table plan and run settings
    pub orchestrator: OrchestratorConfig,

    /// Artifact settings
    pub store: StoreConfig,

    /// Output settings
    pub settings: Settings,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
}

impl Config {
    /// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] when
    /// it exists, or fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path: PathBuf = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let contents = fs::read_to_string(&path).map_err(|e| {
            CliError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        let sections = [
            ("reader", self.reader.validate()),
            ("extractor", self.extractor.validate()),
            ("orchestrator", self.orchestrator.validate()),
            ("store", self.store.validate()),
        ];
        for (section, outcome) in sections {
            outcome.map_err(|e| CliError::Config(format!("[{}] {}", section, e)))?;
        }
        Ok(())
    }

    /// Apply plan overrides from the command line.
    ///
    /// A preset replaces the caps first; explicit flags win over both.
    pub fn apply_plan(&mut self, plan: &PlanArgs) -> Result<()> {
        let orchestrator = &mut self.orchestrator;

        if let Some(preset) = plan.preset {
            let base = match preset {
                PresetArg::Survey => OrchestratorConfig::survey(),
                PresetArg::Default => OrchestratorConfig::default(),
                PresetArg::Exhaustive => OrchestratorConfig::exhaustive(),
            };
            orchestrator.critical_record_limit = base.critical_record_limit;
            orchestrator.max_additional_tables = base.max_additional_tables;
            orchestrator.additional_record_limit = base.additional_record_limit;
            orchestrator.error_threshold = base.error_threshold;
            orchestrator.progress_interval = base.progress_interval;
        }

        if !plan.critical.is_empty() {
            orchestrator.critical_tables = plan.critical.clone();
        }
        if let Some(limit) = plan.critical_limit {
            orchestrator.critical_record_limit = limit;
        }
        if let Some(tables) = plan.additional_tables {
            orchestrator.max_additional_tables = tables;
        }
        if let Some(limit) = plan.additional_limit {
            orchestrator.additional_record_limit = limit;
        }
        if let Some(threshold) = plan.error_threshold {
            orchestrator.error_threshold = threshold;
        }

        self.orchestrator.validate().map_err(CliError::InvalidInput)
    }

    /// Apply store overrides from the command line.
    pub fn apply_store(
        &mut self,
        output_dir: Option<&Path>,
        compression: Option<&str>,
    ) -> Result<()> {
        if let Some(dir) = output_dir {
            self.store.output_dir = dir.to_path_buf();
        }
        if let Some(compression) = compression {
            self.store.compression = compression.to_string();
        }
        self.store.validate().map_err(CliError::InvalidInput)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
