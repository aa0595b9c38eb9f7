//! Configuration for extraction runs
//!
//! Defines the table plan (allow-list, discovery, caps), the circuit breaker
//! threshold and keyword tagging.

use ledgerlift_extractor::{KeywordSet, Vocabulary};
use serde::{Deserialize, Serialize};

/// Name prefixes of tables picked up by discovery
pub const DEFAULT_PREFIXES: [&str; 4] = ["_DOCUMENT", "_REFERENCE", "_ACCUMRG", "_INFORG"];

/// Marker of table-part tables, which are never planned on their own
pub const TABLE_PART_MARKER: &str = "_VT";

/// Configuration for the extraction orchestrator
///
/// # Examples
///
/// ```
/// use ledgerlift_orchestrator::OrchestratorConfig;
///
/// let config = OrchestratorConfig::default();
/// assert_eq!(config.error_threshold, 100);
///
/// // Quick look at a container
/// let config = OrchestratorConfig::survey();
/// assert_eq!(config.max_additional_tables, 5);
///
/// // Everything the caps allow
/// let config = OrchestratorConfig::exhaustive();
/// assert!(config.additional_record_limit > OrchestratorConfig::default().additional_record_limit);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Tables processed first, in this order, whatever their size
    /// Default: none
    pub critical_tables: Vec<String>,

    /// Record cap per allow-listed table
    /// Default: 50000
    pub critical_record_limit: usize,

    /// How many discovered tables are processed after the allow-list
    /// Default: 20
    pub max_additional_tables: usize,

    /// Record cap per discovered table
    /// Default: 10000
    pub additional_record_limit: usize,

    /// Occurrences of one error message that abort a table
    /// Default: 100
    pub error_threshold: usize,

    /// Name prefixes used for discovery (case-insensitive)
    pub discovery_prefixes: Vec<String>,

    /// Resolve table parts into line items
    /// Default: true
    pub table_parts: bool,

    /// Built-in vocabularies used to tag documents
    /// Default: all of them
    pub keyword_vocabularies: Vec<String>,

    /// Extra keywords used to tag documents
    pub custom_keywords: Vec<String>,

    /// Records between two progress events
    /// Default: 1000
    pub progress_interval: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            critical_tables: Vec::new(),
            critical_record_limit: 50_000,
            max_additional_tables: 20,
            additional_record_limit: 10_000,
            error_threshold: 100,
            discovery_prefixes: DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect(),
            table_parts: true,
            keyword_vocabularies: Vocabulary::ALL
                .iter()
                .map(|v| v.as_str().to_string())
                .collect(),
            custom_keywords: Vec::new(),
            progress_interval: 1_000,
        }
    }
}

impl OrchestratorConfig {
    /// Small caps for a first look at an unknown container
    ///
    /// - Allow-listed tables: 1000 records
    /// - Discovered tables: 5, 500 records each
    /// - Circuit breaker: 20
    pub fn survey() -> Self {
        Self {
            critical_record_limit: 1_000,
            max_additional_tables: 5,
            additional_record_limit: 500,
            error_threshold: 20,
            progress_interval: 100,
            ..Self::default()
        }
    }

    /// Large caps for a full extraction
    ///
    /// - Allow-listed tables: 10 million records
    /// - Discovered tables: 500, 1 million records each
    /// - Circuit breaker: 1000
    pub fn exhaustive() -> Self {
        Self {
            critical_record_limit: 10_000_000,
            max_additional_tables: 500,
            additional_record_limit: 1_000_000,
            error_threshold: 1_000,
            progress_interval: 10_000,
            ..Self::default()
        }
    }

    /// Check limits and vocabulary names
    pub fn validate(&self) -> Result<(), String> {
        if self.critical_record_limit == 0 || self.additional_record_limit == 0 {
            return Err("record limits must be greater than zero".to_string());
        }
        if self.error_threshold == 0 {
            return Err("error_threshold must be greater than zero".to_string());
        }
        if self.progress_interval == 0 {
            return Err("progress_interval must be greater than zero".to_string());
        }
        if self.discovery_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err("discovery prefixes must not be blank".to_string());
        }
        if let Some(unknown) = self
            .keyword_vocabularies
            .iter()
            .find(|name| Vocabulary::from_name(name).is_none())
        {
            return Err(format!("unknown keyword vocabulary: {}", unknown));
        }
        Ok(())
    }

    /// Keywords used for tagging, `None` when tagging is off
    pub fn keyword_set(&self) -> Option<KeywordSet> {
        let keywords: Vec<String> = self
            .keyword_vocabularies
            .iter()
            .filter_map(|name| Vocabulary::from_name(name))
            .flat_map(|v| v.keywords().iter().map(|k| k.to_string()))
            .chain(self.custom_keywords.iter().cloned())
            .collect();

        let set = KeywordSet::custom("configured", keywords);
        (!set.keywords().is_empty()).then_some(set)
    }

    /// Whether discovery may pick up a table of this name
    pub fn is_discoverable(&self, name: &str) -> bool {
        let upper = name.to_ascii_uppercase();
        !upper.contains(TABLE_PART_MARKER)
            && self
                .discovery_prefixes
                .iter()
                .any(|prefix| upper.starts_with(&prefix.to_ascii_uppercase()))
    }

    /// Load from a TOML string
    pub fn from_toml(s: &str) -> Result<Self, String> {
        toml::from_str(s).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
