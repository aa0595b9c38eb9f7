//! Configuration for the extractors

use ledgerlift_domain::quality::{
    QualityWeights, BASE_CAP, ERROR_PENALTY, KEYWORD_BONUS_CAP, LENGTH_SCALE, MULTI_METHOD_BONUS,
};
use serde::{Deserialize, Serialize};

/// Configuration shared by the blob, table, keyword and document analyzers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Characters of content that earn the full length term of the quality score
    pub length_scale: f64,

    /// Cap on the length term
    pub base_cap: f64,

    /// Bonus when more than one method produced a blob result
    pub multi_method_bonus: f64,

    /// Penalty per failed strategy
    pub error_penalty: f64,

    /// Maximum keyword density bonus (only applied with a type hint)
    pub keyword_bonus_cap: f64,

    /// Decoded blob content shorter than this (in chars) is ignored by keyword search
    pub min_keyword_content_len: usize,

    /// Characters kept on each side of a keyword hit in excerpts
    pub excerpt_radius: usize,

    /// Decoded blob content is truncated past this many chars
    pub max_content_chars: usize,

    /// Record slots sampled by table analysis
    pub sample_size: usize,

    /// Minimum length (in chars) of free text classified as a description
    pub description_min_len: usize,

    /// Maximum child rows scanned per table-part table
    pub table_part_row_cap: usize,
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            length_scale: LENGTH_SCALE,
            base_cap: BASE_CAP,
            multi_method_bonus: MULTI_METHOD_BONUS,
            error_penalty: ERROR_PENALTY,
            keyword_bonus_cap: KEYWORD_BONUS_CAP,
            min_keyword_content_len: 3,
            excerpt_radius: 40,
            max_content_chars: 100_000,
            sample_size: 10,
            description_min_len: 50,
            table_part_row_cap: 100_000,
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: smaller samples and tighter noise filtering
    pub fn aggressive() -> Self {
        Self {
            min_keyword_content_len: 10,
            excerpt_radius: 20,
            max_content_chars: 10_000,
            sample_size: 5,
            table_part_row_cap: 10_000,
            ..Self::default()
        }
    }

    /// Lenient preset: larger samples, keep short blob content
    pub fn lenient() -> Self {
        Self {
            min_keyword_content_len: 1,
            excerpt_radius: 80,
            max_content_chars: 1_000_000,
            sample_size: 50,
            description_min_len: 30,
            table_part_row_cap: 1_000_000,
            ..Self::default()
        }
    }

    /// Quality score weights
    pub fn weights(&self) -> QualityWeights {
        QualityWeights {
            length_scale: self.length_scale,
            base_cap: self.base_cap,
            multi_method_bonus: self.multi_method_bonus,
            error_penalty: self.error_penalty,
            keyword_bonus_cap: self.keyword_bonus_cap,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let weights = [
            ("length_scale", self.length_scale),
            ("base_cap", self.base_cap),
            ("multi_method_bonus", self.multi_method_bonus),
            ("error_penalty", self.error_penalty),
            ("keyword_bonus_cap", self.keyword_bonus_cap),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative number", name));
            }
        }
        if self.length_scale == 0.0 {
            return Err("length_scale must be greater than 0".to_string());
        }
        if self.base_cap > 1.0 {
            return Err("base_cap cannot exceed 1.0".to_string());
        }
        if self.max_content_chars == 0 {
            return Err("max_content_chars must be greater than 0".to_string());
        }
        if self.sample_size == 0 {
            return Err("sample_size must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
