//! Configuration for tabular conversion

use parquet::basic::{Compression, ZstdLevel};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output settings of the tabular converter
///
/// # Examples
///
/// ```
/// use ledgerlift_store::StoreConfig;
///
/// let config = StoreConfig::default();
/// assert_eq!(config.database_name, "analytics.db");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory receiving every artifact
    /// Default: "output"
    pub output_dir: PathBuf,

    /// File name of the SQLite database inside `output_dir`
    /// Default: "analytics.db"
    pub database_name: String,

    /// Parquet compression: "none", "snappy" or "zstd"
    /// Default: "snappy"
    pub compression: String,

    /// Rows per record batch
    /// Default: 8192
    pub batch_size: usize,

    /// Rows returned by the top document types query
    /// Default: 10
    pub top_types: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            database_name: "analytics.db".to_string(),
            compression: "snappy".to_string(),
            batch_size: 8192,
            top_types: 10,
        }
    }
}

impl StoreConfig {
    /// Default settings writing into `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Check names and sizes
    pub fn validate(&self) -> Result<(), String> {
        if self.database_name.trim().is_empty() {
            return Err("database_name must not be empty".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be greater than zero".to_string());
        }
        self.parquet_compression().map(|_| ())
    }

    /// Parquet codec for the configured name
    pub fn parquet_compression(&self) -> Result<Compression, String> {
        match self.compression.to_ascii_lowercase().as_str() {
            "none" | "uncompressed" => Ok(Compression::UNCOMPRESSED),
            "snappy" => Ok(Compression::SNAPPY),
            "zstd" => Ok(Compression::ZSTD(ZstdLevel::default())),
            other => Err(format!("unsupported compression: {}", other)),
        }
    }

    /// Full path of the SQLite database
    pub fn database_path(&self) -> PathBuf {
        self.output_dir.join(&self.database_name)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compression_names() {
        let mut config = StoreConfig::default();
        assert_eq!(config.parquet_compression(), Ok(Compression::SNAPPY));

        config.compression = "NONE".into();
        assert_eq!(config.parquet_compression(), Ok(Compression::UNCOMPRESSED));

        config.compression = "lzma".into();
        assert!(config.validate().unwrap_err().contains("lzma"));
    }

    #[test]
    fn test_database_path() {
        let config = StoreConfig::in_dir("/tmp/run");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/run/analytics.db"));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = StoreConfig {
            compression: "zstd".into(),
            ..StoreConfig::in_dir("out")
        };
        let text = config.to_toml().unwrap();
        assert_eq!(StoreConfig::from_toml(&text).unwrap(), config);
        assert_eq!(StoreConfig::from_toml("batch_size = 16").unwrap().top_types, 10);
    }
}
