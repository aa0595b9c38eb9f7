//! Byte widths of schema field types
//!
//! The container reader computes record layouts from a per-type width
//! function. [`CompatFieldSizes`] wraps that function so that type codes
//! introduced by newer product versions degrade to a warning instead of
//! aborting the whole run.

use ledgerlift_domain::ReaderError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Schema declaration of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Type code as declared in the schema (`B`, `N`, `NVC`, ...)
    #[serde(rename = "type")]
    pub type_code: String,
    /// Nominal length from the schema
    #[serde(default)]
    pub length: usize,
    /// Precision (numeric types only)
    #[serde(default)]
    pub precision: usize,
    /// Whether the field carries a leading null-flag byte
    #[serde(default)]
    pub nullable: bool,
}

impl FieldSpec {
    /// Create a non-nullable field declaration
    pub fn new(name: impl Into<String>, type_code: impl Into<String>, length: usize) -> Self {
        Self {
            name: name.into(),
            type_code: type_code.into(),
            length,
            precision: 0,
            nullable: false,
        }
    }

    /// Mark the field nullable
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Resolves the on-disk byte width of a field
pub trait FieldSizeResolver {
    /// Width in bytes of one stored value of `field`
    fn field_size(&self, field: &FieldSpec) -> Result<usize, ReaderError>;

    /// Width of a full record laid out from `fields`
    fn record_width(&self, fields: &[FieldSpec]) -> Result<usize, ReaderError> {
        fields.iter().try_fold(0usize, |acc, field| {
            Ok(acc + self.field_size(field)?)
        })
    }
}

fn null_flag(field: &FieldSpec) -> usize {
    usize::from(field.nullable)
}

/// Width table of the stock reader
///
/// Knows the classic type set only. Any other code is a fatal
/// [`ReaderError::UnknownFieldType`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictFieldSizes;

impl FieldSizeResolver for StrictFieldSizes {
    fn field_size(&self, field: &FieldSpec) -> Result<usize, ReaderError> {
        let width = match field.type_code.as_str() {
            "B" => field.length,
            "L" => 1,
            "N" => (field.length + 2) / 2,
            "NC" => field.length * 2,
            "NVC" => field.length * 2 + 2,
            "NT" | "I" => 8,
            "DT" => 7,
            other => return Err(ReaderError::UnknownFieldType(other.to_string())),
        };
        Ok(width + null_flag(field))
    }
}

/// Compatibility shim over another width resolver
///
/// Special-cases the known type set (including the GUID-like `RV` code the
/// stock table lacks) and any configured extension codes. Every other code is
/// passed to the wrapped resolver unchanged; if that resolver does not know
/// it either, the shim logs a warning and returns the nominal length.
#[derive(Debug, Clone)]
pub struct CompatFieldSizes<R> {
    inner: R,
    extension_widths: BTreeMap<String, usize>,
}

impl<R: FieldSizeResolver> CompatFieldSizes<R> {
    /// Wrap a resolver
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            extension_widths: BTreeMap::new(),
        }
    }

    /// Add product-specific extension codes with fixed widths
    pub fn with_extensions(mut self, extension_widths: BTreeMap<String, usize>) -> Self {
        self.extension_widths.extend(extension_widths);
        self
    }

    fn known_width(&self, field: &FieldSpec) -> Option<usize> {
        let width = match field.type_code.as_str() {
            "B" => field.length,
            "L" => 1,
            "N" => (field.length + 2) / 2,
            "NC" => field.length * 2,
            "NVC" => field.length * 2 + 2,
            "RV" => 16,
            "NT" | "I" => 8,
            "DT" => 7,
            code => *self.extension_widths.get(code)?,
        };
        Some(width + null_flag(field))
    }
}

impl<R: FieldSizeResolver> FieldSizeResolver for CompatFieldSizes<R> {
    fn field_size(&self, field: &FieldSpec) -> Result<usize, ReaderError> {
        if let Some(width) = self.known_width(field) {
            return Ok(width);
        }

        match self.inner.field_size(field) {
            Err(ReaderError::UnknownFieldType(code)) => {
                // A zero nominal length yields a zero-width field here.
                warn!(
                    field = %field.name,
                    type_code = %code,
                    nominal_length = field.length,
                    "Unknown field type code, using nominal length"
                );
                Ok(field.length)
            }
            other => other,
        }
    }
}

/// Reader configuration (TOML section `[reader]`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Downgrade unknown type codes to warnings
    /// Default: true
    #[serde(default = "default_true")]
    pub compat_shim: bool,

    /// Product-specific type codes and their fixed widths
    #[serde(default)]
    pub extension_widths: BTreeMap<String, usize>,
}

fn default_true() -> bool {
    true
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            compat_shim: true,
            extension_widths: BTreeMap::new(),
        }
    }
}

impl ReaderConfig {
    /// Build the width resolver this configuration describes
    pub fn resolver(&self) -> Box<dyn FieldSizeResolver + Send + Sync> {
        if self.compat_shim {
            Box::new(
                CompatFieldSizes::new(StrictFieldSizes)
                    .with_extensions(self.extension_widths.clone()),
            )
        } else {
            Box::new(StrictFieldSizes)
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        for (code, width) in &self.extension_widths {
            if code.is_empty() {
                return Err("extension type code must not be empty".to_string());
            }
            if BUILTIN_CODES.contains(&code.as_str()) {
                return Err(format!("extension code {} shadows a built-in type", code));
            }
            if *width == 0 {
                return Err(format!("extension code {} must have a non-zero width", code));
            }
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize TOML: {}", e))
    }
}

const BUILTIN_CODES: [&str; 9] = ["B", "L", "N", "NC", "NVC", "RV", "NT", "I", "DT"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_widths() {
        let sizes = StrictFieldSizes;
        assert_eq!(sizes.field_size(&FieldSpec::new("_IDRREF", "B", 16)).unwrap(), 16);
        assert_eq!(sizes.field_size(&FieldSpec::new("_POSTED", "L", 0)).unwrap(), 1);
        assert_eq!(sizes.field_size(&FieldSpec::new("_FLD1", "N", 15)).unwrap(), 8);
        assert_eq!(sizes.field_size(&FieldSpec::new("_NUMBER", "NC", 11)).unwrap(), 22);
        assert_eq!(sizes.field_size(&FieldSpec::new("_FLD2", "NVC", 50)).unwrap(), 102);
        assert_eq!(sizes.field_size(&FieldSpec::new("_FLD3", "NT", 0)).unwrap(), 8);
        assert_eq!(sizes.field_size(&FieldSpec::new("_DATE_TIME", "DT", 0)).unwrap(), 7);
        assert_eq!(
            sizes
                .field_size(&FieldSpec::new("_FLD4", "N", 10).nullable())
                .unwrap(),
            7
        );
    }

    #[test]
    fn test_strict_rejects_unknown_codes() {
        let result = StrictFieldSizes.field_size(&FieldSpec::new("_VERSION", "RV", 0));
        assert_eq!(result, Err(ReaderError::UnknownFieldType("RV".into())));
    }

    #[test]
    fn test_compat_special_cases_guid_code() {
        let sizes = CompatFieldSizes::new(StrictFieldSizes);
        assert_eq!(sizes.field_size(&FieldSpec::new("_VERSION", "RV", 0)).unwrap(), 16);
    }

    #[test]
    fn test_compat_unknown_code_returns_nominal_length() {
        let sizes = CompatFieldSizes::new(StrictFieldSizes);
        assert_eq!(sizes.field_size(&FieldSpec::new("_FLD9", "ZZ", 12)).unwrap(), 12);
        assert_eq!(sizes.field_size(&FieldSpec::new("_FLD9", "ZZ", 0)).unwrap(), 0);
    }

    #[test]
    fn test_compat_extension_codes() {
        let mut ext = BTreeMap::new();
        ext.insert("XR".to_string(), 24);
        let sizes = CompatFieldSizes::new(StrictFieldSizes).with_extensions(ext);

        assert_eq!(sizes.field_size(&FieldSpec::new("_FLD5", "XR", 3)).unwrap(), 24);
        assert_eq!(
            sizes
                .field_size(&FieldSpec::new("_FLD5", "XR", 3).nullable())
                .unwrap(),
            25
        );
    }

    /// Resolver that knows one private code and fails on everything else
    struct PrivateOnly;

    impl FieldSizeResolver for PrivateOnly {
        fn field_size(&self, field: &FieldSpec) -> Result<usize, ReaderError> {
            match field.type_code.as_str() {
                "PX" => Ok(99),
                "BAD" => Err(ReaderError::InvalidData("broken schema".into())),
                other => Err(ReaderError::UnknownFieldType(other.into())),
            }
        }
    }

    #[test]
    fn test_compat_delegates_codes_it_does_not_special_case() {
        let sizes = CompatFieldSizes::new(PrivateOnly);
        assert_eq!(sizes.field_size(&FieldSpec::new("_F", "PX", 1)).unwrap(), 99);
        // Errors other than an unknown code pass through untouched
        assert!(matches!(
            sizes.field_size(&FieldSpec::new("_F", "BAD", 1)),
            Err(ReaderError::InvalidData(_))
        ));
    }

    #[test]
    fn test_record_width() {
        let fields = vec![
            FieldSpec::new("_IDRREF", "B", 16),
            FieldSpec::new("_MARKED", "L", 0),
            FieldSpec::new("_NUMBER", "NC", 11),
        ];
        assert_eq!(StrictFieldSizes.record_width(&fields).unwrap(), 39);
    }

    #[test]
    fn test_config_validation() {
        assert!(ReaderConfig::default().validate().is_ok());

        let mut config = ReaderConfig::default();
        config.extension_widths.insert("NC".into(), 4);
        assert!(config.validate().is_err());

        let mut config = ReaderConfig::default();
        config.extension_widths.insert("XR".into(), 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let mut config = ReaderConfig::default();
        config.extension_widths.insert("XR".into(), 24);

        let toml_str = config.to_toml().unwrap();
        let parsed = ReaderConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.extension_widths, config.extension_widths);
        assert!(parsed.compat_shim);
    }

    #[test]
    fn test_config_selects_resolver() {
        let strict = ReaderConfig {
            compat_shim: false,
            ..Default::default()
        };
        assert!(strict
            .resolver()
            .field_size(&FieldSpec::new("_V", "RV", 0))
            .is_err());

        let config = ReaderConfig::from_toml("[extension_widths]\nXR = 24\n").unwrap();
        assert!(config.compat_shim);
        assert_eq!(
            config
                .resolver()
                .field_size(&FieldSpec::new("_F", "XR", 0))
                .unwrap(),
            24
        );
    }
}
