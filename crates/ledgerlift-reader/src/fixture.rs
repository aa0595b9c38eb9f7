//! JSON container fixtures
//!
//! A fixture file describes a whole container:
//!
//! ```json
//! {
//!   "tables": [
//!     {
//!       "name": "_DOCUMENT163",
//!       "schema": [{"name": "_NUMBER", "type": "NC", "length": 11}],
//!       "records": [
//!         {"_NUMBER": "0001", "_DATE_TIME": {"$datetime": "2024-03-01T10:00:00"}},
//!         null,
//!         {"$corrupt": "checksum mismatch"}
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `null` records are tombstones. Tagged objects encode values JSON cannot
//! express directly: `$datetime`, `$decimal`, `$binary` (hex), `$float`
//! (`NaN`, `inf`, `-inf`) and `$blob`. A blob carries either `text` or `hex`
//! content and may restrict its `access` capabilities or list `failing` ones.

use crate::field_size::{FieldSpec, ReaderConfig};
use crate::memory::{
    Access, BlobAccess, MemoryBlob, MemoryContainer, MemoryRow, MemoryTable, MemoryValue,
};
use chrono::{NaiveDate, NaiveDateTime};
use ledgerlift_domain::{Container, ContainerSource, ReaderError, ScalarValue, Table};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct FixtureFile {
    tables: Vec<FixtureTable>,
}

#[derive(Debug, Deserialize)]
struct FixtureTable {
    name: String,
    #[serde(default)]
    schema: Vec<FieldSpec>,
    #[serde(default)]
    records: Vec<Option<Map<String, Value>>>,
}

/// A [`ContainerSource`] backed by a JSON fixture file
#[derive(Debug, Clone)]
pub struct FixtureSource {
    path: PathBuf,
    config: ReaderConfig,
}

impl FixtureSource {
    /// Create a source for the given path with default reader settings
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: ReaderConfig::default(),
        }
    }

    /// Use specific reader settings
    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Path of the fixture file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse fixture text into tables
    pub fn parse(&self, text: &str) -> Result<Vec<MemoryTable>, ReaderError> {
        let file: FixtureFile = serde_json::from_str(text)
            .map_err(|e| ReaderError::Open(format!("invalid fixture JSON: {}", e)))?;

        let resolver = self.config.resolver();
        let mut tables = Vec::with_capacity(file.tables.len());

        for fixture in file.tables {
            let width = resolver
                .record_width(&fixture.schema)
                .map_err(|e| ReaderError::Open(format!("table {}: {}", fixture.name, e)))?;

            let mut table = MemoryTable::new(&fixture.name).with_schema(fixture.schema);
            for (index, record) in fixture.records.into_iter().enumerate() {
                let row = parse_row(record).map_err(|reason| {
                    ReaderError::Open(format!(
                        "table {} record {}: {}",
                        fixture.name, index, reason
                    ))
                })?;
                table.push(row);
            }

            debug!(
                table = %fixture.name,
                records = table.len(),
                record_width = width,
                "Loaded fixture table"
            );
            tables.push(table);
        }

        Ok(tables)
    }
}

impl ContainerSource for FixtureSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<Box<dyn Container>, ReaderError> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| ReaderError::Open(format!("{}: {}", self.path.display(), e)))?;

        let tables = self.parse(&text)?;
        info!(
            path = %self.path.display(),
            tables = tables.len(),
            "Opened fixture container"
        );
        Ok(Box::new(MemoryContainer::new(tables)))
    }
}

fn parse_row(record: Option<Map<String, Value>>) -> Result<MemoryRow, String> {
    let Some(fields) = record else {
        return Ok(MemoryRow::Tombstone);
    };

    if let Some(reason) = fields.get("$corrupt") {
        return Ok(MemoryRow::Corrupt(
            reason.as_str().unwrap_or("corrupt record").to_string(),
        ));
    }

    let mut row = Vec::with_capacity(fields.len());
    for (name, value) in fields {
        let value = parse_value(&value).map_err(|e| format!("field {}: {}", name, e))?;
        row.push((name, value));
    }
    Ok(MemoryRow::Present(row))
}

fn parse_value(value: &Value) -> Result<MemoryValue, String> {
    let scalar = match value {
        Value::Null => ScalarValue::Null,
        Value::Bool(b) => ScalarValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ScalarValue::Int(i),
            None => ScalarValue::Float(n.as_f64().ok_or("number out of range")?),
        },
        Value::String(s) => ScalarValue::Text(s.clone()),
        Value::Array(_) => return Err("arrays are not field values".into()),
        Value::Object(tagged) => return parse_tagged(tagged),
    };
    Ok(MemoryValue::Scalar(scalar))
}

fn parse_tagged(tagged: &Map<String, Value>) -> Result<MemoryValue, String> {
    let (tag, inner) = match tagged.iter().next() {
        Some(entry) if tagged.len() == 1 => entry,
        _ => return Err("tagged value must have exactly one key".into()),
    };

    let text = || inner.as_str().ok_or_else(|| format!("{} expects a string", tag));

    let scalar = match tag.as_str() {
        "$datetime" => ScalarValue::DateTime(parse_datetime(text()?)?),
        "$decimal" => ScalarValue::Decimal(text()?.to_string()),
        "$binary" => ScalarValue::Binary(decode_hex(text()?)?),
        "$float" => ScalarValue::Float(
            text()?
                .parse::<f64>()
                .map_err(|e| format!("invalid $float: {}", e))?,
        ),
        "$blob" => return parse_blob(inner).map(MemoryValue::Blob),
        other => return Err(format!("unknown tag {}", other)),
    };
    Ok(MemoryValue::Scalar(scalar))
}

fn parse_datetime(text: &str) -> Result<NaiveDateTime, String> {
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("invalid $datetime: {}", text))
}

fn parse_blob(definition: &Value) -> Result<MemoryBlob, String> {
    let definition = definition.as_object().ok_or("$blob expects an object")?;

    let mut blob = match (definition.get("text"), definition.get("hex")) {
        (Some(Value::String(text)), None) => MemoryBlob::text(text.clone()),
        (None, Some(Value::String(hex))) => MemoryBlob::bytes(decode_hex(hex)?),
        _ => return Err("$blob needs exactly one of text or hex".into()),
    };

    if let Some(names) = definition.get("access") {
        let mut access = BlobAccess::none();
        for name in string_list(names)? {
            *capability(&mut access, &name)? = Access::Available;
        }
        blob = blob.with_access(access);
    }

    if let Some(names) = definition.get("failing") {
        let mut access = blob.access().clone();
        for name in string_list(names)? {
            *capability(&mut access, &name)? = Access::Failing(format!("{} unavailable", name));
        }
        blob = blob.with_access(access);
    }

    if let Some(len) = definition.get("length").and_then(Value::as_u64) {
        blob = blob.with_declared_len(len as usize);
    }

    Ok(blob)
}

fn string_list(value: &Value) -> Result<Vec<String>, String> {
    value
        .as_array()
        .ok_or("expected a list of capability names")?
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| "capability names must be strings".to_string())
        })
        .collect()
}

fn capability<'a>(access: &'a mut BlobAccess, name: &str) -> Result<&'a mut Access, String> {
    match name {
        "value" => Ok(&mut access.value),
        "chunks" => Ok(&mut access.chunks),
        "bytes" => Ok(&mut access.bytes),
        "coerce" => Ok(&mut access.coerce),
        "internal" => Ok(&mut access.internal),
        other => Err(format!("unknown blob capability {}", other)),
    }
}

fn decode_hex(text: &str) -> Result<Vec<u8>, String> {
    hex::decode(text.trim()).map_err(|e| format!("invalid hex: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerlift_domain::{BlobHandle, FieldValue};
    use std::io::Write;

    const FIXTURE: &str = r#"{
        "tables": [
            {
                "name": "_DOCUMENT163",
                "schema": [
                    {"name": "_IDRREF", "type": "B", "length": 16},
                    {"name": "_VERSION", "type": "RV"},
                    {"name": "_NUMBER", "type": "NC", "length": 11}
                ],
                "records": [
                    {
                        "_NUMBER": "0001",
                        "_DATE_TIME": {"$datetime": "2024-03-01T10:00:00"},
                        "_FLD10": {"$decimal": "1500.50"},
                        "_IDRREF": {"$binary": "00ff"},
                        "_FLD11": {"$blob": {"hex": "524f534553", "access": ["bytes"]}}
                    },
                    null,
                    {"$corrupt": "checksum mismatch"}
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_fixture() {
        let tables = FixtureSource::new("inline").parse(FIXTURE).unwrap();
        assert_eq!(tables.len(), 1);

        let table = &tables[0];
        assert_eq!(table.len(), 3);
        assert_eq!(table.schema().len(), 3);

        let record = table.record(0).unwrap();
        // Field order follows the file
        assert_eq!(
            record.field_names().collect::<Vec<_>>(),
            ["_NUMBER", "_DATE_TIME", "_FLD10", "_IDRREF", "_FLD11"]
        );
        assert_eq!(
            record.scalar("_FLD10"),
            Some(&ScalarValue::Decimal("1500.50".into()))
        );
        assert_eq!(
            record.scalar("_IDRREF"),
            Some(&ScalarValue::Binary(vec![0x00, 0xff]))
        );

        match record.get("_FLD11") {
            Some(FieldValue::Blob(blob)) => {
                assert!(blob.value().is_none());
                assert_eq!(blob.bytes().unwrap().unwrap(), b"ROSES".to_vec());
            }
            other => panic!("expected blob, got {:?}", other),
        }

        assert!(table.record(1).unwrap().is_empty());
        assert!(table.record(2).is_err());
    }

    #[test]
    fn test_strict_reader_rejects_new_type_codes() {
        let strict = ReaderConfig {
            compat_shim: false,
            ..Default::default()
        };
        let result = FixtureSource::new("inline").with_config(strict).parse(FIXTURE);
        assert!(matches!(result, Err(ReaderError::Open(msg)) if msg.contains("RV")));
    }

    #[test]
    fn test_unknown_code_accepted_with_shim() {
        let fixture = r#"{"tables": [{"name": "T", "schema": [{"name": "F", "type": "QQ", "length": 0}], "records": []}]}"#;
        let tables = FixtureSource::new("inline").parse(fixture).unwrap();
        assert_eq!(tables[0].len(), 0);
    }

    #[test]
    fn test_failing_capability() {
        let fixture = r#"{"tables": [{"name": "T", "records": [
            {"B": {"$blob": {"text": "abc", "failing": ["value"]}}}
        ]}]}"#;
        let tables = FixtureSource::new("inline").parse(fixture).unwrap();
        let record = tables[0].record(0).unwrap();
        let Some(FieldValue::Blob(blob)) = record.get("B") else {
            panic!("expected blob");
        };
        assert!(matches!(blob.value(), Some(Err(_))));
        assert!(matches!(blob.bytes(), Some(Ok(_))));
    }

    #[test]
    fn test_invalid_values_are_open_errors() {
        let source = FixtureSource::new("inline");
        assert!(source.parse("not json").is_err());
        assert!(source
            .parse(r#"{"tables": [{"name": "T", "records": [{"F": {"$nope": 1}}]}]}"#)
            .is_err());
        assert!(source
            .parse(r#"{"tables": [{"name": "T", "records": [{"F": {"$binary": "abc"}}]}]}"#)
            .is_err());
    }

    #[test]
    fn test_open_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let source = FixtureSource::new(file.path());
        let container = source.open().unwrap();
        assert_eq!(container.table_names(), vec!["_DOCUMENT163"]);

        let missing = FixtureSource::new("/nonexistent/fixture.json");
        assert!(matches!(missing.open(), Err(ReaderError::Open(_))));
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex(" 00ABff ").unwrap(), vec![0x00, 0xab, 0xff]);
        assert!(decode_hex("0").unwrap_err().contains("invalid hex"));
        assert!(decode_hex("zz").is_err());
    }

    #[test]
    fn test_bad_hex_names_the_field() {
        let err = FixtureSource::new("inline")
            .parse(r#"{"tables": [{"name": "T", "records": [{"_FLD1": {"$binary": "0g"}}]}]}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("field _FLD1"));
        assert!(err.contains("invalid hex"));
    }
}
