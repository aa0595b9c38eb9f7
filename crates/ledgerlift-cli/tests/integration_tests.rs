//! Integration tests for ledgerlift-cli
//!
//! These tests drive the commands against fixture containers on disk.

use ledgerlift_cli::cli::{AnalyzeArgs, ConvertArgs, ExtractArgs, PlanArgs, RunArgs};
use ledgerlift_cli::commands;
use ledgerlift_cli::config::OutputFormat;
use ledgerlift_cli::{CliError, Config, Formatter};
use ledgerlift_orchestrator::{InterruptFlag, ResultSet};
use std::fs;
use std::path::{Path, PathBuf};

const FIXTURE: &str = r#"{
  "tables": [
    {
      "name": "_Document163",
      "records": [
        {"_NUMBER": "0001", "_DATE_TIME": {"$datetime": "2024-03-01T10:00:00"}, "_FLD5": {"$decimal": "150.50"}},
        null,
        {"_NUMBER": "0002", "_FLD9": {"$blob": {"text": "магазин Лилия, розы"}}}
      ]
    },
    {
      "name": "_Reference85",
      "records": [{"_DESCRIPTION": "ООО Ромашка"}]
    },
    {
      "name": "_Document163_VT170",
      "records": []
    }
  ]
}"#;

fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("container.json");
    fs::write(&path, FIXTURE).unwrap();
    path
}

fn formatter() -> Formatter {
    Formatter::new(OutputFormat::Json, false)
}

#[test]
fn test_analyze_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let args = AnalyzeArgs {
        container: write_fixture(dir.path()),
        top: Some(2),
    };
    commands::execute_analyze(args, &Config::default(), &formatter()).unwrap();
}

#[test]
fn test_extract_then_convert() {
    let dir = tempfile::tempdir().unwrap();
    let results = dir.path().join("results.json");

    let extract = ExtractArgs {
        container: write_fixture(dir.path()),
        output: results.clone(),
        plan: PlanArgs::default(),
    };
    commands::execute_extract(extract, Config::default(), &InterruptFlag::new(), &formatter())
        .unwrap();

    let saved = ResultSet::load(&results).unwrap();
    assert_eq!(saved.documents.len(), 2);
    assert_eq!(saved.references.len(), 1);
    assert!(!saved.metadata.interrupted);

    let output = dir.path().join("out");
    let convert = ConvertArgs {
        input: results,
        output_dir: Some(output.clone()),
        compression: Some("zstd".into()),
    };
    commands::execute_convert(convert, Config::default(), &formatter()).unwrap();

    assert!(output.join("documents.parquet").exists());
    assert!(output.join("references.parquet").exists());
    assert!(output.join("analytics.db").exists());
}

#[test]
fn test_run_writes_everything_into_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("artifacts");

    let args = RunArgs {
        container: write_fixture(dir.path()),
        output_dir: Some(output.clone()),
        results: None,
        compression: None,
        plan: PlanArgs {
            critical: vec!["_Reference85".into()],
            ..PlanArgs::default()
        },
    };
    commands::execute_run(args, Config::default(), &InterruptFlag::new(), &formatter()).unwrap();

    let saved = ResultSet::load(output.join("results.json")).unwrap();
    assert_eq!(saved.len(), 3);
    assert_eq!(saved.statistics.tables[0].table_name, "_Reference85");
    assert!(output.join("documents.parquet").exists());
}

#[test]
fn test_missing_container_fails() {
    let dir = tempfile::tempdir().unwrap();
    let args = ExtractArgs {
        container: dir.path().join("absent.json"),
        output: dir.path().join("results.json"),
        plan: PlanArgs::default(),
    };
    let result =
        commands::execute_extract(args, Config::default(), &InterruptFlag::new(), &formatter());

    assert!(matches!(result, Err(CliError::Orchestrator(_))));
    assert!(!dir.path().join("results.json").exists());
}
