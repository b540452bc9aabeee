//! Results files as the web layer sees them.

#![allow(clippy::unwrap_used)]

use serde_json::{Value, json};
use stresslab_results::{Chart, ChartKind, ResultsTable, read_records};

fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_valid_csv_becomes_equivalent_json_records() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write(
        &dir,
        "force.csv",
        "Time,Force,Note\n0.0,0,start\n0.5,125.5,\n1.0,250,end\n",
    );

    let records = read_records(&path).unwrap();
    let as_json = serde_json::to_value(&records).unwrap();
    assert_eq!(
        as_json,
        json!([
            {"Time": 0.0, "Force": 0, "Note": "start"},
            {"Time": 0.5, "Force": 125.5, "Note": null},
            {"Time": 1.0, "Force": 250, "Note": "end"},
        ])
    );
}

#[test]
fn test_quoted_fields_and_whitespace() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write(&dir, "quoted.csv", "node, label\n1,\"fixed, face\"\n");
    let records = read_records(&path).unwrap();
    assert_eq!(records[0][" label"], json!("fixed, face"));
    assert_eq!(records[0]["node"], json!(1));
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = read_records(dir.path().join("stress_results.csv")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_duplicate_columns_are_all_kept() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write(&dir, "dup.csv", "SX,SX\n1,2\n");
    let as_json = serde_json::to_value(read_records(&path).unwrap()).unwrap();
    assert_eq!(as_json, json!([{"SX": 1, "SX.1": 2}]));
}

#[test]
fn test_empty_file_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write(&dir, "empty.csv", "");
    let err = read_records(&path).unwrap_err();
    assert!(!err.is_not_found());
}

#[test]
fn test_malformed_file_is_not_not_found() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write(&dir, "bad.csv", "node,SX\n1,2,3\n");
    let err = read_records(&path).unwrap_err();
    assert!(!err.is_not_found());
}

#[test]
fn test_chart_from_stress_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = write(&dir, "stress.csv", "node,SX\n1,-1.0e6\n2,\n3,5.0e5\n");
    let table = ResultsTable::read(&path).unwrap();
    let chart = Chart::from_table(&table);

    assert_eq!(chart.kind, ChartKind::Scatter);
    assert_eq!(chart.traces.len(), 2);
    assert_eq!(chart.traces[1].y[1], Value::Null);
    assert!(chart.to_html().unwrap().contains("Simulation Data"));
}
