use std::fs;
use std::sync::Arc;

use nmap_wrap_rs::console::{RecordingSink, Tone};
use nmap_wrap_rs::error::ReportError;
use nmap_wrap_rs::report::{write_record_json, Persisted, Reporter};
use nmap_wrap_rs::types::{OutputFormat, ScanResult, ScanRun};
use tempfile::tempdir;

fn sample(success: bool) -> ScanResult {
    ScanRun::begin("nmap -sT -p 22 -T3 10.0.0.1").complete(
        Some(if success { 0 } else { 1 }),
        "22/tcp open  ssh\n".to_string(),
        if success { String::new() } else { "route failed\n".to_string() },
    )
}

#[test]
fn display_renders_summary_and_highlights_errors() {
    let sink = Arc::new(RecordingSink::new());
    Reporter::new(sink.clone()).display(&sample(false));

    let text = sink.text();
    assert!(text.contains("SCAN RESULTS"));
    assert!(text.contains("Command: nmap -sT -p 22 -T3 10.0.0.1"));
    assert!(text.contains("Exit Code: 1"));
    assert!(text.contains("22/tcp open  ssh"));
    let errors = sink.with_tone(Tone::Error);
    assert!(errors.contains(&"Status: FAILED".to_string()));
    assert!(errors.contains(&"route failed".to_string()));
}

#[test]
fn display_skips_empty_error_section() {
    let sink = Arc::new(RecordingSink::new());
    Reporter::new(sink.clone()).display(&sample(true));
    assert!(!sink.text().contains("Errors:"));
    assert_eq!(sink.with_tone(Tone::Success), vec!["Status: SUCCESS"]);
}

#[test]
fn text_format_writes_report() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scan.txt");
    let reporter = Reporter::new(Arc::new(RecordingSink::new()));

    let persisted = reporter.persist(&sample(true), &path, OutputFormat::Text).unwrap();

    assert_eq!(persisted, Persisted::Text(path.clone()));
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("Status: SUCCESS"));
    assert!(content.contains("22/tcp open  ssh"));
}

#[test]
fn xml_written_by_tool_is_left_alone() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scan.xml");
    fs::write(&path, "<nmaprun/>").unwrap();
    let sink = Arc::new(RecordingSink::new());

    let persisted = Reporter::new(sink.clone())
        .persist(&sample(true), &path, OutputFormat::Xml)
        .unwrap();

    assert_eq!(persisted, Persisted::Delegated(path.clone()));
    assert_eq!(fs::read_to_string(&path).unwrap(), "<nmaprun/>");
    assert!(sink.text().contains("XML output saved by nmap to:"));
}

#[test]
fn missing_json_falls_back_to_text_with_warning() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scan.json");
    let sink = Arc::new(RecordingSink::new());

    let persisted = Reporter::new(sink.clone())
        .persist(&sample(false), &path, OutputFormat::Json)
        .unwrap();

    let fallback = dir.path().join("scan.txt");
    assert_eq!(persisted, Persisted::Fallback(fallback.clone()));
    assert!(!path.exists());
    assert!(fs::read_to_string(&fallback).unwrap().contains("Status: FAILED"));
    assert_eq!(sink.with_tone(Tone::Warning).len(), 1);
}

#[test]
fn console_format_cannot_be_persisted() {
    let dir = tempdir().unwrap();
    let reporter = Reporter::new(Arc::new(RecordingSink::new()));
    let err = reporter
        .persist(&sample(true), &dir.path().join("x"), OutputFormat::Console)
        .unwrap_err();
    assert!(matches!(err, ReportError::UnsupportedFormat(OutputFormat::Console)));
}

#[test]
fn record_json_round_trips_through_serde() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("record.json");
    write_record_json(&path, &sample(true)).unwrap();

    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(v["success"], true);
    assert_eq!(v["exit_code"], 0);
    assert_eq!(v["command"], "nmap -sT -p 22 -T3 10.0.0.1");
}
