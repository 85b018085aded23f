// Tests for report export

use swatch_core::export::{ExportTarget, export_report, save_report, to_json};
use swatch_core::theme::{RadiusEntry, SpacingEntry, ThemeReport, TypographySample};
use tempfile::TempDir;

fn sample_report() -> ThemeReport {
    ThemeReport {
        typography: vec![TypographySample {
            font_size: "32px".to_string(),
            font_weight: "700".to_string(),
            line_height: "normal".to_string(),
            letter_spacing: "normal".to_string(),
            tag: "H1".to_string(),
            sample: "Welcome".to_string(),
        }],
        spacing: vec![SpacingEntry {
            value: "10px".to_string(),
            count: 3,
        }],
        gradients: vec![],
        shadows: vec!["rgba(0, 0, 0, 0.1) 0px 1px 2px 0px".to_string()],
        borders: vec!["1px solid rgb(0, 0, 0) r:4px".to_string()],
        radii: vec![RadiusEntry {
            radius: "4px".to_string(),
            count: 1,
        }],
        colors: vec!["rgb(0, 0, 0)".to_string()],
    }
}

// ============================================================================
// JSON Tests
// ============================================================================

#[test]
fn test_to_json_pretty_layout() {
    let json = to_json(&sample_report()).unwrap();

    assert!(json.starts_with("{\n  \"typography\": [\n    {\n      \"fontSize\": \"32px\""));
    assert!(json.contains("\n  \"gradients\": [],\n"));
    assert!(json.contains("\"value\": \"10px\",\n      \"count\": 3"));
    assert!(json.contains("\"radius\": \"4px\""));
}

#[test]
fn test_to_json_round_trips() {
    let report = sample_report();
    let json = to_json(&report).unwrap();
    let parsed: ThemeReport = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed, report);
}

#[test]
fn test_empty_report_has_all_fields() {
    let value: serde_json::Value =
        serde_json::from_str(&to_json(&ThemeReport::default()).unwrap()).unwrap();
    let object = value.as_object().unwrap();

    assert_eq!(object.len(), 7);
    for key in ["typography", "spacing", "gradients", "shadows", "borders", "radii", "colors"] {
        assert!(object[key].as_array().unwrap().is_empty(), "{} should be empty", key);
    }
}

// ============================================================================
// Sink Tests
// ============================================================================

#[test]
fn test_save_report() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.txt");

    save_report("content", &path).unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
}

#[test]
fn test_export_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("theme.json");
    let report = sample_report();

    let outcome = export_report(&report, &ExportTarget::File(path.clone())).unwrap();

    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, to_json(&report).unwrap());
    assert_eq!(outcome.bytes, written.len());
    assert_eq!(outcome.target, ExportTarget::File(path.clone()));
    assert!(outcome.message.starts_with("Saved full theme extraction to"));
}

#[test]
fn test_export_to_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("theme.json");

    let result = export_report(&sample_report(), &ExportTarget::File(path));

    assert!(result.is_err());
}

#[test]
fn test_export_to_stdout() {
    let outcome = export_report(&ThemeReport::default(), &ExportTarget::Stdout).unwrap();

    assert_eq!(outcome.message, "Wrote full theme extraction to stdout");
}
