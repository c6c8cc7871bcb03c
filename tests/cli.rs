use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const STATEMENT: &str = "\
Date,Description,Amount
2025-01-01,Gym Membership,-50.00
2025-01-25,SALARY JAN,5000.00
2025-01-31,Gym Membership,-50.00
2025-02-10,UBER TRIP,-25.50
2025-03-02,Gym Membership,-50.00
";

/// Runs against an empty home so no real settings file is picked up.
fn penny(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("penny").unwrap();
    cmd.env("HOME", home).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn analyze_prints_json_report() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "statement.csv", STATEMENT);
    penny(dir.path())
        .args(["analyze", file.to_str().unwrap(), "--json", "--currency", "usd"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_income\": 5000.0"))
        .stdout(predicate::str::contains("\"currency\": \"USD\""))
        .stdout(predicate::str::contains("\"frequency\": \"Monthly\""));
}

#[test]
fn analyze_renders_tables() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "statement.csv", STATEMENT);
    penny(dir.path())
        .args(["analyze", file.to_str().unwrap(), "--currency", "USD"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Spending by Category"))
        .stdout(predicate::str::contains("Transport"))
        .stdout(predicate::str::contains("$4,824.50"));
}

#[test]
fn analyze_focus_recurring() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "statement.csv", STATEMENT);
    penny(dir.path())
        .args(["analyze", file.to_str().unwrap(), "--json", "--focus", "recurring"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"recurring_count\": 1"))
        .stdout(predicate::str::contains("\"transactions\"").not());
}

#[test]
fn analyze_unsupported_type_fails_with_payload() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "notes.docx", "hello");
    penny(dir.path())
        .args(["analyze", file.to_str().unwrap(), "--json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"supported_types\""))
        .stderr(predicate::str::contains("Unsupported file type: .docx"));
}

#[test]
fn analyze_missing_columns_fails() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "bad.csv", "Date,Narration\n2025-01-01,Coffee\n");
    penny(dir.path())
        .args(["analyze", file.to_str().unwrap()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing required columns: amount"));
}

#[test]
fn analyze_focus_json_reports_error_payload() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "bad.csv", "Date,Narration\n2025-01-01,Coffee\n");
    penny(dir.path())
        .args(["analyze", file.to_str().unwrap(), "--json", "--focus", "summary"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"missing_columns\""))
        .stdout(predicate::str::contains("\"available_columns\""))
        .stderr(predicate::str::contains("Missing required columns: amount"));
}

#[test]
fn analyze_rejects_bad_currency() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "statement.csv", STATEMENT);
    penny(dir.path())
        .args(["analyze", file.to_str().unwrap(), "--json", "--currency", "DOLLARS"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Invalid options"));
}

#[test]
fn info_shows_checksum() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "abc.csv", "abc");
    penny(dir.path())
        .args(["info", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
        ))
        .stdout(predicate::str::contains("3 B"));
}

#[test]
fn classify_uses_keywords_then_sign() {
    let dir = TempDir::new().unwrap();
    penny(dir.path())
        .args(["classify", "POS UBER TRIP LAGOS"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Transport"));
    penny(dir.path())
        .args(["classify", "ACME LTD", "--amount", "-20"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Miscellaneous Expense"));
}

#[test]
fn categories_lists_rules_in_order() {
    let dir = TempDir::new().unwrap();
    penny(dir.path())
        .arg("categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("Airtime & Data"))
        .stdout(predicate::str::contains("shoprite"));
}

#[test]
fn config_init_writes_settings() {
    let dir = TempDir::new().unwrap();
    penny(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("not found, using defaults"))
        .stdout(predicate::str::contains("\"default_currency\": \"NGN\""));
    penny(dir.path()).args(["config", "--init"]).assert().success();
    assert!(dir.path().join(".config/penny/settings.json").exists());
}

#[test]
fn settings_file_changes_defaults() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join(".config/penny");
    std::fs::create_dir_all(&config).unwrap();
    std::fs::write(
        config.join("settings.json"),
        r#"{"default_currency": "GBP", "extra_keywords": {"Health": ["gym"]}}"#,
    )
    .unwrap();
    let file = write(&dir, "statement.csv", STATEMENT);
    penny(dir.path())
        .args(["analyze", file.to_str().unwrap(), "--json", "--focus", "patterns"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"most_frequent_category\": \"Health\""));
    penny(dir.path())
        .args(["analyze", file.to_str().unwrap(), "--focus", "summary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\u{a3}"));
}
