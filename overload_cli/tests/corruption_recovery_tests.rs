//! Corruption recovery tests for the overload binary.
//!
//! These tests verify the system can handle:
//! - Corrupted values files
//! - Corrupted WAL lines
//! - Partial writes
//! - Unreadable data directories

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("overload"))
}

fn setup_test_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("config.toml"), "").expect("Failed to write config");
    fs::create_dir_all(dir.path().join("wal")).expect("Failed to create wal dir");
    dir
}

fn cli_in(dir: &Path) -> Command {
    let mut cmd = cli();
    cmd.arg("--data-dir")
        .arg(dir)
        .arg("--config")
        .arg(dir.join("config.toml"));
    cmd
}

const VALID_ENTRY: &str = r#"{"date":"2024-03-20","timestamp":"2024-03-20T18:00:00Z","exercise_id":"squats","value":135.0,"reps":20,"notes":"","progressed":true,"new_value":140.0}"#;

#[test]
fn test_corrupted_values_file_falls_back_to_defaults() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("wal/exercises.json"), "{ invalid json }}}}")
        .expect("Failed to write corrupted values");

    cli_in(data_dir)
        .assert()
        .success()
        .stderr(predicate::str::contains("Could not load saved data"))
        .stdout(predicate::str::contains("[error]"));
}

#[test]
fn test_workout_after_corrupted_values_keeps_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let values_path = data_dir.join("wal/exercises.json");

    fs::write(&values_path, "not json at all").expect("Failed to write corrupted values");

    cli_in(data_dir)
        .arg("workout")
        .write_stdin("skip\nskip\nskip\n=20\n\nok\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Squats: 135 lbs → 140 lbs"))
        .stdout(predicate::str::contains("Could not save workout"));

    // The batch update could not merge into the corrupt file
    let content = fs::read_to_string(&values_path).unwrap();
    assert_eq!(content, "not json at all");
}

#[test]
fn test_corrupted_wal_lines_skipped() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(
        data_dir.join("wal/log.wal"),
        format!("{{ invalid json }}\n{}\n{{ more invalid }}\n", VALID_ENTRY),
    )
    .expect("Failed to write WAL");

    cli_in(data_dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("Squats"))
        .stdout(predicate::str::contains("135 lbs × 20 ✓"));
}

#[test]
fn test_partial_last_line_tolerated() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let wal_path = data_dir.join("wal/log.wal");

    let mut file = fs::File::create(&wal_path).expect("Failed to create WAL");
    writeln!(file, "{}", VALID_ENTRY).unwrap();
    write!(file, r#"{{"date":"2024-03-21","timestamp":"#).unwrap();
    drop(file);

    let output = cli_in(data_dir)
        .arg("history")
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let days: serde_json::Value = serde_json::from_slice(&output).expect("history JSON");
    assert_eq!(days.as_array().unwrap().len(), 1);

    // New entries still append after the torn line
    cli_in(data_dir)
        .arg("workout")
        .write_stdin("\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout saved"));

    let content = fs::read_to_string(&wal_path).unwrap();
    let rower_lines = content
        .lines()
        .filter(|line| line.starts_with('{') && line.contains("\"rower\""))
        .count();
    assert_eq!(rower_lines, 1);
}

#[test]
fn test_old_entries_without_new_value_are_backfilled() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    let entry = VALID_ENTRY.replace(r#","new_value":140.0"#, "");
    fs::write(data_dir.join("wal/log.wal"), format!("{}\n", entry)).unwrap();

    let output = cli_in(data_dir)
        .arg("dashboard")
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let view: serde_json::Value = serde_json::from_slice(&output).expect("dashboard JSON");
    assert_eq!(view["recent_gains"][0]["value_text"], "140 lbs");
}

#[test]
fn test_unwritable_wal_reports_failed_save() {
    let temp_dir = tempfile::tempdir().unwrap();
    let data_dir = temp_dir.path();
    fs::write(data_dir.join("config.toml"), "").unwrap();
    fs::create_dir_all(data_dir.join("wal")).unwrap();
    // A directory where the log file should be makes every append fail
    fs::create_dir_all(data_dir.join("wal/log.wal")).unwrap();

    cli_in(data_dir)
        .arg("workout")
        .write_stdin("\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Could not save workout"))
        .stdout(predicate::str::contains("Sync status: error"));
}

#[test]
fn test_invalid_config_file_fails() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("config.toml"), "[goals]\nweekly_goal = \"three\"\n").unwrap();

    cli_in(data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Toml"));
}

#[test]
fn test_invalid_catalog_override_fails() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    fs::write(
        data_dir.join("config.toml"),
        r#"
[[catalog.exercises]]
id = "squats"
name = "Squats"
kind = "weighted"
start_value = 135.0
increment = 0.0
unit = "lbs"
target_reps = 20
"#,
    )
    .unwrap();

    cli_in(data_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("CatalogValidation"));
}
