//! CLI binary smoke tests using assert_cmd.
//!
//! These tests exercise the compiled `hotel` binary to verify that argument
//! parsing, training, offline prediction and error handling work end-to-end.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::{fitted_pipeline, minimal_record, SAMPLE};

fn cmd() -> Command {
    Command::cargo_bin("hotel").unwrap()
}

// ---------------------------------------------------------------------------
// Top-level
// ---------------------------------------------------------------------------

#[test]
fn no_args_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_subcommands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("train"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("ui"))
        .stdout(predicate::str::contains("predict"));
}

#[test]
fn version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hotel"));
}

// ---------------------------------------------------------------------------
// train
// ---------------------------------------------------------------------------

#[test]
fn train_without_data_prints_defaults_and_fails() {
    let dir = tempfile::tempdir().unwrap();
    cmd()
        .current_dir(dir.path())
        .arg("train")
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"train_data\": \"hotel_bookings.csv\""))
        .stderr(predicate::str::contains("No config file provided"));
    assert!(!dir.path().join("hotel_booking_model.json").exists());
}

#[test]
fn train_nonexistent_config_errors() {
    cmd()
        .args(["train", "/nonexistent/config.json"])
        .assert()
        .failure();
}

#[test]
fn train_skip_grid_search_writes_artifact_only() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("model.json");
    cmd()
        .args(["train", "--skip-grid-search", "--no-report", "--train_data", SAMPLE])
        .arg("--output_file")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("weighted avg"));
    assert!(output.exists());
    assert!(!dir.path().join("model_report.html").exists());
}

#[test]
fn train_with_config_runs_grid_search_and_report() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("tuned.json");
    let config = dir.path().join("train.json");
    let json = serde_json::json!({
        "train_data": SAMPLE,
        "output_file": output,
        "cv": 3,
        "model": {"seed": 3, "RandomForest": {"n_estimators": 10, "max_depth": 5, "min_samples_split": 2}},
        "grid": {"n_estimators": [5, 10], "max_depth": [3, null], "min_samples_split": [2]}
    });
    std::fs::write(&config, json.to_string()).unwrap();

    cmd().arg("train").arg(&config).assert().success();
    assert!(output.exists());
    let report = std::fs::read_to_string(dir.path().join("tuned_report.html")).unwrap();
    assert!(report.contains("Grid search"));
    assert!(report.contains("Tuned model"));
}

#[test]
fn train_rejects_corrupt_target() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("bad.csv");
    std::fs::write(
        &data,
        "hotel,lead_time,is_canceled\nCity Hotel,3,0\nCity Hotel,9,maybe\n",
    )
    .unwrap();
    let output = dir.path().join("model.json");
    cmd()
        .args(["train", "--skip-grid-search", "--no-report", "--train_data"])
        .arg(&data)
        .arg("--output_file")
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Training failed"));
    assert!(!output.exists());
}

// ---------------------------------------------------------------------------
// predict
// ---------------------------------------------------------------------------

#[test]
fn predict_prints_service_json() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("model.json");
    fitted_pipeline().save(&model).unwrap();
    let record = dir.path().join("record.json");
    std::fs::write(&record, minimal_record().to_string()).unwrap();

    cmd()
        .arg("predict")
        .arg("--model")
        .arg(&model)
        .arg(&record)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"prediction\":"))
        .stdout(predicate::str::contains("\"probability\":"));
}

#[test]
fn predict_missing_artifact_errors() {
    let dir = tempfile::tempdir().unwrap();
    let record = dir.path().join("record.json");
    std::fs::write(&record, minimal_record().to_string()).unwrap();

    cmd()
        .args(["predict", "--model", "/nonexistent/model.json"])
        .arg(&record)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Prediction failed"));
}

// ---------------------------------------------------------------------------
// serve
// ---------------------------------------------------------------------------

#[test]
fn serve_missing_artifact_errors() {
    cmd()
        .args(["serve", "--model", "/nonexistent/model.json", "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Server failed"));
}

#[test]
fn serve_rejects_bad_port() {
    cmd()
        .args(["serve", "--port", "not-a-port"])
        .assert()
        .failure();
}
