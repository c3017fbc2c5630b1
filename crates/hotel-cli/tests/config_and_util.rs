//! Integration tests for training config parsing and util helpers.

use std::path::Path;
use std::sync::Mutex;

use hotel_cli::server::{resolve_port, DEFAULT_PORT};
use hotel_cli::training::input::TrainConfig;
use hotel_cli::util::{read_record, report_path, validate_csv_file};

// ---------------------------------------------------------------------------
// validate_csv_file
// ---------------------------------------------------------------------------

#[test]
fn validate_csv_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    std::fs::File::create(&path).unwrap();
    assert!(validate_csv_file(path.to_str().unwrap()).is_ok());
}

#[test]
fn validate_wrong_extension_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.tsv");
    std::fs::File::create(&path).unwrap();
    assert!(validate_csv_file(path.to_str().unwrap()).is_err());
}

#[test]
fn validate_nonexistent_file_errors() {
    assert!(validate_csv_file("/nonexistent/path/data.csv").is_err());
}

// ---------------------------------------------------------------------------
// TrainConfig
// ---------------------------------------------------------------------------

#[test]
fn train_config_defaults() {
    let cfg = TrainConfig::default();
    assert_eq!(cfg.train_data, "hotel_bookings.csv");
    assert_eq!(cfg.output_file, "hotel_booking_model.json");
    assert_eq!(cfg.target_column, "is_canceled");
    assert_eq!(
        cfg.drop_columns,
        vec!["reservation_status", "reservation_status_date"]
    );
    assert_eq!(cfg.test_fraction, 0.2);
    assert_eq!(cfg.seed, 42);
    assert_eq!(cfg.grid.len(), 27);
    assert!(cfg.report);
}

#[test]
fn partial_config_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train.json");
    std::fs::write(&path, r#"{"cv": 3, "skip_grid_search": true}"#).unwrap();

    let cfg = TrainConfig::load(&path).unwrap();
    assert_eq!(cfg.cv, 3);
    assert!(cfg.skip_grid_search);
    assert_eq!(cfg.output_file, "hotel_booking_model.json");
}

#[test]
fn malformed_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("train.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(TrainConfig::load(&path).is_err());
}

#[test]
fn config_round_trips_through_json() {
    let cfg = TrainConfig::default();
    let json = serde_json::to_string_pretty(&cfg).unwrap();
    let back: TrainConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cfg);
}

#[test]
fn validate_rejects_bad_fraction_and_folds() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data.csv");
    std::fs::File::create(&data).unwrap();

    let mut cfg = TrainConfig {
        train_data: data.to_str().unwrap().to_string(),
        ..TrainConfig::default()
    };
    assert!(cfg.validate().is_ok());

    cfg.test_fraction = 1.0;
    assert!(cfg.validate().is_err());

    cfg.test_fraction = 0.2;
    cfg.cv = 1;
    assert!(cfg.validate().is_err());
    cfg.skip_grid_search = true;
    assert!(cfg.validate().is_ok());
}

// ---------------------------------------------------------------------------
// resolve_port
// ---------------------------------------------------------------------------

// PORT is process-wide, so tests that touch it take this lock.
static PORT_ENV: Mutex<()> = Mutex::new(());

#[test]
fn port_precedence_flag_env_default() {
    let _guard = PORT_ENV.lock().unwrap_or_else(|e| e.into_inner());

    std::env::remove_var("PORT");
    assert_eq!(resolve_port(None).unwrap(), DEFAULT_PORT);
    assert_eq!(DEFAULT_PORT, 5000);

    std::env::set_var("PORT", "8123");
    assert_eq!(resolve_port(None).unwrap(), 8123);
    assert_eq!(resolve_port(Some(9)).unwrap(), 9);

    std::env::set_var("PORT", "abc");
    assert!(resolve_port(None).is_err());

    std::env::remove_var("PORT");
}

// ---------------------------------------------------------------------------
// util
// ---------------------------------------------------------------------------

#[test]
fn report_sits_next_to_artifact() {
    assert_eq!(
        report_path(Path::new("out/hotel_booking_model.json")),
        Path::new("out/hotel_booking_model_report.html")
    );
}

#[test]
fn read_record_requires_an_object() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record.json");
    std::fs::write(&path, "[1, 2]").unwrap();
    assert!(read_record(&path).is_err());

    std::fs::write(&path, r#"{"lead_time": 3}"#).unwrap();
    assert_eq!(read_record(&path).unwrap().len(), 1);
}
