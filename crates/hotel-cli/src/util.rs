use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hotel_classifiers::BookingRecord;

pub fn validate_csv_file(path: &str) -> Result<()> {
    let pb = PathBuf::from(path);

    let ext = pb.extension().and_then(|s| s.to_str()).map(|s| s.to_lowercase());
    if ext.as_deref() != Some("csv") {
        anyhow::bail!("File must have a .csv extension: {}", path);
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }

    Ok(())
}

/// Read a single booking record (a JSON object) from disk.
pub fn read_record(path: &Path) -> Result<BookingRecord> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read record file: {:?}", path))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse record file: {:?}", path))?;
    match value {
        serde_json::Value::Object(record) => Ok(record),
        other => anyhow::bail!("Record must be a JSON object, got: {}", other),
    }
}

/// `<dir>/<stem>_report.html` next to the artifact.
pub fn report_path(artifact: &Path) -> PathBuf {
    let stem = artifact
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("hotel_booking_model");
    artifact.with_file_name(format!("{}_report.html", stem))
}
