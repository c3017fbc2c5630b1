//! Raw booking tables and the train/test and cross-validation splits.
//!
//! `RawTable` holds cells exactly as read from the CSV (numbers, strings or
//! missing markers). Nothing here imputes or encodes; that is the job of the
//! fitted `Preprocessor`.
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{ClassifierError, Result};
use crate::schema::{is_missing_token, FieldKind, FieldSpec, RawValue};

/// Columns that are only populated once the booking outcome is known.
pub const LEAKAGE_COLUMNS: &[&str] = &["reservation_status", "reservation_status_date"];

pub const TARGET_COLUMN: &str = "is_canceled";

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub columns: Vec<FieldSpec>,
    pub rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<FieldSpec>, rows: Vec<Vec<RawValue>>) -> Self {
        RawTable { columns, rows }
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn log_input_data_summary(&self) {
        let numeric = self
            .columns
            .iter()
            .filter(|c| c.kind == FieldKind::Numeric)
            .count();
        let missing: usize = self
            .rows
            .iter()
            .map(|row| row.iter().filter(|v| v.is_missing()).count())
            .sum();
        log::info!(
            "Loaded {} bookings with {} columns ({} numeric, {} categorical), {} missing cells",
            self.nrows(),
            self.ncols(),
            numeric,
            self.ncols() - numeric,
            missing
        );
    }

    /// Remove the named columns. Names that are not present are skipped.
    pub fn drop_columns(&mut self, names: &[&str]) {
        for name in names {
            match self.column_index(name) {
                Some(idx) => {
                    self.columns.remove(idx);
                    for row in self.rows.iter_mut() {
                        row.remove(idx);
                    }
                    log::debug!("Dropped column '{}'", name);
                }
                None => log::warn!("Column '{}' not found, nothing to drop", name),
            }
        }
    }

    /// Detach the binary label column from the features.
    ///
    /// The target must be a numeric column holding only 0 and 1.
    pub fn split_target(mut self, name: &str) -> Result<(RawTable, Vec<u8>)> {
        let invalid = |reason: String| ClassifierError::InvalidTarget {
            column: name.to_string(),
            reason,
        };

        let idx = self
            .column_index(name)
            .ok_or_else(|| invalid("column not found".to_string()))?;
        self.columns.remove(idx);

        let mut labels = Vec::with_capacity(self.rows.len());
        for (row_idx, row) in self.rows.iter_mut().enumerate() {
            match row.remove(idx) {
                RawValue::Number(v) if v == 0.0 => labels.push(0),
                RawValue::Number(v) if v == 1.0 => labels.push(1),
                other => {
                    return Err(invalid(format!(
                        "row {} holds {:?}, expected 0 or 1",
                        row_idx + 1,
                        other
                    )))
                }
            }
        }

        Ok((self, labels))
    }

    pub fn select_rows(&self, indices: &[usize]) -> RawTable {
        RawTable {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}

/// Read a comma separated bookings file with a header row.
///
/// Column kinds are inferred: a column is numeric when every non-missing
/// cell parses as a float, categorical otherwise.
pub fn read_bookings_csv<P: AsRef<Path>>(path: P) -> Result<RawTable> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path.as_ref())?;
    read_bookings(reader)
}

/// Same as `read_bookings_csv` but over any reader.
pub fn read_bookings<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<RawTable> {
    let headers = reader.headers()?.clone();
    let names: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

    let mut cells: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        cells.push(record.iter().map(str::to_string).collect());
    }

    let kinds = (0..names.len())
        .map(|col| infer_kind(&names[col], &cells, col))
        .collect::<Result<Vec<FieldKind>>>()?;

    let rows = cells
        .iter()
        .map(|row| {
            row.iter()
                .zip(kinds.iter())
                .map(|(cell, kind)| {
                    RawValue::parse_cell(cell, *kind).unwrap_or(RawValue::Missing)
                })
                .collect()
        })
        .collect();

    let columns = names
        .into_iter()
        .zip(kinds)
        .map(|(name, kind)| FieldSpec::new(name, kind))
        .collect();

    Ok(RawTable::new(columns, rows))
}

/// Numeric when every non-missing cell parses as a float. A column that is
/// numeric apart from non-finite cells (`inf`, `-infinity`) is rejected.
fn infer_kind(name: &str, cells: &[Vec<String>], col: usize) -> Result<FieldKind> {
    let mut non_finite = None;
    for (row_idx, row) in cells.iter().enumerate() {
        let cell = &row[col];
        if is_missing_token(cell) {
            continue;
        }
        match cell.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => {}
            Ok(_) => {
                non_finite.get_or_insert((row_idx, cell.trim()));
            }
            Err(_) => return Ok(FieldKind::Categorical),
        }
    }
    match non_finite {
        Some((row_idx, cell)) => Err(ClassifierError::invalid_value(
            name,
            format!("row {}: '{}' is not a finite number", row_idx + 1, cell),
        )),
        None => Ok(FieldKind::Numeric),
    }
}

fn indices_by_class(labels: &[u8]) -> [Vec<usize>; 2] {
    let mut by_class = [Vec::new(), Vec::new()];
    for (i, &label) in labels.iter().enumerate() {
        by_class[usize::from(label.min(1))].push(i);
    }
    by_class
}

/// Stratified shuffle split.
///
/// Each class contributes `round(n_class * test_fraction)` rows to the test
/// split. Both returned index lists are sorted.
pub fn stratified_split(
    labels: &[u8],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
        return Err(ClassifierError::InvalidConfig(format!(
            "test_fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for mut class_indices in indices_by_class(labels) {
        class_indices.shuffle(&mut rng);
        let n_test = (class_indices.len() as f64 * test_fraction).round() as usize;
        test.extend_from_slice(&class_indices[..n_test]);
        train.extend_from_slice(&class_indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Deterministic stratified k-fold: rows of each class are dealt
/// round-robin over the folds. Returns `(train, validation)` index pairs.
pub fn stratified_kfold(labels: &[u8], k: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
    if k < 2 {
        return Err(ClassifierError::InvalidConfig(format!(
            "cross-validation needs at least 2 folds, got {}",
            k
        )));
    }
    if labels.len() < k {
        return Err(ClassifierError::InvalidConfig(format!(
            "cannot split {} rows into {} folds",
            labels.len(),
            k
        )));
    }

    let mut fold_of = vec![0usize; labels.len()];
    let mut offset = 0;
    for class_indices in indices_by_class(labels) {
        for (pos, &row) in class_indices.iter().enumerate() {
            fold_of[row] = (pos + offset) % k;
        }
        offset += class_indices.len();
    }

    Ok((0..k)
        .map(|fold| {
            let (valid, train): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&row| fold_of[row] == fold);
            (train, valid)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
hotel,is_canceled,lead_time,country,agent,reservation_status
City Hotel,0,10,PRT,9,Check-Out
Resort Hotel,1,120,GBR,NULL,Canceled
City Hotel,1,,NULL,240,Canceled
";

    fn sample() -> RawTable {
        read_bookings(csv::Reader::from_reader(SAMPLE.as_bytes())).unwrap()
    }

    #[test]
    fn infers_column_kinds() {
        let table = sample();
        let kinds: Vec<FieldKind> = table.columns.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FieldKind::Categorical,
                FieldKind::Numeric,
                FieldKind::Numeric,
                FieldKind::Categorical,
                FieldKind::Numeric,
                FieldKind::Categorical,
            ]
        );
        assert_eq!(table.rows[2][2], RawValue::Missing);
        assert_eq!(table.rows[1][4], RawValue::Missing);
        assert_eq!(table.rows[2][3], RawValue::Missing);
    }

    #[test]
    fn infinite_cell_aborts_loading() {
        let csv = "adr,meal,is_canceled\n1.0,BB,0\ninf,HB,1\n3.5,BB,0\n";
        let err = read_bookings(csv::Reader::from_reader(csv.as_bytes())).unwrap_err();
        match err {
            ClassifierError::InvalidValue { field, reason } => {
                assert_eq!(field, "adr");
                assert!(reason.contains("row 2"), "{}", reason);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn drop_and_split_target() {
        let mut table = sample();
        table.drop_columns(LEAKAGE_COLUMNS);
        let (features, labels) = table.split_target(TARGET_COLUMN).unwrap();
        assert_eq!(labels, vec![0, 1, 1]);
        assert_eq!(
            features.column_names(),
            vec!["hotel", "lead_time", "country", "agent"]
        );
        assert!(features.rows.iter().all(|r| r.len() == 4));
    }

    #[test]
    fn split_target_rejects_non_binary_labels() {
        let csv = "a,is_canceled\nx,2\n";
        let table = read_bookings(csv::Reader::from_reader(csv.as_bytes())).unwrap();
        assert!(matches!(
            table.split_target(TARGET_COLUMN),
            Err(ClassifierError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn stratified_split_preserves_class_ratio() {
        let labels: Vec<u8> = (0..100).map(|i| u8::from(i % 4 == 0)).collect();
        let (train, test) = stratified_split(&labels, 0.2, 42).unwrap();
        assert_eq!(train.len() + test.len(), 100);
        assert_eq!(test.len(), 20);
        assert_eq!(test.iter().filter(|&&i| labels[i] == 1).count(), 5);

        let again = stratified_split(&labels, 0.2, 42).unwrap();
        assert_eq!((train, test), again);
    }

    #[test]
    fn kfold_covers_every_row_once() {
        let labels: Vec<u8> = (0..23).map(|i| u8::from(i % 3 == 0)).collect();
        let folds = stratified_kfold(&labels, 5).unwrap();
        assert_eq!(folds.len(), 5);
        let mut seen: Vec<usize> = folds.iter().flat_map(|(_, v)| v.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..23).collect::<Vec<_>>());
        for (train, valid) in &folds {
            assert_eq!(train.len() + valid.len(), 23);
        }
    }

    #[test]
    fn kfold_rejects_single_fold() {
        assert!(stratified_kfold(&[0, 1, 0], 1).is_err());
    }
}
