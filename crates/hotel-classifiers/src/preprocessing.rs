//! Feature preprocessor: imputation, standardization and one-hot encoding.
//!
//! Fitting freezes medians, modes, means, standard deviations and
//! vocabularies from the training rows. Transforming only ever applies those
//! frozen parameters, so a single inference row is encoded exactly like the
//! training matrix was.
use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

use crate::data_handling::RawTable;
use crate::error::{ClassifierError, Result};
use crate::schema::{FieldKind, FieldSpec, RawValue};

/// Frozen parameters for one numeric column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub index: usize,
    pub name: String,
    pub median: f64,
    pub mean: f64,
    pub scale: f64,
}

impl NumericColumn {
    /// Standard deviations below this are treated as a constant column.
    const MIN_STD: f64 = 1e-12;

    fn encode(&self, value: &RawValue) -> f64 {
        let v = match value {
            RawValue::Number(v) => *v,
            _ => self.median,
        };
        (v - self.mean) / self.scale
    }
}

/// Frozen parameters for one categorical column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub index: usize,
    pub name: String,
    pub mode: String,
    /// Sorted, de-duplicated categories seen at fit time.
    pub vocabulary: Vec<String>,
}

impl CategoricalColumn {
    /// Position of the indicator for `value`, `None` for unseen categories.
    fn slot(&self, value: &RawValue) -> Option<usize> {
        let category = match value {
            RawValue::Text(s) => s.as_str(),
            RawValue::Number(_) => return None,
            RawValue::Missing => self.mode.as_str(),
        };
        self.vocabulary
            .binary_search_by(|known| known.as_str().cmp(category))
            .ok()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    pub columns: Vec<FieldSpec>,
    pub numeric: Vec<NumericColumn>,
    pub categorical: Vec<CategoricalColumn>,
}

impl Preprocessor {
    /// Fit imputation, scaling and encoding parameters on `table`.
    pub fn fit(table: &RawTable) -> Result<Preprocessor> {
        if table.nrows() == 0 {
            return Err(ClassifierError::InvalidConfig(
                "cannot fit the preprocessor on an empty table".to_string(),
            ));
        }

        let mut numeric = Vec::new();
        let mut categorical = Vec::new();

        for (index, column) in table.columns.iter().enumerate() {
            match column.kind {
                FieldKind::Numeric => numeric.push(fit_numeric(table, index, &column.name)?),
                FieldKind::Categorical => {
                    categorical.push(fit_categorical(table, index, &column.name)?)
                }
            }
        }

        log::debug!(
            "Fitted preprocessor: {} numeric columns, {} categorical columns, {} output features",
            numeric.len(),
            categorical.len(),
            numeric.len()
                + categorical
                    .iter()
                    .map(|c| c.vocabulary.len())
                    .sum::<usize>()
        );

        Ok(Preprocessor {
            columns: table.columns.clone(),
            numeric,
            categorical,
        })
    }

    /// Width of the feature matrix produced by `transform`.
    pub fn n_features(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|c| c.vocabulary.len())
                .sum::<usize>()
    }

    pub fn feature_names(&self) -> Vec<String> {
        let numeric = self.numeric.iter().map(|c| format!("num__{}", c.name));
        let categorical = self.categorical.iter().flat_map(|c| {
            c.vocabulary
                .iter()
                .map(move |value| format!("cat__{}_{}", c.name, value))
        });
        numeric.chain(categorical).collect()
    }

    /// Fit-time vocabulary of every categorical column.
    pub fn vocabularies(&self) -> BTreeMap<String, Vec<String>> {
        self.categorical
            .iter()
            .map(|c| (c.name.clone(), c.vocabulary.clone()))
            .collect()
    }

    /// Encode one raw row (in fitted column order).
    pub fn transform_row(&self, row: &[RawValue], out: &mut [f64]) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ClassifierError::FeatureMismatch {
                expected: self.columns.len(),
                found: row.len(),
            });
        }

        out.iter_mut().for_each(|v| *v = 0.0);
        for (pos, column) in self.numeric.iter().enumerate() {
            out[pos] = column.encode(&row[column.index]);
        }

        let mut offset = self.numeric.len();
        for column in &self.categorical {
            if let Some(slot) = column.slot(&row[column.index]) {
                out[offset + slot] = 1.0;
            }
            offset += column.vocabulary.len();
        }
        Ok(())
    }

    pub fn transform_rows(&self, rows: &[Vec<RawValue>]) -> Result<Array2<f64>> {
        let width = self.n_features();
        let mut data = vec![0.0f64; rows.len() * width];
        let mut scratch = Vec::new();
        for (i, row) in rows.iter().enumerate() {
            let out = if width == 0 {
                &mut scratch[..]
            } else {
                &mut data[i * width..(i + 1) * width]
            };
            self.transform_row(row, out)?;
        }
        Array2::from_shape_vec((rows.len(), width), data)
            .map_err(|e| ClassifierError::InvalidConfig(e.to_string()))
    }

    /// Encode a table whose columns must match the fitted ones by name and kind.
    pub fn transform(&self, table: &RawTable) -> Result<Array2<f64>> {
        if table.columns != self.columns {
            return Err(ClassifierError::SchemaMismatch(format!(
                "table columns {:?} do not match fitted columns {:?}",
                table.column_names(),
                self.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>()
            )));
        }
        self.transform_rows(&table.rows)
    }
}

fn fit_numeric(table: &RawTable, index: usize, name: &str) -> Result<NumericColumn> {
    let observed: Vec<f64> = table
        .rows
        .iter()
        .filter_map(|row| match row[index] {
            RawValue::Number(v) => Some(v),
            _ => None,
        })
        .collect();
    if observed.is_empty() {
        return Err(ClassifierError::EmptyColumn(name.to_string()));
    }
    let median = Data::new(observed).median();

    let imputed: Vec<f64> = table
        .rows
        .iter()
        .map(|row| match row[index] {
            RawValue::Number(v) => v,
            _ => median,
        })
        .collect();
    let mean = imputed.iter().mean();
    let std = imputed.iter().population_std_dev();
    if !(median.is_finite() && mean.is_finite() && std.is_finite()) {
        return Err(ClassifierError::invalid_value(
            name,
            "column statistics are not finite",
        ));
    }
    let scale = if std > NumericColumn::MIN_STD { std } else { 1.0 };

    Ok(NumericColumn {
        index,
        name: name.to_string(),
        median,
        mean,
        scale,
    })
}

fn fit_categorical(table: &RawTable, index: usize, name: &str) -> Result<CategoricalColumn> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in &table.rows {
        match &row[index] {
            RawValue::Text(s) => *counts.entry(s.clone()).or_default() += 1,
            RawValue::Number(v) => *counts.entry(v.to_string()).or_default() += 1,
            RawValue::Missing => {}
        }
    }

    // BTreeMap iterates in sorted order, so the first maximum is the
    // lexicographically smallest tie.
    let mode = counts
        .iter()
        .fold(None::<(&String, usize)>, |best, (value, &count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((value, count)),
        })
        .map(|(value, _)| value.clone())
        .ok_or_else(|| ClassifierError::EmptyColumn(name.to_string()))?;

    Ok(CategoricalColumn {
        index,
        name: name.to_string(),
        mode,
        vocabulary: counts.into_keys().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RawTable {
        RawTable::new(
            vec![
                FieldSpec::new("lead_time", FieldKind::Numeric),
                FieldSpec::new("meal", FieldKind::Categorical),
            ],
            vec![
                vec![RawValue::Number(1.0), RawValue::Text("BB".into())],
                vec![RawValue::Number(2.0), RawValue::Text("HB".into())],
                vec![RawValue::Missing, RawValue::Text("BB".into())],
                vec![RawValue::Number(10.0), RawValue::Missing],
            ],
        )
    }

    #[test]
    fn fit_freezes_median_and_mode() {
        let pre = Preprocessor::fit(&table()).unwrap();
        assert_eq!(pre.numeric[0].median, 2.0);
        assert_eq!(pre.categorical[0].mode, "BB");
        assert_eq!(pre.categorical[0].vocabulary, vec!["BB", "HB"]);
        assert_eq!(pre.n_features(), 3);
        assert_eq!(
            pre.feature_names(),
            vec!["num__lead_time", "cat__meal_BB", "cat__meal_HB"]
        );
    }

    #[test]
    fn transform_standardizes_with_fit_statistics() {
        let pre = Preprocessor::fit(&table()).unwrap();
        let x = pre.transform(&table()).unwrap();
        let col = x.column(0);
        let mean = col.sum() / col.len() as f64;
        assert!(mean.abs() < 1e-9, "mean = {}", mean);

        // Missing category imputed with the mode.
        assert_eq!(x[[3, 1]], 1.0);
        assert_eq!(x[[3, 2]], 0.0);
    }

    #[test]
    fn unseen_category_encodes_to_zeros() {
        let pre = Preprocessor::fit(&table()).unwrap();
        let mut out = vec![9.0; pre.n_features()];
        pre.transform_row(
            &[RawValue::Number(2.0), RawValue::Text("Undefined".into())],
            &mut out,
        )
        .unwrap();
        assert_eq!(&out[1..], &[0.0, 0.0]);
    }

    #[test]
    fn inference_rows_do_not_refit() {
        let pre = Preprocessor::fit(&table()).unwrap();
        let single = pre
            .transform_rows(&[vec![RawValue::Missing, RawValue::Text("HB".into())]])
            .unwrap();
        let expected = (2.0 - pre.numeric[0].mean) / pre.numeric[0].scale;
        assert!((single[[0, 0]] - expected).abs() < 1e-12);
    }

    #[test]
    fn constant_column_keeps_unit_scale() {
        let table = RawTable::new(
            vec![FieldSpec::new("babies", FieldKind::Numeric)],
            vec![vec![RawValue::Number(0.0)], vec![RawValue::Number(0.0)]],
        );
        let pre = Preprocessor::fit(&table).unwrap();
        assert_eq!(pre.numeric[0].scale, 1.0);
    }

    #[test]
    fn all_missing_column_fails_fit() {
        let table = RawTable::new(
            vec![FieldSpec::new("company", FieldKind::Numeric)],
            vec![vec![RawValue::Missing]],
        );
        assert!(matches!(
            Preprocessor::fit(&table),
            Err(ClassifierError::EmptyColumn(_))
        ));
    }

    #[test]
    fn fit_categorical_breaks_mode_ties_lexicographically() {
        let table = RawTable::new(
            vec![FieldSpec::new("meal", FieldKind::Categorical)],
            vec![
                vec![RawValue::Text("HB".into())],
                vec![RawValue::Text("BB".into())],
                vec![RawValue::Missing],
            ],
        );
        let pre = Preprocessor::fit(&table).unwrap();
        assert_eq!(pre.categorical[0].mode, "BB");
    }

    #[test]
    fn even_count_median_averages_middle_values() {
        let table = RawTable::new(
            vec![FieldSpec::new("adr", FieldKind::Numeric)],
            [4.0, 1.0, 3.0, 2.0]
                .iter()
                .map(|&v| vec![RawValue::Number(v)])
                .collect(),
        );
        let pre = Preprocessor::fit(&table).unwrap();
        assert!((pre.numeric[0].median - 2.5).abs() < 1e-12);
    }

    #[test]
    fn non_finite_numbers_fail_fit() {
        let table = RawTable::new(
            vec![FieldSpec::new("adr", FieldKind::Numeric)],
            vec![
                vec![RawValue::Number(1.0)],
                vec![RawValue::Number(f64::INFINITY)],
            ],
        );
        assert!(matches!(
            Preprocessor::fit(&table),
            Err(ClassifierError::InvalidValue { .. })
        ));
    }

    #[test]
    fn wrong_row_width_is_rejected() {
        let pre = Preprocessor::fit(&table()).unwrap();
        let mut out = vec![0.0; pre.n_features()];
        assert!(matches!(
            pre.transform_row(&[RawValue::Number(1.0)], &mut out),
            Err(ClassifierError::FeatureMismatch { .. })
        ));
    }
}
