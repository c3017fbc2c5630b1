//! Exhaustive hyper-parameter search scored by stratified k-fold
//! cross-validation accuracy.
//!
//! Every fold refits the whole pipeline (preprocessor and forest) on the
//! fold's training rows, so validation rows never leak into the imputation or
//! scaling statistics.
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::config::{ForestParams, ModelConfig};
use crate::data_handling::{stratified_kfold, RawTable};
use crate::error::{ClassifierError, Result};
use crate::models::{build_model, ClassifierModel};
use crate::preprocessing::Preprocessor;
use crate::stats::accuracy;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ParamGrid {
    pub n_estimators: Vec<usize>,
    pub max_depth: Vec<Option<usize>>,
    pub min_samples_split: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        ParamGrid {
            n_estimators: vec![50, 100, 200],
            max_depth: vec![None, Some(10), Some(20)],
            min_samples_split: vec![2, 5, 10],
        }
    }
}

impl ParamGrid {
    /// All combinations, `max_depth` varying slowest and `n_estimators`
    /// fastest.
    pub fn candidates(&self) -> Vec<ForestParams> {
        let mut out = Vec::with_capacity(self.len());
        for &max_depth in &self.max_depth {
            for &min_samples_split in &self.min_samples_split {
                for &n_estimators in &self.n_estimators {
                    out.push(ForestParams {
                        n_estimators,
                        max_depth,
                        min_samples_split,
                    });
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.n_estimators.len() * self.max_depth.len() * self.min_samples_split.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub params: ForestParams,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSearchResult {
    pub best_params: ForestParams,
    pub best_score: f64,
    /// In grid order.
    pub candidates: Vec<CandidateResult>,
}

#[derive(Debug, Clone)]
pub struct GridSearch {
    pub grid: ParamGrid,
    pub cv: usize,
    /// Seed and feature sampling shared by every candidate.
    pub base: ModelConfig,
}

impl GridSearch {
    pub fn new(grid: ParamGrid, cv: usize, base: ModelConfig) -> Self {
        GridSearch { grid, cv, base }
    }

    pub fn run(&self, table: &RawTable, labels: &[u8]) -> Result<GridSearchResult> {
        if self.grid.is_empty() {
            return Err(ClassifierError::InvalidConfig(
                "parameter grid has an empty axis".to_string(),
            ));
        }
        if table.nrows() != labels.len() {
            return Err(ClassifierError::InvalidConfig(format!(
                "{} rows but {} labels",
                table.nrows(),
                labels.len()
            )));
        }

        let candidates = self.grid.candidates();
        let folds = stratified_kfold(labels, self.cv)?;
        log::info!(
            "Grid search: {} candidates x {} folds = {} fits",
            candidates.len(),
            folds.len(),
            candidates.len() * folds.len()
        );

        let mut scores = vec![Vec::with_capacity(folds.len()); candidates.len()];
        for (fold_idx, (train_idx, valid_idx)) in folds.iter().enumerate() {
            let train = table.select_rows(train_idx);
            let valid = table.select_rows(valid_idx);
            let y_train: Vec<u8> = train_idx.iter().map(|&i| labels[i]).collect();
            let y_valid: Vec<u8> = valid_idx.iter().map(|&i| labels[i]).collect();

            let preprocessor = Preprocessor::fit(&train)?;
            let x_train = preprocessor.transform(&train)?;
            let x_valid = preprocessor.transform(&valid)?;

            let fold_scores = candidates
                .par_iter()
                .map(|params| -> Result<f64> {
                    let mut model = build_model(&self.base.with_params(*params));
                    model.fit(&x_train, &y_train)?;
                    let predicted = model.predict(&x_valid)?;
                    Ok(accuracy(&y_valid, &predicted))
                })
                .collect::<Result<Vec<f64>>>()?;

            for (candidate_scores, score) in scores.iter_mut().zip(fold_scores) {
                candidate_scores.push(score);
            }
            log::debug!("Fold {}/{} scored", fold_idx + 1, folds.len());
        }

        let results: Vec<CandidateResult> = candidates
            .into_iter()
            .zip(scores)
            .map(|(params, fold_scores)| {
                let mean_score = fold_scores.iter().mean();
                let std_score = fold_scores.iter().population_std_dev();
                log::debug!(
                    "{}: mean accuracy {:.4} (+/- {:.4})",
                    params,
                    mean_score,
                    std_score
                );
                CandidateResult {
                    params,
                    fold_scores,
                    mean_score,
                    std_score,
                }
            })
            .collect();

        // First candidate wins ties.
        let best = results
            .iter()
            .fold(&results[0], |best, c| {
                if c.mean_score > best.mean_score {
                    c
                } else {
                    best
                }
            })
            .clone();

        Ok(GridSearchResult {
            best_params: best.params,
            best_score: best.mean_score,
            candidates: results,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_grid_has_27_candidates() {
        let grid = ParamGrid::default();
        let candidates = grid.candidates();
        assert_eq!(candidates.len(), 27);
        assert_eq!(
            candidates[0],
            ForestParams {
                n_estimators: 50,
                max_depth: None,
                min_samples_split: 2
            }
        );
        assert_eq!(
            candidates[1],
            ForestParams {
                n_estimators: 100,
                max_depth: None,
                min_samples_split: 2
            }
        );
    }

    #[test]
    fn empty_axis_is_rejected() {
        let search = GridSearch::new(
            ParamGrid {
                n_estimators: vec![],
                ..ParamGrid::default()
            },
            3,
            ModelConfig::default(),
        );
        let table = RawTable::new(vec![], vec![]);
        assert!(matches!(
            search.run(&table, &[]),
            Err(ClassifierError::InvalidConfig(_))
        ));
    }
}
