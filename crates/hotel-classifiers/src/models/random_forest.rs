use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{ForestParams, MaxFeatures};
use crate::error::{ClassifierError, Result};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::decision_tree::{DecisionTree, TreeParams};

/// Bagged ensemble of CART trees.
///
/// Every tree is grown on a bootstrap sample drawn with its own seed, and the
/// per-tree seeds are drawn up front from the forest seed, so training in
/// parallel still yields the same forest for the same seed and data.
/// Probability is the fraction of trees voting "canceled"; the label is the
/// strict majority vote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    max_features: MaxFeatures,
    seed: u64,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(params: ForestParams, max_features: MaxFeatures, seed: u64) -> Self {
        RandomForest {
            params,
            max_features,
            seed,
            n_features: 0,
            trees: Vec::new(),
        }
    }

    pub fn params(&self) -> ForestParams {
        self.params
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of trees voting "canceled" for each row.
    pub fn votes(&self, x: &Array2<f64>) -> Result<Vec<usize>> {
        if self.trees.is_empty() {
            return Err(ClassifierError::NotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(ClassifierError::FeatureMismatch {
                expected: self.n_features,
                found: x.ncols(),
            });
        }

        Ok((0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let row = x.row(i);
                self.trees
                    .iter()
                    .filter(|tree| tree.predict_row(row) == 1)
                    .count()
            })
            .collect())
    }
}

impl ClassifierModel for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples == 0 || n_samples != y.len() {
            return Err(ClassifierError::InvalidConfig(format!(
                "cannot fit on {} rows with {} labels",
                n_samples,
                y.len()
            )));
        }
        if self.params.n_estimators == 0 {
            return Err(ClassifierError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            max_features: self.max_features.resolve(x.ncols()),
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        let tree_seeds: Vec<u64> = (0..self.params.n_estimators).map(|_| rng.gen()).collect();

        log::debug!(
            "Growing {} trees on {} rows x {} features ({})",
            tree_seeds.len(),
            n_samples,
            x.ncols(),
            self.params
        );

        self.trees = tree_seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let bootstrap: Vec<usize> =
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
                DecisionTree::fit(x, y, bootstrap, &tree_params, &mut rng)
            })
            .collect();
        self.n_features = x.ncols();

        log::trace!(
            "Forest trained: mean depth {:.1}, total nodes {}",
            self.trees.iter().map(|t| t.depth() as f64).sum::<f64>() / self.trees.len() as f64,
            self.trees.iter().map(DecisionTree::n_nodes).sum::<usize>()
        );
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        let n_trees = self.trees.len() as f64;
        Ok(self
            .votes(x)?
            .into_iter()
            .map(|v| v as f64 / n_trees)
            .collect())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        let n_trees = self.trees.len();
        Ok(self
            .votes(x)?
            .into_iter()
            .map(|v| u8::from(2 * v > n_trees))
            .collect())
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
