use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::error::Result;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::random_forest::RandomForest;

/// A classifier that can be persisted inside the trained artifact.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Classifier {
    RandomForest(RandomForest),
}

impl ClassifierModel for Classifier {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()> {
        match self {
            Classifier::RandomForest(model) => model.fit(x, y),
        }
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>> {
        match self {
            Classifier::RandomForest(model) => model.predict_proba(x),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        match self {
            Classifier::RandomForest(model) => model.predict(x),
        }
    }

    fn name(&self) -> &str {
        match self {
            Classifier::RandomForest(model) => model.name(),
        }
    }
}

impl Classifier {
    /// Number of features the classifier was fit on.
    pub fn n_features(&self) -> usize {
        match self {
            Classifier::RandomForest(model) => model.n_features(),
        }
    }
}

/// Build an unfitted classifier from a `ModelConfig`.
pub fn build_model(config: &ModelConfig) -> Classifier {
    match &config.model_type {
        ModelType::RandomForest { max_features, .. } => Classifier::RandomForest(
            RandomForest::new(config.model_type.params(), *max_features, config.seed),
        ),
    }
}
