use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Central configuration for models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Seed for bootstrap sampling and per-node feature sampling.
    pub seed: u64,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// How many features a tree node samples when searching for a split.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    #[default]
    Sqrt,
    Log2,
    All,
}

impl MaxFeatures {
    pub fn resolve(self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            MaxFeatures::Sqrt => n.sqrt() as usize,
            MaxFeatures::Log2 => n.log2() as usize,
            MaxFeatures::All => n_features,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// The hyper-parameters explored by grid search.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// `None` grows trees until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

impl std::fmt::Display for ForestParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let depth = self
            .max_depth
            .map(|d| d.to_string())
            .unwrap_or_else(|| "None".to_string());
        write!(
            f,
            "n_estimators={}, max_depth={}, min_samples_split={}",
            self.n_estimators, depth, self.min_samples_split
        )
    }
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    RandomForest {
        n_estimators: usize,
        max_depth: Option<usize>,
        min_samples_split: usize,
        #[serde(default)]
        max_features: MaxFeatures,
    },
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::from_params(ForestParams::default(), MaxFeatures::default())
    }
}

impl ModelType {
    pub fn from_params(params: ForestParams, max_features: MaxFeatures) -> Self {
        ModelType::RandomForest {
            n_estimators: params.n_estimators,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            max_features,
        }
    }

    pub fn params(&self) -> ForestParams {
        match self {
            ModelType::RandomForest {
                n_estimators,
                max_depth,
                min_samples_split,
                ..
            } => ForestParams {
                n_estimators: *n_estimators,
                max_depth: *max_depth,
                min_samples_split: *min_samples_split,
            },
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random_forest" | "rf" => Ok(ModelType::default()),
            _ => Err(format!("Unknown model type: {}", s)),
        }
    }
}

impl ModelConfig {
    pub fn new(seed: u64, model_type: ModelType) -> Self {
        Self { seed, model_type }
    }

    /// Same model family and seed with different hyper-parameters.
    pub fn with_params(&self, params: ForestParams) -> Self {
        let max_features = match &self.model_type {
            ModelType::RandomForest { max_features, .. } => *max_features,
        };
        Self {
            seed: self.seed,
            model_type: ModelType::from_params(params, max_features),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            model_type: ModelType::default(),
        }
    }
}
