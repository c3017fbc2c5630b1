use ndarray::Array2;

use crate::error::Result;

/// Contract shared by the classifiers the pipeline can persist.
///
/// Labels use 0 for "not canceled" and 1 for "canceled".
pub trait ClassifierModel {
    fn fit(&mut self, x: &Array2<f64>, y: &[u8]) -> Result<()>;

    /// Probability of the positive class for every row, in [0, 1].
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Vec<f64>>;

    /// Hard labels. The default thresholds `predict_proba` strictly above 0.5.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(x)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
