//! HTML training report: metrics tables rendered with maud and ROC / grid
//! search charts rendered with plotly.
pub mod plots;
pub mod report;

pub use report::{ModelEvaluation, TrainingReport};
