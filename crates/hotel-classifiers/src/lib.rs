//! hotel-classifiers: training and inference core for hotel booking
//! cancellation prediction.
//!
//! The crate covers the full offline pipeline (CSV loading, leakage column
//! removal, stratified splits, imputation/scaling/one-hot preprocessing, a
//! bagged random forest, evaluation metrics and cross-validated grid search)
//! and the persisted artifact the inference service loads. The artifact
//! carries its own input schema so records can be validated before they are
//! encoded.
pub mod config;
pub mod data_handling;
pub mod error;
pub mod grid_search;
pub mod models;
pub mod pipeline;
pub mod preprocessing;
pub mod report;
pub mod schema;
pub mod stats;

pub use error::{ClassifierError, Result};
pub use pipeline::{Prediction, TrainedPipeline};
pub use schema::BookingRecord;
