//! Browser form that collects one booking and asks the inference service
//! for a verdict.
pub mod fields;
pub mod form;

pub use fields::{build_record, default_values, FieldWidget, Widget, FIELDS};
pub use form::{create_router, request_prediction, serve, Outcome, UiState};
