use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use hotel_classifiers::models::ClassifierModel;
use hotel_classifiers::{BookingRecord, Prediction};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    /// 1 = likely canceled, 0 = likely confirmed.
    pub prediction: u8,
    pub probability: f64,
}

impl From<Prediction> for PredictResponse {
    fn from(p: Prediction) -> Self {
        PredictResponse {
            prediction: p.label,
            probability: p.probability,
        }
    }
}

/// Decode the request body into a booking record. The body is parsed by hand
/// so malformed JSON gets the same error envelope as every other failure.
pub fn parse_record(body: &[u8]) -> Result<BookingRecord, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("malformed JSON: {}", e)))?;
    match value {
        Value::Object(record) => Ok(record),
        other => Err(ApiError::BadRequest(format!(
            "expected a JSON object, got {}",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub async fn predict(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let record = parse_record(&body)?;
    let pipeline = state.pipeline.clone();

    let prediction = tokio::task::spawn_blocking(move || pipeline.predict_record(&record))
        .await
        .map_err(|e| ApiError::Internal(format!("prediction task failed: {}", e)))??;

    log::debug!(
        "Predicted {} (p = {:.3})",
        prediction.label,
        prediction.probability
    );
    Ok(Json(prediction.into()))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.pipeline.classifier.name(),
        "n_fields": state.pipeline.schema.fields.len(),
        "n_features": state.pipeline.preprocessor.n_features(),
    }))
}
