use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hotel_classifiers::ClassifierError;
use serde_json::json;

/// Errors surfaced by the inference endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    SchemaMismatch(String),
    #[error("{0}")]
    InvalidValue(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::SchemaMismatch(_) | ApiError::InvalidValue(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::SchemaMismatch(_) => "schema_mismatch",
            ApiError::InvalidValue(_) => "invalid_value",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<ClassifierError> for ApiError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::SchemaMismatch(msg) => ApiError::SchemaMismatch(msg),
            e @ ClassifierError::InvalidValue { .. } => ApiError::InvalidValue(e.to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::error!("Prediction failed: {}", self);
        } else {
            log::debug!("Rejected request ({}): {}", self.kind(), self);
        }
        let body = Json(json!({"error": self.to_string(), "kind": self.kind()}));
        (status, body).into_response()
    }
}
