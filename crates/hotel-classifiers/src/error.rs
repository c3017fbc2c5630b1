use thiserror::Error;

/// Errors raised while loading data, fitting the pipeline or predicting.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The record does not carry the fields the artifact was fit on.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A field is present but its value cannot be used for its kind.
    #[error("invalid value for field '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("invalid target column '{column}': {reason}")]
    InvalidTarget { column: String, reason: String },

    #[error("column '{0}' has no non-missing values to fit on")]
    EmptyColumn(String),

    #[error("feature mismatch: expected {expected} columns, got {found}")]
    FeatureMismatch { expected: usize, found: usize },

    #[error("model has not been fitted")]
    NotFitted,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unsupported artifact format version {found} (expected {expected})")]
    ArtifactVersion { expected: u32, found: u32 },
}

impl ClassifierError {
    pub fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        ClassifierError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClassifierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClassifierError::SchemaMismatch("missing field 'adr'".to_string());
        assert_eq!(err.to_string(), "schema mismatch: missing field 'adr'");

        let err = ClassifierError::invalid_value("lead_time", "expected a number");
        assert_eq!(
            err.to_string(),
            "invalid value for field 'lead_time': expected a number"
        );

        let err = ClassifierError::FeatureMismatch {
            expected: 3,
            found: 2,
        };
        assert_eq!(err.to_string(), "feature mismatch: expected 3 columns, got 2");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<ClassifierError>();
        assert_sync::<ClassifierError>();
    }
}
