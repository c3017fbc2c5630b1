//! The trained artifact: fitted preprocessor + fitted classifier + the
//! schema they were fit on.
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::data_handling::RawTable;
use crate::error::{ClassifierError, Result};
use crate::models::{build_model, Classifier, ClassifierModel};
use crate::preprocessing::Preprocessor;
use crate::schema::{BookingRecord, FeatureSchema};
use crate::stats::{roc_auc, roc_curve, ClassificationReport};

/// Bumped whenever the serialized layout changes.
pub const ARTIFACT_VERSION: u32 = 1;

/// File name used by both the training and the serving defaults.
pub const DEFAULT_ARTIFACT_FILE: &str = "hotel_booking_model.json";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// 1 when the booking is likely to be canceled.
    pub label: u8,
    /// Fraction of trees voting "canceled".
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub report: ClassificationReport,
    pub roc_auc: Option<f64>,
    pub roc_curve: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedPipeline {
    pub format_version: u32,
    pub schema: FeatureSchema,
    pub model_config: ModelConfig,
    pub preprocessor: Preprocessor,
    pub classifier: Classifier,
}

impl TrainedPipeline {
    /// Fit preprocessor and classifier on `table` and record its schema.
    pub fn fit(
        table: &RawTable,
        labels: &[u8],
        config: &ModelConfig,
        target: &str,
        dropped: &[String],
    ) -> Result<TrainedPipeline> {
        let preprocessor = Preprocessor::fit(table)?;
        let x = preprocessor.transform(table)?;

        let mut classifier = build_model(config);
        classifier.fit(&x, labels)?;
        log::info!(
            "Fitted {} on {} rows x {} features ({})",
            classifier.name(),
            x.nrows(),
            x.ncols(),
            config.model_type.params()
        );

        let schema = FeatureSchema {
            fields: table.columns.clone(),
            target: target.to_string(),
            dropped: dropped.to_vec(),
            vocabularies: preprocessor.vocabularies(),
        };

        Ok(TrainedPipeline {
            format_version: ARTIFACT_VERSION,
            schema,
            model_config: config.clone(),
            preprocessor,
            classifier,
        })
    }

    /// Validate one booking against the schema and classify it.
    pub fn predict_record(&self, record: &BookingRecord) -> Result<Prediction> {
        let row = self.schema.validate(record)?;
        let x = self.preprocessor.transform_rows(&[row])?;
        let label = self.classifier.predict(&x)?[0];
        let probability = self.classifier.predict_proba(&x)?[0];
        Ok(Prediction { label, probability })
    }

    /// Labels and probabilities for every row of a table.
    pub fn predict_table(&self, table: &RawTable) -> Result<(Vec<u8>, Vec<f64>)> {
        let x = self.preprocessor.transform(table)?;
        Ok((self.classifier.predict(&x)?, self.classifier.predict_proba(&x)?))
    }

    pub fn evaluate(&self, table: &RawTable, labels: &[u8]) -> Result<Evaluation> {
        if table.nrows() != labels.len() {
            return Err(ClassifierError::InvalidConfig(format!(
                "{} rows but {} labels",
                table.nrows(),
                labels.len()
            )));
        }
        let (predicted, probabilities) = self.predict_table(table)?;
        Ok(Evaluation {
            report: ClassificationReport::new(labels, &predicted),
            roc_auc: roc_auc(labels, &probabilities),
            roc_curve: roc_curve(labels, &probabilities),
        })
    }

    /// Persist the artifact. The bytes go to a sibling temporary file first
    /// and are renamed into place, so `path` is never left half written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = serde_json::to_vec(self)?;

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp: PathBuf = path.with_file_name(tmp_name);

        fs::write(&tmp, &bytes)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        log::info!("Saved artifact to {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<TrainedPipeline> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;

        #[derive(Deserialize)]
        struct VersionHeader {
            format_version: u32,
        }
        let header: VersionHeader = serde_json::from_slice(&bytes)?;
        if header.format_version != ARTIFACT_VERSION {
            return Err(ClassifierError::ArtifactVersion {
                expected: ARTIFACT_VERSION,
                found: header.format_version,
            });
        }

        let pipeline: TrainedPipeline = serde_json::from_slice(&bytes)?;
        if pipeline.preprocessor.n_features() != pipeline.classifier.n_features() {
            return Err(ClassifierError::FeatureMismatch {
                expected: pipeline.classifier.n_features(),
                found: pipeline.preprocessor.n_features(),
            });
        }
        log::info!(
            "Loaded {} artifact from {} ({} input fields, {} features)",
            pipeline.classifier.name(),
            path.display(),
            pipeline.schema.fields.len(),
            pipeline.preprocessor.n_features()
        );
        Ok(pipeline)
    }
}
