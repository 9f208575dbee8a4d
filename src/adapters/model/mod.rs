//! Model adapter: Classifier backed by a pre-trained logistic regression.
//!
//! The training pipeline exports the fitted scaler and coefficients as JSON
//! (`gdm_model.json`). This adapter only consumes that artifact.
//!
//! # Integrity
//!
//! When an expected SHA-256 digest is configured, the artifact bytes must match
//! it exactly or loading fails.
//!
//! # Lifecycle
//!
//! The artifact is loaded once at startup. A failed load is logged and leaves
//! the process on the rule-based fallback for its whole lifetime.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{ClassificationResult, FeatureVector, FEATURE_NAMES};
use crate::ports::{Classifier, InferenceError};

/// File name looked up when the configured path is a directory.
pub const DEFAULT_MODEL_FILE: &str = "gdm_model.json";

/// Errors that prevent the artifact from being loaded.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("Model artifact not found at {0:?}")]
    NotFound(PathBuf),

    #[error("Failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("Invalid model artifact: {0}")]
    Invalid(String),
}

fn default_threshold() -> f64 {
    0.5
}

/// Model parameters exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedLogisticModel {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    pub scaler_mean: Vec<f64>,
    pub scaler_scale: Vec<f64>,
    /// Decision threshold on the positive-class probability
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl ExportedLogisticModel {
    fn check(&self) -> Result<(), ModelLoadError> {
        // Features are passed positionally; a reordered artifact would score
        // the wrong vitals.
        if !self.feature_names.iter().map(String::as_str).eq(FEATURE_NAMES) {
            return Err(ModelLoadError::Invalid(format!(
                "feature_names {:?} do not match expected order {:?}",
                self.feature_names, FEATURE_NAMES
            )));
        }
        let n = self.feature_names.len();
        if self.coefficients.len() != n || self.scaler_mean.len() != n || self.scaler_scale.len() != n {
            return Err(ModelLoadError::Invalid(
                "Model parameter lengths do not match feature_names length".into(),
            ));
        }
        if self
            .scaler_scale
            .iter()
            .any(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(ModelLoadError::Invalid(
                "scaler_scale entries must be finite and non-zero".into(),
            ));
        }
        if !self.intercept.is_finite()
            || self.coefficients.iter().chain(&self.scaler_mean).any(|v| !v.is_finite())
        {
            return Err(ModelLoadError::Invalid("non-finite model parameter".into()));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(ModelLoadError::Invalid(format!(
                "threshold {} must lie strictly between 0 and 1",
                self.threshold
            )));
        }
        Ok(())
    }
}

fn sha256_hex_bytes(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// Constant-time compare for ASCII strings (used for SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Classifier wrapping a loaded logistic regression artifact.
#[derive(Debug, Clone)]
pub struct ModelClassifier {
    model: ExportedLogisticModel,
    source: PathBuf,
    sha256: String,
}

impl ModelClassifier {
    /// Load and check the artifact at `path`.
    ///
    /// `path` may be the JSON file itself or a directory containing
    /// `DEFAULT_MODEL_FILE`.
    ///
    /// # Errors
    /// Returns `ModelLoadError` if the file is missing, unreadable, malformed,
    /// internally inconsistent, or does not match `expected_sha256`.
    pub fn load(path: &Path, expected_sha256: Option<&str>) -> Result<Self, ModelLoadError> {
        let model_path = if path.is_dir() {
            path.join(DEFAULT_MODEL_FILE)
        } else {
            path.to_path_buf()
        };
        if !model_path.is_file() {
            return Err(ModelLoadError::NotFound(model_path));
        }

        let bytes = fs::read(&model_path)?;
        let actual = sha256_hex_bytes(&bytes);
        if let Some(expected) = expected_sha256 {
            let expected = expected.trim().to_ascii_lowercase();
            if !constant_time_eq_str(&expected, &actual) {
                return Err(ModelLoadError::DigestMismatch { expected, actual });
            }
        }

        let model: ExportedLogisticModel = serde_json::from_slice(&bytes)?;
        model.check()?;

        tracing::info!(
            "Loaded model from {:?} (n_features={}, threshold={}, sha256={})",
            model_path,
            model.feature_names.len(),
            model.threshold,
            &actual[..12]
        );

        Ok(Self {
            model,
            source: model_path,
            sha256: actual,
        })
    }

    /// Load the artifact, logging and discarding any failure.
    ///
    /// `None` means the process runs on the rule-based fallback.
    #[must_use]
    pub fn load_optional(path: &Path, expected_sha256: Option<&str>) -> Option<Self> {
        match Self::load(path, expected_sha256) {
            Ok(model) => Some(model),
            Err(e) => {
                tracing::warn!("Model unavailable, using rule-based fallback: {}", e);
                None
            }
        }
    }

    /// Build directly from parameters.
    ///
    /// # Errors
    /// Returns `ModelLoadError::Invalid` if the parameters are inconsistent.
    pub fn from_parameters(model: ExportedLogisticModel) -> Result<Self, ModelLoadError> {
        model.check()?;
        let bytes = serde_json::to_vec(&model)?;
        Ok(Self {
            sha256: sha256_hex_bytes(&bytes),
            model,
            source: PathBuf::new(),
        })
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.model.feature_names
    }

    #[must_use]
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Hex SHA-256 of the loaded artifact.
    #[must_use]
    pub fn sha256(&self) -> &str {
        &self.sha256
    }

    /// Positive-class probability for raw (unscaled) features.
    fn predict_proba(&self, raw: &[f64]) -> Result<f64, InferenceError> {
        let m = &self.model;
        if raw.len() != m.feature_names.len() {
            return Err(InferenceError::ShapeMismatch {
                expected: m.feature_names.len(),
                got: raw.len(),
            });
        }

        let logit = raw
            .iter()
            .zip(&m.scaler_mean)
            .zip(&m.scaler_scale)
            .zip(&m.coefficients)
            .fold(m.intercept, |acc, (((x, mean), scale), coef)| {
                acc + coef * (x - mean) / scale
            });

        let probability = sigmoid(logit);
        if !probability.is_finite() {
            return Err(InferenceError::NonFiniteOutput);
        }
        Ok(probability)
    }
}

impl Classifier for ModelClassifier {
    fn name(&self) -> &'static str {
        "model"
    }

    fn input_features(&self) -> Vec<String> {
        self.model.feature_names.clone()
    }

    fn predict(&self, features: &FeatureVector) -> Result<ClassificationResult, InferenceError> {
        let probability = self.predict_proba(features.as_slice())?;
        let high_risk = probability >= self.model.threshold;

        tracing::debug!(
            "Model prediction: high_risk={}, probability={:.4}",
            high_risk,
            probability
        );

        Ok(ClassificationResult::new(high_risk, probability, self.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiskLevel;
    use tempfile::tempdir;

    fn test_model() -> ExportedLogisticModel {
        ExportedLogisticModel {
            feature_names: vec![
                "age".into(),
                "systolic_bp".into(),
                "diastolic_bp".into(),
                "blood_glucose".into(),
            ],
            coefficients: vec![0.6, 0.5, 0.4, 1.6],
            intercept: -1.2,
            scaler_mean: vec![30.0, 120.0, 78.0, 110.0],
            scaler_scale: vec![6.0, 15.0, 10.0, 30.0],
            threshold: 0.5,
        }
    }

    fn write_model(dir: &Path, model: &ExportedLogisticModel) -> Vec<u8> {
        let bytes = serde_json::to_vec_pretty(model).expect("serialize model");
        fs::write(dir.join(DEFAULT_MODEL_FILE), &bytes).expect("write model");
        bytes
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempdir().expect("tempdir");
        write_model(dir.path(), &test_model());

        let classifier = ModelClassifier::load(dir.path(), None).expect("Should load");
        assert_eq!(classifier.feature_names().len(), 4);
        assert_eq!(classifier.source(), dir.path().join(DEFAULT_MODEL_FILE));
        assert_eq!(classifier.sha256().len(), 64);
    }

    #[test]
    fn test_digest_pin() {
        let dir = tempdir().expect("tempdir");
        let bytes = write_model(dir.path(), &test_model());
        let digest = sha256_hex_bytes(&bytes);

        assert!(ModelClassifier::load(dir.path(), Some(&digest.to_uppercase())).is_ok());

        let wrong = "0".repeat(64);
        let err = ModelClassifier::load(dir.path(), Some(&wrong)).expect_err("Should reject");
        assert!(matches!(err, ModelLoadError::DigestMismatch { .. }));
    }

    #[test]
    fn test_missing_artifact_is_optional() {
        let dir = tempdir().expect("tempdir");
        let err = ModelClassifier::load(dir.path(), None).expect_err("Nothing to load");
        assert!(matches!(err, ModelLoadError::NotFound(_)));
        assert!(ModelClassifier::load_optional(dir.path(), None).is_none());
    }

    #[test]
    fn test_rejects_inconsistent_parameters() {
        let mut model = test_model();
        model.coefficients.pop();
        assert!(matches!(
            ModelClassifier::from_parameters(model),
            Err(ModelLoadError::Invalid(_))
        ));

        let mut model = test_model();
        model.scaler_scale[2] = 0.0;
        assert!(ModelClassifier::from_parameters(model).is_err());
    }

    #[test]
    fn test_rejects_reordered_features() {
        let mut model = test_model();
        model.feature_names.reverse();
        assert!(matches!(
            ModelClassifier::from_parameters(model.clone()),
            Err(ModelLoadError::Invalid(_))
        ));

        let dir = tempdir().expect("tempdir");
        write_model(dir.path(), &model);
        assert!(ModelClassifier::load_optional(dir.path(), None).is_none());
    }

    #[test]
    fn test_rejects_wrong_feature_count() {
        let mut model = test_model();
        model.feature_names.pop();
        model.coefficients.pop();
        model.scaler_mean.pop();
        model.scaler_scale.pop();
        assert!(matches!(
            ModelClassifier::from_parameters(model),
            Err(ModelLoadError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join(DEFAULT_MODEL_FILE), b"{not json").expect("write");
        assert!(matches!(
            ModelClassifier::load(dir.path(), None),
            Err(ModelLoadError::Parse(_))
        ));
    }

    #[test]
    fn test_predicts_high_and_low() {
        let classifier = ModelClassifier::from_parameters(test_model()).expect("valid");

        let high = classifier
            .predict(&FeatureVector::from_raw(vec![38.0, 150.0, 95.0, 180.0]))
            .expect("Should predict");
        assert!(high.high_risk);
        assert!(high.probability > 0.9 && high.probability <= 1.0);
        assert_eq!(high.risk_level(), RiskLevel::High);
        assert_eq!(high.classifier, "model");

        let low = classifier
            .predict(&FeatureVector::from_raw(vec![28.0, 120.0, 80.0, 95.0]))
            .expect("Should predict");
        assert!(!low.high_risk);
        assert_eq!(low.risk_level(), RiskLevel::Low);
    }

    #[test]
    fn test_shape_mismatch_is_inference_error() {
        let classifier = ModelClassifier::from_parameters(test_model()).expect("valid");
        let err = classifier
            .predict(&FeatureVector::from_raw(vec![38.0, 150.0]))
            .expect_err("Should fail");
        assert_eq!(
            err,
            InferenceError::ShapeMismatch {
                expected: 4,
                got: 2
            }
        );
    }
}
