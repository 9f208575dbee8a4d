//! Classifier port: the single capability every risk classifier provides.

use crate::domain::{ClassificationResult, FeatureVector, FEATURE_NAMES};

/// Errors raised while invoking a classifier.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InferenceError {
    #[error("Feature shape mismatch: model expects {expected} features, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Model produced a non-finite probability")]
    NonFiniteOutput,

    #[error("Inference failed: {0}")]
    Invocation(String),
}

/// Binary gestational-risk classifier.
///
/// Implementations are read-only after construction so a single instance can
/// serve concurrent requests without locking.
pub trait Classifier: Send + Sync {
    /// Short identifier reported with each assessment.
    fn name(&self) -> &'static str;

    /// Feature names this classifier consumes, in order.
    fn input_features(&self) -> Vec<String> {
        FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect()
    }

    /// Predict the high-risk label and its probability.
    ///
    /// # Errors
    /// Returns `InferenceError` if the classifier cannot be invoked on `features`.
    fn predict(&self, features: &FeatureVector) -> Result<ClassificationResult, InferenceError>;
}
