//! # MamaSafe
//!
//! Gestational diabetes (GDM) risk assessment with care-worker escalation.
//!
//! This crate provides:
//! - Range validation of four vital signs
//! - Classification with a pre-trained model, or a rule-based fallback when
//!   the model artifact is unavailable
//! - Risk tiers, per-vital factors and ordered recommendations
//! - Best-effort persistence of assessment history
//! - Best-effort notification of the assigned care worker on High risk
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types and pure rules (vitals, risk, factors)
//! - `ports`: Trait definitions for the classifier and the stores
//! - `adapters`: Concrete implementations (model artifact, rules, SQLite, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{PredictionInput, RiskAssessment, RiskLevel};

/// Result type for MamaSafe operations
pub type Result<T> = std::result::Result<T, MamaSafeError>;

/// Main error type for MamaSafe
#[derive(Debug, thiserror::Error)]
pub enum MamaSafeError {
    #[error(transparent)]
    Validation(#[from] domain::ValidationError),

    #[error("Inference failed: {0}")]
    Inference(#[from] ports::InferenceError),

    #[error("Storage operation failed: {0}")]
    Storage(#[from] adapters::StorageError),

    #[error("Model load failed: {0}")]
    ModelLoad(#[from] adapters::ModelLoadError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MamaSafeError {
    /// Whether the error stems from caller-supplied data rather than an
    /// internal failure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
