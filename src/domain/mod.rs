//! Domain layer: Core business types and logic.
//!
//! Pure functions and value types for validation, risk mapping, factor
//! analysis and recommendations. No I/O happens here.

mod factors;
mod recommendations;
mod record;
mod risk;
mod vitals;

pub use factors::{analyze_factors, Factor, Impact};
pub use recommendations::generate_recommendations;
pub use record::{
    Notification, PredictionRecord, RiskAssessment, GENERAL_NOTIFICATION, HIGH_RISK_ALERT,
};
pub use risk::{ClassificationResult, RiskLevel, HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD};
pub use vitals::{
    FeatureVector, FieldViolation, PredictionInput, ValidationError, VitalBounds,
    DEFAULT_GLUCOSE_MIN, FEATURE_NAMES, GLUCOSE_MAX,
};

pub(crate) use factors::{GlucoseTier, PressureTier, ADVANCED_MATERNAL_AGE};
