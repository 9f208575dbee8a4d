//! Vital-sign input, range validation and feature assembly.
//!
//! Four measurements drive every assessment: maternal age, systolic and
//! diastolic blood pressure, and blood glucose.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Default lower bound for blood glucose in mg/dL.
pub const DEFAULT_GLUCOSE_MIN: f64 = 50.0;

/// Upper bound for blood glucose in mg/dL.
pub const GLUCOSE_MAX: f64 = 400.0;

const AGE_RANGE: RangeInclusive<f64> = 18.0..=50.0;
const SYSTOLIC_RANGE: RangeInclusive<f64> = 80.0..=200.0;
const DIASTOLIC_RANGE: RangeInclusive<f64> = 40.0..=130.0;

/// Feature names in the order the classifier consumes them.
pub const FEATURE_NAMES: [&str; 4] = ["age", "systolic_bp", "diastolic_bp", "blood_glucose"];

/// Raw assessment request for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    /// Opaque patient identifier
    pub patient_id: String,

    /// Age in years
    pub age: f64,

    /// Systolic blood pressure in mmHg
    #[serde(alias = "blood_pressure_systolic")]
    pub systolic_bp: f64,

    /// Diastolic blood pressure in mmHg
    #[serde(alias = "blood_pressure_diastolic")]
    pub diastolic_bp: f64,

    /// Blood glucose in mg/dL
    pub blood_glucose: f64,
}

/// One out-of-range field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// Every violation found in a single input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("invalid input: {}", summary(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

fn summary(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Names of the rejected fields, in check order.
    #[must_use]
    pub fn fields(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.field).collect()
    }
}

/// Physiological bounds applied before any computation.
///
/// Only the glucose floor is configurable; the remaining ranges are fixed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VitalBounds {
    pub glucose_min: f64,
}

impl Default for VitalBounds {
    fn default() -> Self {
        Self {
            glucose_min: DEFAULT_GLUCOSE_MIN,
        }
    }
}

impl VitalBounds {
    #[must_use]
    pub fn with_glucose_min(glucose_min: f64) -> Self {
        Self { glucose_min }
    }

    /// Check every field and collect all violations.
    ///
    /// NaN and infinities never fall inside a range, so they are rejected too.
    ///
    /// # Errors
    /// Returns `ValidationError` listing each out-of-range field.
    pub fn validate<'a>(&self, input: &'a PredictionInput) -> Result<&'a PredictionInput, ValidationError> {
        let mut violations = Vec::new();

        if input.patient_id.trim().is_empty() {
            violations.push(FieldViolation {
                field: "patient_id",
                message: "Patient identifier is required".to_string(),
            });
        }
        if !AGE_RANGE.contains(&input.age) {
            violations.push(FieldViolation {
                field: "age",
                message: format!("Age {} must be between 18-50 years", input.age),
            });
        }
        if !SYSTOLIC_RANGE.contains(&input.systolic_bp) {
            violations.push(FieldViolation {
                field: "systolic_bp",
                message: format!(
                    "Systolic BP {} must be between 80-200 mmHg",
                    input.systolic_bp
                ),
            });
        }
        if !DIASTOLIC_RANGE.contains(&input.diastolic_bp) {
            violations.push(FieldViolation {
                field: "diastolic_bp",
                message: format!(
                    "Diastolic BP {} must be between 40-130 mmHg",
                    input.diastolic_bp
                ),
            });
        }
        if !(self.glucose_min..=GLUCOSE_MAX).contains(&input.blood_glucose) {
            violations.push(FieldViolation {
                field: "blood_glucose",
                message: format!(
                    "Blood glucose {} must be between {}-{} mg/dL",
                    input.blood_glucose, self.glucose_min, GLUCOSE_MAX
                ),
            });
        }

        if violations.is_empty() {
            Ok(input)
        } else {
            Err(ValidationError { violations })
        }
    }
}

/// Ordered classifier input: age, systolic, diastolic, glucose.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    /// Assemble features in `FEATURE_NAMES` order.
    #[must_use]
    pub fn from_input(input: &PredictionInput) -> Self {
        Self(vec![
            input.age,
            input.systolic_bp,
            input.diastolic_bp,
            input.blood_glucose,
        ])
    }

    /// Wrap an arbitrary vector. Used where the caller owns the ordering.
    #[must_use]
    pub fn from_raw(values: Vec<f64>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn age(&self) -> f64 {
        self.0.first().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn systolic(&self) -> f64 {
        self.0.get(1).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn diastolic(&self) -> f64 {
        self.0.get(2).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn glucose(&self) -> f64 {
        self.0.get(3).copied().unwrap_or_default()
    }
}
