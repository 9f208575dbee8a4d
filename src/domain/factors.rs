//! Per-vital explanations shown next to an assessment.
//!
//! The thresholds here describe each reading on its own and are not
//! reconciled with the classifier's decision.

use serde::{Deserialize, Serialize};

use super::vitals::PredictionInput;

/// How a single reading bears on the assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Positive,
    Warning,
    Negative,
}

/// A named reading with its formatted value and impact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    pub name: String,
    pub value: String,
    pub impact: Impact,
}

impl Factor {
    fn new(name: &str, value: String, impact: Impact) -> Self {
        Self {
            name: name.to_string(),
            value,
            impact,
        }
    }
}

/// Glucose tier shared by factor analysis and recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GlucoseTier {
    Normal,
    Borderline,
    Elevated,
}

impl GlucoseTier {
    pub(crate) fn of(glucose: f64) -> Self {
        if glucose >= 126.0 {
            Self::Elevated
        } else if glucose >= 100.0 {
            Self::Borderline
        } else {
            Self::Normal
        }
    }
}

/// Blood pressure tier shared by factor analysis and recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PressureTier {
    Normal,
    Borderline,
    Elevated,
}

impl PressureTier {
    pub(crate) fn of(systolic: f64, diastolic: f64) -> Self {
        if systolic >= 140.0 || diastolic >= 90.0 {
            Self::Elevated
        } else if systolic >= 130.0 || diastolic >= 85.0 {
            Self::Borderline
        } else {
            Self::Normal
        }
    }
}

/// Maternal age above which extra monitoring is advised.
pub(crate) const ADVANCED_MATERNAL_AGE: f64 = 35.0;

/// Describe age, glucose and blood pressure, in that order.
#[must_use]
pub fn analyze_factors(input: &PredictionInput) -> Vec<Factor> {
    let age = reading(input.age);
    let age_factor = if input.age > ADVANCED_MATERNAL_AGE {
        Factor::new(
            "Age",
            format!("{age} years (Advanced maternal age)"),
            Impact::Warning,
        )
    } else {
        Factor::new("Age", format!("{age} years"), Impact::Positive)
    };

    let glucose = reading(input.blood_glucose);
    let glucose_factor = match GlucoseTier::of(input.blood_glucose) {
        GlucoseTier::Elevated => Factor::new(
            "Blood Glucose",
            format!("Elevated ({glucose} mg/dL)"),
            Impact::Negative,
        ),
        GlucoseTier::Borderline => Factor::new(
            "Blood Glucose",
            format!("Borderline ({glucose} mg/dL)"),
            Impact::Warning,
        ),
        GlucoseTier::Normal => Factor::new(
            "Blood Glucose",
            format!("Normal ({glucose} mg/dL)"),
            Impact::Positive,
        ),
    };

    let bp = format!(
        "{}/{} mmHg",
        reading(input.systolic_bp),
        reading(input.diastolic_bp)
    );
    let bp_factor = match PressureTier::of(input.systolic_bp, input.diastolic_bp) {
        PressureTier::Elevated => {
            Factor::new("Blood Pressure", format!("Elevated ({bp})"), Impact::Negative)
        }
        PressureTier::Borderline => {
            Factor::new("Blood Pressure", format!("Borderline ({bp})"), Impact::Warning)
        }
        PressureTier::Normal => {
            Factor::new("Blood Pressure", format!("Normal ({bp})"), Impact::Positive)
        }
    };

    vec![age_factor, glucose_factor, bp_factor]
}

// Whole numbers print without a trailing ".0".
fn reading(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
