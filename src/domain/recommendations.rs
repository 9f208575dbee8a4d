//! Advisory text attached to every assessment.

use super::factors::{GlucoseTier, PressureTier, ADVANCED_MATERNAL_AGE};
use super::risk::RiskLevel;
use super::vitals::PredictionInput;

const URGENT_CONSULT: &str = "⚠️ Schedule an immediate appointment with your healthcare provider";

const GLUCOSE_ELEVATED: [&str; 2] = [
    "Monitor blood glucose 4 times daily (fasting and after meals)",
    "Follow a strict carbohydrate-controlled diet",
];
const GLUCOSE_BORDERLINE: [&str; 2] = [
    "Monitor blood glucose levels regularly",
    "Reduce intake of sugary foods and refined carbohydrates",
];
const GLUCOSE_NORMAL: [&str; 1] = ["Continue current blood glucose monitoring schedule"];

const PRESSURE_ELEVATED: [&str; 3] = [
    "Consult your doctor about blood pressure management",
    "Monitor blood pressure daily",
    "Reduce salt intake and manage stress",
];
const PRESSURE_BORDERLINE: [&str; 1] = ["Keep track of blood pressure readings weekly"];

const ADVANCED_AGE: [&str; 2] = [
    "Attend all scheduled prenatal checkups",
    "Discuss additional monitoring with your healthcare provider",
];

const GENERAL_WELLNESS: [&str; 3] = [
    "Stay physically active with doctor-approved exercises (30 min/day)",
    "Maintain a balanced diet rich in vegetables and whole grains",
    "Get adequate sleep (7-9 hours per night)",
];

/// Build the ordered recommendation list.
///
/// Order: urgent consult (High only), glucose advice, blood pressure advice,
/// age advice, then the general wellness tail.
#[must_use]
pub fn generate_recommendations(level: RiskLevel, input: &PredictionInput) -> Vec<String> {
    let mut out: Vec<&str> = Vec::with_capacity(12);

    if level == RiskLevel::High {
        out.push(URGENT_CONSULT);
    }

    match GlucoseTier::of(input.blood_glucose) {
        GlucoseTier::Elevated => out.extend(GLUCOSE_ELEVATED),
        GlucoseTier::Borderline => out.extend(GLUCOSE_BORDERLINE),
        GlucoseTier::Normal => out.extend(GLUCOSE_NORMAL),
    }

    match PressureTier::of(input.systolic_bp, input.diastolic_bp) {
        PressureTier::Elevated => out.extend(PRESSURE_ELEVATED),
        PressureTier::Borderline => out.extend(PRESSURE_BORDERLINE),
        PressureTier::Normal => {}
    }

    if input.age > ADVANCED_MATERNAL_AGE {
        out.extend(ADVANCED_AGE);
    }

    out.extend(GENERAL_WELLNESS);
    out.into_iter().map(str::to_string).collect()
}
