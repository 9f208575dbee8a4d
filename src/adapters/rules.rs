//! Rule-based fallback classifier.
//!
//! Used when no trained model is available. The score is an additive sum of
//! fixed clinical weights and is reported as `probability = score / 100`.

use crate::domain::{
    ClassificationResult, FeatureVector, GlucoseTier, PressureTier, ADVANCED_MATERNAL_AGE,
    HIGH_RISK_THRESHOLD,
};
use crate::ports::{Classifier, InferenceError};

/// Upper bound applied to the additive score.
pub const MAX_SCORE: u32 = 100;

/// Deterministic additive scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Additive risk score for the four vitals, clamped to `MAX_SCORE`.
    #[must_use]
    pub fn score(&self, features: &FeatureVector) -> u32 {
        let mut score = 0;

        if features.age() > ADVANCED_MATERNAL_AGE {
            score += 15;
        }

        score += match GlucoseTier::of(features.glucose()) {
            GlucoseTier::Elevated => 40,
            GlucoseTier::Borderline => 20,
            GlucoseTier::Normal => 0,
        };

        score += match PressureTier::of(features.systolic(), features.diastolic()) {
            PressureTier::Elevated => 25,
            PressureTier::Borderline => 15,
            PressureTier::Normal => 0,
        };

        score.min(MAX_SCORE)
    }
}

impl Classifier for RuleBasedClassifier {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    fn predict(&self, features: &FeatureVector) -> Result<ClassificationResult, InferenceError> {
        let score = self.score(features);
        tracing::debug!("Rule-based score: {}", score);

        Ok(ClassificationResult::new(
            f64::from(score) >= HIGH_RISK_THRESHOLD,
            f64::from(score) / 100.0,
            self.name(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiskLevel;

    fn features(age: f64, systolic: f64, diastolic: f64, glucose: f64) -> FeatureVector {
        FeatureVector::from_raw(vec![age, systolic, diastolic, glucose])
    }

    #[test]
    fn test_high_risk_example() {
        let classifier = RuleBasedClassifier::new();
        let f = features(38.0, 150.0, 95.0, 180.0);
        assert_eq!(classifier.score(&f), 80);

        let result = classifier.predict(&f).expect("Rules never fail");
        assert!(result.high_risk);
        assert_eq!(result.risk_level(), RiskLevel::High);
        assert!((result.risk_level().confidence() - 85.0).abs() < f64::EPSILON);
        assert!((result.risk_percentage() - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_score_components() {
        let classifier = RuleBasedClassifier::new();
        assert_eq!(classifier.score(&features(28.0, 120.0, 80.0, 95.0)), 0);
        assert_eq!(classifier.score(&features(36.0, 120.0, 80.0, 95.0)), 15);
        assert_eq!(classifier.score(&features(28.0, 120.0, 80.0, 100.0)), 20);
        assert_eq!(classifier.score(&features(28.0, 120.0, 80.0, 126.0)), 40);
        assert_eq!(classifier.score(&features(28.0, 130.0, 80.0, 95.0)), 15);
        assert_eq!(classifier.score(&features(28.0, 120.0, 90.0, 95.0)), 25);
    }

    #[test]
    fn test_exact_boundary_scores() {
        let classifier = RuleBasedClassifier::new();

        // 15 + 20 + 25 = 60 lands exactly on the High boundary.
        let result = classifier
            .predict(&features(36.0, 140.0, 80.0, 100.0))
            .expect("Rules never fail");
        assert_eq!(result.risk_level(), RiskLevel::High);

        // 15 + 15 = 30 lands exactly on the Medium boundary.
        let result = classifier
            .predict(&features(36.0, 130.0, 80.0, 95.0))
            .expect("Rules never fail");
        assert_eq!(result.risk_level(), RiskLevel::Medium);
        assert!(!result.high_risk);
    }

    #[test]
    fn test_deterministic() {
        let classifier = RuleBasedClassifier::new();
        let f = features(41.0, 135.0, 88.0, 110.0);
        let first = classifier.predict(&f).expect("Rules never fail");
        for _ in 0..10 {
            assert_eq!(classifier.predict(&f).expect("Rules never fail"), first);
        }
    }
}
