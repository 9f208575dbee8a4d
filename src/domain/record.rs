//! Assessment results and the records persisted from them.

use serde::{Deserialize, Serialize};

use super::factors::{analyze_factors, Factor};
use super::recommendations::generate_recommendations;
use super::risk::{ClassificationResult, RiskLevel};
use super::vitals::PredictionInput;

/// Tag carried by escalation notifications.
pub const HIGH_RISK_ALERT: &str = "high_risk_alert";

/// Notification type used when a sender does not name one.
pub const GENERAL_NOTIFICATION: &str = "general";

/// Interpreted outcome of one classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,

    /// Probability of the high-risk class as a percentage (0–100)
    pub risk_percentage: f64,

    /// Fixed per risk level
    pub confidence: f64,

    pub factors: Vec<Factor>,

    pub recommendations: Vec<String>,

    /// Which classifier produced the underlying result
    pub classifier: String,
}

impl RiskAssessment {
    /// Derive the full assessment from a classification and its validated input.
    #[must_use]
    pub fn from_classification(result: &ClassificationResult, input: &PredictionInput) -> Self {
        let risk_percentage = result.risk_percentage();
        let risk_level = result.risk_level();

        Self {
            risk_level,
            risk_percentage,
            confidence: risk_level.confidence(),
            factors: analyze_factors(input),
            recommendations: generate_recommendations(risk_level, input),
            classifier: result.classifier.to_string(),
        }
    }

    #[must_use]
    pub fn is_high_risk(&self) -> bool {
        self.risk_level == RiskLevel::High
    }
}

/// Persisted assessment for one patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: String,
    pub patient_id: String,
    pub assessment: RiskAssessment,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PredictionRecord {
    #[must_use]
    pub fn new(patient_id: impl Into<String>, assessment: RiskAssessment) -> Self {
        Self {
            id: uuid_v4(),
            patient_id: patient_id.into(),
            assessment,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Message delivered to a care worker's inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub worker_id: String,
    pub patient_id: String,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Notification {
    /// Build an unread notification with a fresh id.
    #[must_use]
    pub fn new(
        worker_id: impl Into<String>,
        patient_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
        notification_type: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid_v4(),
            worker_id: worker_id.into(),
            patient_id: patient_id.into(),
            title: title.into(),
            message: message.into(),
            notification_type: notification_type.into(),
            is_read: false,
            created_at: chrono::Utc::now(),
        }
    }

    /// Build an unread high-risk alert for the assigned worker.
    #[must_use]
    pub fn high_risk_alert(
        worker_id: impl Into<String>,
        patient_id: impl Into<String>,
        assessment: &RiskAssessment,
    ) -> Self {
        let patient_id = patient_id.into();
        let message = format!(
            "Patient {} was assessed at {:.1}% gestational diabetes risk ({}). Please follow up as soon as possible.",
            patient_id, assessment.risk_percentage, assessment.risk_level
        );

        Self::new(worker_id, patient_id, "High GDM Risk Alert", message, HIGH_RISK_ALERT)
    }
}

/// Generate a random UUID v4 from a CSPRNG seeded with OS entropy.
pub(crate) fn uuid_v4() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Impact;

    fn high_risk_input() -> PredictionInput {
        PredictionInput {
            patient_id: "patient-456".to_string(),
            age: 38.0,
            systolic_bp: 150.0,
            diastolic_bp: 95.0,
            blood_glucose: 180.0,
        }
    }

    #[test]
    fn test_assessment_from_classification() {
        let result = ClassificationResult::new(true, 0.8, "rule_based");
        let assessment = RiskAssessment::from_classification(&result, &high_risk_input());

        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert!((assessment.risk_percentage - 80.0).abs() < f64::EPSILON);
        assert!((assessment.confidence - 85.0).abs() < f64::EPSILON);
        assert_eq!(assessment.factors.len(), 3);
        assert_eq!(assessment.factors[1].impact, Impact::Negative);
        assert!(assessment.recommendations[0].contains("immediate appointment"));
        assert_eq!(assessment.classifier, "rule_based");
        assert!(assessment.is_high_risk());
    }

    #[test]
    fn test_factors_independent_of_level() {
        // Model says low risk while every vital is elevated: both are reported.
        let result = ClassificationResult::new(false, 0.1, "model");
        let assessment = RiskAssessment::from_classification(&result, &high_risk_input());
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert_eq!(assessment.factors[2].impact, Impact::Negative);
        assert!(!assessment.recommendations[0].contains("immediate appointment"));
    }

    #[test]
    fn test_notification_is_unread_alert() {
        let result = ClassificationResult::new(true, 0.9, "model");
        let assessment = RiskAssessment::from_classification(&result, &high_risk_input());
        let notification = Notification::high_risk_alert("chw-123", "patient-456", &assessment);

        assert_eq!(notification.notification_type, HIGH_RISK_ALERT);
        assert!(!notification.is_read);
        assert_eq!(notification.worker_id, "chw-123");
        assert!(notification.message.contains("90.0%"));
    }

    #[test]
    fn test_uuid_generation() {
        let id1 = uuid_v4();
        let id2 = uuid_v4();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36);
        assert_eq!(&id1[14..15], "4");
    }
}
