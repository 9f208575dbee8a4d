//! Assessment service: the GDM risk pipeline.
//!
//! One call to `assess` runs:
//! 1. Range validation
//! 2. Feature extraction
//! 3. Classification (model, or rule-based fallback)
//! 4. Risk interpretation (level, confidence, factors, recommendations)
//! 5. Best-effort persistence
//! 6. Best-effort escalation on High risk
//!
//! Only validation and classification failures reach the caller.

use std::sync::Arc;

use serde::Serialize;

use crate::adapters::rules::RuleBasedClassifier;
use crate::adapters::StorageError;
use crate::domain::{
    ClassificationResult, FeatureVector, PredictionInput, PredictionRecord, RiskAssessment,
    VitalBounds,
};
use crate::ports::{CareTeamDirectory, Classifier, InferenceError, NotificationStore, PredictionStore};
use crate::MamaSafeError;

use super::escalation::{EscalationDispatcher, EscalationStatus};

/// Everything `assess` produces for one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentOutcome {
    pub patient_id: String,
    pub assessment: RiskAssessment,
    /// `None` when persistence failed
    pub record_id: Option<String>,
    pub escalation: EscalationStatus,
}

/// Which classifier the service is running on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifierStatus {
    pub model_loaded: bool,
    pub active_classifier: &'static str,
    pub feature_names: Vec<String>,
}

/// Service running risk assessments for individual patients.
///
/// The model is optional and injected once. Without it every request is
/// served by `RuleBasedClassifier`.
pub struct AssessmentService<C, P, D, N>
where
    C: Classifier,
    P: PredictionStore,
    D: CareTeamDirectory,
    N: NotificationStore,
{
    model: Option<Arc<C>>,
    fallback: RuleBasedClassifier,
    bounds: VitalBounds,
    records: Arc<P>,
    escalation: EscalationDispatcher<D, N>,
}

impl<C, P, D, N> AssessmentService<C, P, D, N>
where
    C: Classifier,
    P: PredictionStore,
    D: CareTeamDirectory,
    N: NotificationStore,
{
    /// Create a new assessment service with default vital bounds.
    pub fn new(
        model: Option<Arc<C>>,
        records: Arc<P>,
        escalation: EscalationDispatcher<D, N>,
    ) -> Self {
        match &model {
            Some(m) => tracing::info!("Assessment service using classifier '{}'", m.name()),
            None => tracing::info!("Assessment service using rule-based fallback"),
        }

        Self {
            model,
            fallback: RuleBasedClassifier::new(),
            bounds: VitalBounds::default(),
            records,
            escalation,
        }
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: VitalBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Assess one patient's vitals.
    ///
    /// # Errors
    /// Returns `MamaSafeError::Validation` if any vital is out of range, and
    /// `MamaSafeError::Inference` if the classifier fails. Storage and
    /// notification failures are logged and never returned.
    pub fn assess(&self, input: &PredictionInput) -> Result<AssessmentOutcome, MamaSafeError> {
        // Step 1: Validate
        let input = self.bounds.validate(input)?;

        // Step 2: Features
        let features = FeatureVector::from_input(input);

        // Step 3: Classify
        tracing::debug!("Classifying {} features...", features.len());
        let result = self.classify(&features)?;

        // Step 4: Interpret
        let assessment = RiskAssessment::from_classification(&result, input);
        tracing::info!(
            "Assessment complete: risk={}, percentage={:.2}, classifier={}",
            assessment.risk_level,
            assessment.risk_percentage,
            assessment.classifier
        );

        // Step 5: Persist
        let record = PredictionRecord::new(input.patient_id.clone(), assessment);
        let record_id = match self.records.save_prediction(&record) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("Failed to save prediction: {}", e);
                None
            }
        };

        // Step 6: Escalate
        let escalation = self.escalation.dispatch(&record.patient_id, &record.assessment);

        Ok(AssessmentOutcome {
            patient_id: record.patient_id,
            assessment: record.assessment,
            record_id,
            escalation,
        })
    }

    fn classify(&self, features: &FeatureVector) -> Result<ClassificationResult, InferenceError> {
        match &self.model {
            Some(model) => model.predict(features),
            None => self.fallback.predict(features),
        }
    }

    /// Current classifier and the feature order it consumes.
    #[must_use]
    pub fn classifier_status(&self) -> ClassifierStatus {
        match &self.model {
            Some(model) => ClassifierStatus {
                model_loaded: true,
                active_classifier: model.name(),
                feature_names: model.input_features(),
            },
            None => ClassifierStatus {
                model_loaded: false,
                active_classifier: self.fallback.name(),
                feature_names: self.fallback.input_features(),
            },
        }
    }

    /// Past assessments for a patient, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn history(&self, patient_id: &str, limit: usize) -> Result<Vec<PredictionRecord>, MamaSafeError>
    where
        P::Error: Into<StorageError>,
    {
        self.records
            .list_by_patient(patient_id, limit)
            .map_err(|e| MamaSafeError::Storage(e.into()))
    }

    /// Most recent assessment for a patient.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn latest(&self, patient_id: &str) -> Result<Option<PredictionRecord>, MamaSafeError>
    where
        P::Error: Into<StorageError>,
    {
        self.records
            .latest_for_patient(patient_id)
            .map_err(|e| MamaSafeError::Storage(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::model::{ExportedLogisticModel, ModelClassifier};
    use crate::adapters::sqlite::SqliteStorage;
    use crate::domain::{RiskLevel, FEATURE_NAMES};

    type SqliteService<C> = AssessmentService<C, SqliteStorage, SqliteStorage, SqliteStorage>;

    fn high_risk_input(patient_id: &str) -> PredictionInput {
        PredictionInput {
            patient_id: patient_id.into(),
            age: 38.0,
            systolic_bp: 150.0,
            diastolic_bp: 95.0,
            blood_glucose: 180.0,
        }
    }

    fn low_risk_input(patient_id: &str) -> PredictionInput {
        PredictionInput {
            patient_id: patient_id.into(),
            age: 28.0,
            systolic_bp: 120.0,
            diastolic_bp: 80.0,
            blood_glucose: 95.0,
        }
    }

    fn create_test_service<C: Classifier>(
        model: Option<C>,
    ) -> (Arc<SqliteStorage>, SqliteService<C>) {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        let escalation = EscalationDispatcher::new(Arc::clone(&storage), Arc::clone(&storage));
        let service = AssessmentService::new(model.map(Arc::new), Arc::clone(&storage), escalation);
        (storage, service)
    }

    /// Scaled logistic model with one shared coefficient over `FEATURE_NAMES`.
    fn test_model(coefficient: f64, intercept: f64) -> ModelClassifier {
        let n = FEATURE_NAMES.len();
        ModelClassifier::from_parameters(ExportedLogisticModel {
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            coefficients: vec![coefficient; n],
            intercept,
            scaler_mean: vec![0.0; n],
            scaler_scale: vec![100.0; n],
            threshold: 0.5,
        })
        .expect("valid model")
    }

    /// Model whose output is `p` regardless of input.
    fn constant_model(p: f64) -> ModelClassifier {
        test_model(0.0, (p / (1.0 - p)).ln())
    }

    /// Classifier whose runtime is unavailable.
    struct BrokenClassifier;

    impl Classifier for BrokenClassifier {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn predict(&self, _: &FeatureVector) -> Result<ClassificationResult, InferenceError> {
            Err(InferenceError::Invocation("runtime unavailable".into()))
        }

        fn input_features(&self) -> Vec<String> {
            vec!["glucose_only".to_string()]
        }
    }

    /// Prediction store whose writes always fail.
    struct OfflineStore;

    impl PredictionStore for OfflineStore {
        type Error = StorageError;

        fn save_prediction(&self, _: &PredictionRecord) -> Result<String, Self::Error> {
            Err(StorageError::Serialization("disk full".into()))
        }

        fn list_by_patient(&self, _: &str, _: usize) -> Result<Vec<PredictionRecord>, Self::Error> {
            Err(StorageError::Serialization("disk full".into()))
        }
    }

    #[test]
    fn test_fallback_pipeline_persists_and_escalates() {
        let (storage, service) = create_test_service::<ModelClassifier>(None);
        storage.assign("patient-1", "chw-1").expect("Should assign");

        let outcome = service
            .assess(&high_risk_input("patient-1"))
            .expect("Should assess");

        assert_eq!(outcome.assessment.risk_level, RiskLevel::High);
        assert!((outcome.assessment.risk_percentage - 80.0).abs() < 1e-9);
        assert!((outcome.assessment.confidence - 85.0).abs() < f64::EPSILON);
        assert_eq!(outcome.assessment.classifier, "rule_based");
        assert_eq!(outcome.assessment.factors.len(), 3);
        assert!(outcome.escalation.is_notified());

        let record_id = outcome.record_id.expect("Should persist");
        let latest = service
            .latest("patient-1")
            .expect("Should load")
            .expect("Should exist");
        assert_eq!(latest.id, record_id);
        assert_eq!(latest.assessment, outcome.assessment);
    }

    #[test]
    fn test_validation_blocks_pipeline() {
        let (storage, service) = create_test_service::<ModelClassifier>(None);
        let mut input = high_risk_input("patient-1");
        input.age = 17.0;
        input.blood_glucose = 500.0;

        let err = service.assess(&input).expect_err("Should reject");
        assert!(err.is_client_error());
        match err {
            MamaSafeError::Validation(v) => assert_eq!(v.fields(), vec!["age", "blood_glucose"]),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(storage.count_predictions().expect("Should count"), 0);
    }

    #[test]
    fn test_low_risk_does_not_escalate() {
        let (storage, service) = create_test_service::<ModelClassifier>(None);
        storage.assign("patient-2", "chw-1").expect("Should assign");

        let outcome = service
            .assess(&low_risk_input("patient-2"))
            .expect("Should assess");
        assert_eq!(outcome.assessment.risk_level, RiskLevel::Low);
        assert_eq!(outcome.escalation, EscalationStatus::NotRequired);
        assert!(outcome.record_id.is_some());
    }

    #[test]
    fn test_high_risk_without_worker_is_noop() {
        let (_storage, service) = create_test_service::<ModelClassifier>(None);

        let outcome = service
            .assess(&high_risk_input("unassigned"))
            .expect("Should assess");
        assert_eq!(outcome.escalation, EscalationStatus::NoAssignedWorker);
    }

    #[test]
    fn test_persistence_failure_is_isolated() {
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        let escalation = EscalationDispatcher::new(Arc::clone(&storage), Arc::clone(&storage));
        let service: AssessmentService<ModelClassifier, _, _, _> =
            AssessmentService::new(None, Arc::new(OfflineStore), escalation);
        storage.assign("patient-1", "chw-1").expect("Should assign");

        let outcome = service
            .assess(&high_risk_input("patient-1"))
            .expect("Should still assess");
        assert!(outcome.record_id.is_none());
        assert_eq!(outcome.assessment.risk_level, RiskLevel::High);
        assert!(outcome.escalation.is_notified());

        assert!(matches!(
            service.history("patient-1", 10),
            Err(MamaSafeError::Storage(_))
        ));
    }

    #[test]
    fn test_model_is_preferred_over_fallback() {
        let (_storage, service) = create_test_service(Some(test_model(0.5, 0.0)));

        let status = service.classifier_status();
        assert!(status.model_loaded);
        assert_eq!(status.active_classifier, "model");
        assert_eq!(status.feature_names, FEATURE_NAMES.to_vec());

        let outcome = service
            .assess(&high_risk_input("patient-1"))
            .expect("Should assess");
        assert_eq!(outcome.assessment.classifier, "model");
    }

    #[test]
    fn test_fallback_status() {
        let (_storage, service) = create_test_service::<ModelClassifier>(None);
        let status = service.classifier_status();
        assert!(!status.model_loaded);
        assert_eq!(status.active_classifier, "rule_based");
        assert_eq!(status.feature_names, FEATURE_NAMES.to_vec());
    }

    #[test]
    fn test_just_below_high_threshold_does_not_escalate() {
        let (storage, service) = create_test_service(Some(constant_model(0.59999)));
        storage.assign("patient-1", "chw-1").expect("Should assign");

        let outcome = service
            .assess(&high_risk_input("patient-1"))
            .expect("Should assess");
        assert_eq!(outcome.assessment.risk_level, RiskLevel::Medium);
        assert!((outcome.assessment.confidence - 78.0).abs() < f64::EPSILON);
        assert_eq!(outcome.escalation, EscalationStatus::NotRequired);

        let inbox = storage
            .list_notifications("chw-1", false, 0, 10)
            .expect("Should list");
        assert_eq!(inbox.total_count, 0);
    }

    #[test]
    fn test_just_below_medium_threshold_is_low() {
        let (_storage, service) = create_test_service(Some(constant_model(0.29996)));

        let outcome = service
            .assess(&low_risk_input("patient-1"))
            .expect("Should assess");
        assert_eq!(outcome.assessment.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_classifier_failure_is_inference_error() {
        let (storage, service) = create_test_service(Some(BrokenClassifier));

        let err = service
            .assess(&high_risk_input("patient-1"))
            .expect_err("Should fail");
        assert!(matches!(
            err,
            MamaSafeError::Inference(InferenceError::Invocation(_))
        ));
        assert!(!err.is_client_error());
        assert_eq!(storage.count_predictions().expect("Should count"), 0);
    }

    #[test]
    fn test_status_reports_active_classifier_features() {
        let (_storage, service) = create_test_service(Some(BrokenClassifier));
        let status = service.classifier_status();
        assert_eq!(status.active_classifier, "broken");
        assert_eq!(status.feature_names, vec!["glucose_only".to_string()]);
    }

    #[test]
    fn test_history_newest_first() {
        let (_storage, service) = create_test_service::<ModelClassifier>(None);

        let first = service.assess(&low_risk_input("patient-3")).expect("Should assess");
        let second = service.assess(&high_risk_input("patient-3")).expect("Should assess");

        let history = service.history("patient-3", 10).expect("Should load");
        assert_eq!(history.len(), 2);
        assert_eq!(Some(history[0].id.clone()), second.record_id);
        assert_eq!(Some(history[1].id.clone()), first.record_id);

        assert_eq!(service.history("patient-3", 1).expect("Should load").len(), 1);
        assert!(service.latest("nobody").expect("Should load").is_none());
    }

    #[test]
    fn test_concurrent_assessments() {
        let (storage, service) = create_test_service::<ModelClassifier>(None);

        std::thread::scope(|s| {
            for i in 0..8 {
                let service = &service;
                s.spawn(move || {
                    let outcome = service
                        .assess(&high_risk_input(&format!("patient-{i}")))
                        .expect("Should assess");
                    assert_eq!(outcome.assessment.risk_level, RiskLevel::High);
                });
            }
        });

        assert_eq!(storage.count_predictions().expect("Should count"), 8);
    }
}
