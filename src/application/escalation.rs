//! Escalation of High-risk assessments to the assigned care worker.
//!
//! Escalation is a side effect of an assessment, never a precondition for it.
//! Every failure here is logged and reported as an `EscalationStatus`.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{Notification, RiskAssessment};
use crate::ports::{CareTeamDirectory, NotificationStore};

/// Why an escalation attempt did not complete.
#[derive(Debug, thiserror::Error)]
pub enum EscalationError {
    #[error("care worker lookup failed: {0}")]
    Lookup(String),

    #[error("notification write failed: {0}")]
    Notify(String),
}

/// Diagnostic result of an escalation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EscalationStatus {
    /// The assessment was not High risk
    NotRequired,
    /// High risk, but nobody is assigned to the patient
    NoAssignedWorker,
    Notified {
        notification_id: String,
        worker_id: String,
    },
    Failed {
        reason: String,
    },
}

impl EscalationStatus {
    #[must_use]
    pub fn is_notified(&self) -> bool {
        matches!(self, Self::Notified { .. })
    }
}

/// Notifies the assigned care worker about High-risk assessments.
pub struct EscalationDispatcher<D, N>
where
    D: CareTeamDirectory,
    N: NotificationStore,
{
    directory: Arc<D>,
    notifications: Arc<N>,
}

impl<D, N> EscalationDispatcher<D, N>
where
    D: CareTeamDirectory,
    N: NotificationStore,
{
    pub fn new(directory: Arc<D>, notifications: Arc<N>) -> Self {
        Self {
            directory,
            notifications,
        }
    }

    /// Escalate `assessment` if it is High risk.
    ///
    /// Never fails: lookup and write errors become `EscalationStatus::Failed`.
    pub fn dispatch(&self, patient_id: &str, assessment: &RiskAssessment) -> EscalationStatus {
        if !assessment.is_high_risk() {
            return EscalationStatus::NotRequired;
        }

        match self.notify_assigned_worker(patient_id, assessment) {
            Ok(Some(notification)) => {
                tracing::info!(
                    "High-risk alert {} sent to worker_id={}",
                    notification.id,
                    notification.worker_id
                );
                EscalationStatus::Notified {
                    notification_id: notification.id,
                    worker_id: notification.worker_id,
                }
            }
            Ok(None) => {
                tracing::debug!("No care worker assigned to patient_id={}, skipping escalation", patient_id);
                EscalationStatus::NoAssignedWorker
            }
            Err(e) => {
                tracing::warn!("Escalation failed for patient_id={}: {}", patient_id, e);
                EscalationStatus::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn notify_assigned_worker(
        &self,
        patient_id: &str,
        assessment: &RiskAssessment,
    ) -> Result<Option<Notification>, EscalationError> {
        let Some(worker_id) = self
            .directory
            .assigned_worker(patient_id)
            .map_err(|e| EscalationError::Lookup(e.to_string()))?
        else {
            return Ok(None);
        };

        let notification = Notification::high_risk_alert(worker_id, patient_id, assessment);
        self.notifications
            .save_notification(&notification)
            .map_err(|e| EscalationError::Notify(e.to_string()))?;

        Ok(Some(notification))
    }
}
