//! Care-team service: assignments and the worker notification inbox.

use std::sync::Arc;

use crate::adapters::StorageError;
use crate::domain::{FieldViolation, Notification, ValidationError, GENERAL_NOTIFICATION};
use crate::ports::{CareTeamDirectory, NotificationStore, Page};
use crate::MamaSafeError;

/// Default notification page size.
pub const DEFAULT_PAGE_SIZE: usize = 20;

pub struct CareTeamService<D, N>
where
    D: CareTeamDirectory,
    N: NotificationStore,
{
    directory: Arc<D>,
    notifications: Arc<N>,
}

impl<D, N> CareTeamService<D, N>
where
    D: CareTeamDirectory,
    N: NotificationStore,
    D::Error: Into<StorageError>,
    N::Error: Into<StorageError>,
{
    pub fn new(directory: Arc<D>, notifications: Arc<N>) -> Self {
        Self {
            directory,
            notifications,
        }
    }

    /// Assign a patient to a care worker, replacing any previous assignment.
    ///
    /// # Errors
    /// Returns `MamaSafeError::Validation` for blank ids, or a storage error.
    pub fn assign_patient(&self, patient_id: &str, worker_id: &str) -> Result<(), MamaSafeError> {
        let (patient_id, worker_id) = (patient_id.trim(), worker_id.trim());
        require_present(&[("patient_id", patient_id), ("worker_id", worker_id)])?;

        self.directory
            .assign(patient_id, worker_id)
            .map_err(|e| MamaSafeError::Storage(e.into()))
    }

    /// # Errors
    /// Returns error if storage operation fails.
    pub fn assigned_worker(&self, patient_id: &str) -> Result<Option<String>, MamaSafeError> {
        self.directory
            .assigned_worker(patient_id)
            .map_err(|e| MamaSafeError::Storage(e.into()))
    }

    /// Patients assigned to a worker, sorted by patient id.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn patients_for_worker(&self, worker_id: &str) -> Result<Vec<String>, MamaSafeError> {
        self.directory
            .patients_for_worker(worker_id.trim())
            .map_err(|e| MamaSafeError::Storage(e.into()))
    }

    /// Write a custom notification to a worker's inbox.
    ///
    /// The patient does not have to be assigned to the worker. A blank
    /// `notification_type` becomes `GENERAL_NOTIFICATION`.
    ///
    /// # Errors
    /// Returns `MamaSafeError::Validation` for blank ids, title or message,
    /// or a storage error.
    pub fn send_notification(
        &self,
        worker_id: &str,
        patient_id: &str,
        title: &str,
        message: &str,
        notification_type: &str,
    ) -> Result<Notification, MamaSafeError> {
        let (worker_id, patient_id, title) = (worker_id.trim(), patient_id.trim(), title.trim());
        require_present(&[
            ("worker_id", worker_id),
            ("patient_id", patient_id),
            ("title", title),
            ("message", message.trim()),
        ])?;

        let notification_type = match notification_type.trim() {
            "" => GENERAL_NOTIFICATION,
            kind => kind,
        };
        let notification = Notification::new(worker_id, patient_id, title, message, notification_type);
        self.notifications
            .save_notification(&notification)
            .map_err(|e| MamaSafeError::Storage(e.into()))?;

        tracing::info!(
            "Notification {} ({}) sent to worker_id={}",
            notification.id,
            notification.notification_type,
            notification.worker_id
        );
        Ok(notification)
    }

    /// A page of a worker's notifications, newest first.
    ///
    /// A `limit` of zero uses `DEFAULT_PAGE_SIZE`.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn notifications(
        &self,
        worker_id: &str,
        unread_only: bool,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Notification>, MamaSafeError> {
        let limit = if limit == 0 { DEFAULT_PAGE_SIZE } else { limit };
        self.notifications
            .list_notifications(worker_id, unread_only, offset, limit)
            .map_err(|e| MamaSafeError::Storage(e.into()))
    }

    /// Mark a notification as read.
    ///
    /// # Returns
    /// `false` if the notification does not exist.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn mark_read(&self, notification_id: &str) -> Result<bool, MamaSafeError> {
        self.notifications
            .mark_read(notification_id)
            .map_err(|e| MamaSafeError::Storage(e.into()))
    }
}

fn require_present(fields: &[(&'static str, &str)]) -> Result<(), ValidationError> {
    let violations: Vec<FieldViolation> = fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|&(field, _)| FieldViolation {
            field,
            message: format!("{field} must not be blank"),
        })
        .collect();
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { violations })
    }
}
