//! Storage ports: prediction history, care-team assignments and the
//! notification inbox.
//!
//! The application only depends on these traits; `SqliteStorage` implements
//! all three.

use crate::domain::{Notification, PredictionRecord};

/// A page of items with pagination metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items in this page
    pub items: Vec<T>,
    /// Total count of matching items
    pub total_count: usize,
    /// Current page offset
    pub offset: usize,
    /// Page size limit
    pub limit: usize,
    /// Whether there are more pages
    pub has_more: bool,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total_count: usize, offset: usize, limit: usize) -> Self {
        let has_more = offset.saturating_add(items.len()) < total_count;
        Self {
            items,
            total_count,
            offset,
            limit,
            has_more,
        }
    }

    /// Get the next page offset.
    #[must_use]
    pub fn next_offset(&self) -> Option<usize> {
        if self.has_more {
            Some(self.offset.saturating_add(self.limit))
        } else {
            None
        }
    }

    /// Get the previous page offset.
    #[must_use]
    pub fn prev_offset(&self) -> Option<usize> {
        if self.offset > 0 {
            Some(self.offset.saturating_sub(self.limit))
        } else {
            None
        }
    }
}

/// Append-only history of assessments.
pub trait PredictionStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a record and return its identifier.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn save_prediction(&self, record: &PredictionRecord) -> Result<String, Self::Error>;

    /// Load up to `limit` records for a patient, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn list_by_patient(&self, patient_id: &str, limit: usize)
        -> Result<Vec<PredictionRecord>, Self::Error>;

    /// Most recent record for a patient, if any.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn latest_for_patient(&self, patient_id: &str) -> Result<Option<PredictionRecord>, Self::Error> {
        Ok(self.list_by_patient(patient_id, 1)?.into_iter().next())
    }
}

/// Patient to care-worker assignments.
pub trait CareTeamDirectory: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Worker currently assigned to the patient.
    ///
    /// # Returns
    /// `None` if the patient has no assignment.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn assigned_worker(&self, patient_id: &str) -> Result<Option<String>, Self::Error>;

    /// Create or replace the patient's assignment.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn assign(&self, patient_id: &str, worker_id: &str) -> Result<(), Self::Error>;

    /// Patients currently assigned to a worker, sorted by patient id.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn patients_for_worker(&self, worker_id: &str) -> Result<Vec<String>, Self::Error>;
}

/// Care-worker notification inbox.
pub trait NotificationStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a notification and return its identifier.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn save_notification(&self, notification: &Notification) -> Result<String, Self::Error>;

    /// Notifications for a worker, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn list_notifications(
        &self,
        worker_id: &str,
        unread_only: bool,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Notification>, Self::Error>;

    /// Mark a notification as read.
    ///
    /// # Returns
    /// `false` if no notification has this id.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn mark_read(&self, notification_id: &str) -> Result<bool, Self::Error>;
}
