//! SQLite adapter: Implementation of the storage ports.
//!
//! Provides local persistence for prediction history, care-team assignments
//! and the care-worker notification inbox.
//!
//! # Ordering
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so lexical order equals chronological order. Ties fall back to insertion
//! order through `rowid`.
//!
//! # Mutex Behavior
//!
//! Database connection is protected by `Mutex`. A poisoned mutex (from panic
//! in another thread) will cause panic. This fail-fast behavior is intentional
//! for data integrity in healthcare applications.
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use crate::domain::{Factor, Notification, PredictionRecord, RiskAssessment, RiskLevel};
use crate::ports::{CareTeamDirectory, NotificationStore, Page, PredictionStore};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn parse_json<T: serde::de::DeserializeOwned>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw).map_err(|e| conversion_error(idx, e))
}

const RECORD_COLUMNS: &str = "id, patient_id, risk_level, risk_percentage, confidence, \
                              factors, recommendations, classifier, created_at";

const NOTIFICATION_COLUMNS: &str =
    "id, worker_id, patient_id, title, message, notification_type, is_read, created_at";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<PredictionRecord> {
    let risk_level_str: String = row.get(2)?;
    let risk_level = RiskLevel::parse(&risk_level_str).ok_or_else(|| {
        conversion_error(
            2,
            StorageError::Serialization(format!("unknown risk level {risk_level_str:?}")),
        )
    })?;
    let factors_json: String = row.get(5)?;
    let recommendations_json: String = row.get(6)?;
    let created_at_str: String = row.get(8)?;

    let factors: Vec<Factor> = parse_json(5, &factors_json)?;
    let recommendations: Vec<String> = parse_json(6, &recommendations_json)?;

    Ok(PredictionRecord {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        assessment: RiskAssessment {
            risk_level,
            risk_percentage: row.get(3)?,
            confidence: row.get(4)?,
            factors,
            recommendations,
            classifier: row.get(7)?,
        },
        created_at: parse_timestamp(8, &created_at_str)?,
    })
}

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    let is_read: i64 = row.get(6)?;
    let created_at_str: String = row.get(7)?;

    Ok(Notification {
        id: row.get(0)?,
        worker_id: row.get(1)?,
        patient_id: row.get(2)?,
        title: row.get(3)?,
        message: row.get(4)?,
        notification_type: row.get(5)?,
        is_read: is_read != 0,
        created_at: parse_timestamp(7, &created_at_str)?,
    })
}

impl SqliteStorage {
    /// Create a new SQLite storage with the given database path.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS predictions (
                id TEXT PRIMARY KEY,
                patient_id TEXT NOT NULL,
                risk_level TEXT NOT NULL,
                risk_percentage REAL NOT NULL,
                confidence REAL NOT NULL,
                factors TEXT NOT NULL,
                recommendations TEXT NOT NULL,
                classifier TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_predictions_patient
                ON predictions(patient_id, created_at DESC);

            CREATE TABLE IF NOT EXISTS care_assignments (
                patient_id TEXT PRIMARY KEY,
                worker_id TEXT NOT NULL,
                assigned_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_care_assignments_worker
                ON care_assignments(worker_id);

            CREATE TABLE IF NOT EXISTS notifications (
                id TEXT PRIMARY KEY,
                worker_id TEXT NOT NULL,
                patient_id TEXT NOT NULL,
                title TEXT NOT NULL,
                message TEXT NOT NULL,
                notification_type TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_notifications_worker
                ON notifications(worker_id, created_at DESC);
            ",
        )?;

        Ok(())
    }

    /// Total number of stored predictions across all patients.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn count_predictions(&self) -> Result<usize, StorageError> {
        let conn = self.conn.lock().expect("Lock failed");
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM predictions", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl PredictionStore for SqliteStorage {
    type Error = StorageError;

    fn save_prediction(&self, record: &PredictionRecord) -> Result<String, Self::Error> {
        let factors = serde_json::to_string(&record.assessment.factors)?;
        let recommendations = serde_json::to_string(&record.assessment.recommendations)?;
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute(
            r"
            INSERT INTO predictions (
                id, patient_id, risk_level, risk_percentage, confidence,
                factors, recommendations, classifier, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
            params![
                record.id,
                record.patient_id,
                record.assessment.risk_level.as_str(),
                record.assessment.risk_percentage,
                record.assessment.confidence,
                factors,
                recommendations,
                record.assessment.classifier,
                timestamp(&record.created_at),
            ],
        )?;

        tracing::debug!("Saved prediction {} to storage", record.id);
        Ok(record.id.clone())
    }

    fn list_by_patient(
        &self,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<PredictionRecord>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM predictions
             WHERE patient_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?2"
        ))?;

        let records = stmt
            .query_map(params![patient_id, limit as i64], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

impl CareTeamDirectory for SqliteStorage {
    type Error = StorageError;

    fn assigned_worker(&self, patient_id: &str) -> Result<Option<String>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let result = conn.query_row(
            "SELECT worker_id FROM care_assignments WHERE patient_id = ?1",
            params![patient_id],
            |row| row.get(0),
        );

        match result {
            Ok(worker_id) => Ok(Some(worker_id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn assign(&self, patient_id: &str, worker_id: &str) -> Result<(), Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute(
            r"
            INSERT INTO care_assignments (patient_id, worker_id, assigned_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(patient_id) DO UPDATE SET
                worker_id = excluded.worker_id,
                assigned_at = excluded.assigned_at
            ",
            params![patient_id, worker_id, timestamp(&Utc::now())],
        )?;

        tracing::info!("Assigned patient_id={} to worker_id={}", patient_id, worker_id);
        Ok(())
    }

    fn patients_for_worker(&self, worker_id: &str) -> Result<Vec<String>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        let mut stmt = conn.prepare(
            "SELECT patient_id FROM care_assignments WHERE worker_id = ?1 ORDER BY patient_id",
        )?;
        let patients = stmt
            .query_map(params![worker_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(patients)
    }
}

impl NotificationStore for SqliteStorage {
    type Error = StorageError;

    fn save_notification(&self, notification: &Notification) -> Result<String, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");

        conn.execute(
            r"
            INSERT INTO notifications (
                id, worker_id, patient_id, title, message,
                notification_type, is_read, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                notification.id,
                notification.worker_id,
                notification.patient_id,
                notification.title,
                notification.message,
                notification.notification_type,
                notification.is_read as i64,
                timestamp(&notification.created_at),
            ],
        )?;

        tracing::debug!("Saved notification {} to storage", notification.id);
        Ok(notification.id.clone())
    }

    fn list_notifications(
        &self,
        worker_id: &str,
        unread_only: bool,
        offset: usize,
        limit: usize,
    ) -> Result<Page<Notification>, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let unread_only = unread_only as i64;

        let total_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notifications
             WHERE worker_id = ?1 AND (?2 = 0 OR is_read = 0)",
            params![worker_id, unread_only],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications
             WHERE worker_id = ?1 AND (?2 = 0 OR is_read = 0)
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?3 OFFSET ?4"
        ))?;

        let items = stmt
            .query_map(
                params![worker_id, unread_only, limit as i64, offset as i64],
                notification_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total_count as usize, offset, limit))
    }

    fn mark_read(&self, notification_id: &str) -> Result<bool, Self::Error> {
        let conn = self.conn.lock().expect("Lock failed");
        let changed = conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1",
            params![notification_id],
        )?;
        Ok(changed > 0)
    }
}
