//! Runtime configuration.
//!
//! All settings come from `MAMASAFE_*` environment variables with defaults
//! suitable for a local run.

use std::path::PathBuf;

use crate::domain::{VitalBounds, DEFAULT_GLUCOSE_MIN, GLUCOSE_MAX};
use crate::MamaSafeError;

pub const DB_PATH_ENV: &str = "MAMASAFE_DB_PATH";
pub const MODEL_PATH_ENV: &str = "MAMASAFE_MODEL_PATH";
pub const MODEL_SHA256_ENV: &str = "MAMASAFE_MODEL_SHA256";
pub const GLUCOSE_MIN_ENV: &str = "MAMASAFE_GLUCOSE_MIN";
pub const HISTORY_LIMIT_ENV: &str = "MAMASAFE_HISTORY_LIMIT";
pub const LOG_MODE_ENV: &str = "MAMASAFE_LOG_MODE";
pub const LOG_FILE_ENV: &str = "MAMASAFE_LOG_FILE";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Standard error (stdout carries command output)
    Stderr,
    /// Append to `Config::log_file`
    File,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub db_path: PathBuf,
    /// Model JSON file, or a directory containing `gdm_model.json`
    pub model_path: PathBuf,
    /// Expected hex SHA-256 of the model artifact
    pub model_sha256: Option<String>,
    pub glucose_min: f64,
    /// Default number of records returned by history queries
    pub history_limit: usize,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("mamasafe.db"),
            model_path: PathBuf::from("models"),
            model_sha256: None,
            glucose_min: DEFAULT_GLUCOSE_MIN,
            history_limit: 10,
            log_mode: LogMode::Stderr,
            log_file: PathBuf::from("mamasafe.log"),
        }
    }
}

impl Config {
    /// Read configuration from the process environment.
    ///
    /// # Errors
    /// Returns `MamaSafeError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, MamaSafeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// # Errors
    /// Returns `MamaSafeError::Config` if a value is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MamaSafeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();

        if let Some(v) = get(DB_PATH_ENV) {
            config.db_path = PathBuf::from(v);
        }
        if let Some(v) = get(MODEL_PATH_ENV) {
            config.model_path = PathBuf::from(v);
        }
        config.model_sha256 = get(MODEL_SHA256_ENV);

        if let Some(v) = get(GLUCOSE_MIN_ENV) {
            let min: f64 = v
                .parse()
                .map_err(|_| MamaSafeError::Config(format!("{GLUCOSE_MIN_ENV}={v} is not a number")))?;
            if !(min > 0.0 && min < GLUCOSE_MAX) {
                return Err(MamaSafeError::Config(format!(
                    "{GLUCOSE_MIN_ENV}={v} must lie between 0 and {GLUCOSE_MAX}"
                )));
            }
            config.glucose_min = min;
        }

        if let Some(v) = get(HISTORY_LIMIT_ENV) {
            config.history_limit = v
                .parse::<usize>()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| {
                    MamaSafeError::Config(format!("{HISTORY_LIMIT_ENV}={v} must be a positive integer"))
                })?;
        }

        if let Some(v) = get(LOG_MODE_ENV) {
            config.log_mode = match v.to_ascii_lowercase().as_str() {
                "stderr" => LogMode::Stderr,
                "file" => LogMode::File,
                other => {
                    return Err(MamaSafeError::Config(format!(
                        "{LOG_MODE_ENV}={other} must be 'stderr' or 'file'"
                    )))
                }
            };
        }
        if let Some(v) = get(LOG_FILE_ENV) {
            config.log_file = PathBuf::from(v);
        }

        Ok(config)
    }

    #[must_use]
    pub fn vital_bounds(&self) -> VitalBounds {
        VitalBounds::with_glucose_min(self.glucose_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).expect("Should load");
        assert_eq!(config, Config::default());
        assert!((config.vital_bounds().glucose_min - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (DB_PATH_ENV, "/tmp/m.db"),
            (MODEL_PATH_ENV, "/opt/models/gdm_model.json"),
            (MODEL_SHA256_ENV, "abc123"),
            (GLUCOSE_MIN_ENV, "40"),
            (HISTORY_LIMIT_ENV, "25"),
            (LOG_MODE_ENV, "FILE"),
        ]))
        .expect("Should load");

        assert_eq!(config.db_path, PathBuf::from("/tmp/m.db"));
        assert_eq!(config.model_sha256.as_deref(), Some("abc123"));
        assert!((config.glucose_min - 40.0).abs() < f64::EPSILON);
        assert_eq!(config.history_limit, 25);
        assert_eq!(config.log_mode, LogMode::File);
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = Config::from_lookup(lookup(&[(MODEL_SHA256_ENV, "  ")])).expect("Should load");
        assert!(config.model_sha256.is_none());
    }

    #[test]
    fn test_invalid_values_rejected() {
        for pairs in [
            [(GLUCOSE_MIN_ENV, "fifty")],
            [(GLUCOSE_MIN_ENV, "450")],
            [(HISTORY_LIMIT_ENV, "0")],
            [(LOG_MODE_ENV, "syslog")],
        ] {
            let err = Config::from_lookup(lookup(&pairs)).expect_err("Should reject");
            assert!(matches!(err, MamaSafeError::Config(_)));
        }
    }
}
