//! Adapters layer: Concrete implementations of ports.
//!
//! - `model`: Logistic-regression artifact loaded from JSON
//! - `rules`: Additive rule-based fallback classifier
//! - `sqlite`: SQLite for history, assignments and notifications
//! - `sanitize`: PII filtering for logs

pub mod model;
pub mod rules;
pub mod sanitize;
pub mod sqlite;

pub use model::ModelLoadError;
pub use sqlite::StorageError;
