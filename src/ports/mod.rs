//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the assessment pipeline and its collaborators (classifier
//! artifact, record store, care-team directory, notification inbox).

mod classifier;
mod storage;

pub use classifier::{Classifier, InferenceError};
pub use storage::{CareTeamDirectory, NotificationStore, Page, PredictionStore};
