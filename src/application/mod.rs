//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod assessment;
mod care_team;
mod escalation;

pub use assessment::{AssessmentOutcome, AssessmentService, ClassifierStatus};
pub use care_team::{CareTeamService, DEFAULT_PAGE_SIZE};
pub use escalation::{EscalationDispatcher, EscalationError, EscalationStatus};
