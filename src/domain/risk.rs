//! Risk level classification.
//!
//! Maps the classifier's probability (or the rule score) onto three tiers.
//! Each tier carries a fixed confidence value that is reporting policy, not a
//! statistic derived from the prediction.

use serde::{Deserialize, Serialize};

/// Percentage at or above which a case is High risk.
pub const HIGH_RISK_THRESHOLD: f64 = 60.0;

/// Percentage at or above which a case is Medium risk.
pub const MEDIUM_RISK_THRESHOLD: f64 = 30.0;

/// Three-tier gestational diabetes risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Map a percentage (0–100) to a tier. Lower bounds are inclusive.
    #[must_use]
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= HIGH_RISK_THRESHOLD {
            Self::High
        } else if percentage >= MEDIUM_RISK_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Fixed confidence reported alongside this tier.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Low => 92.0,
            Self::Medium => 78.0,
            Self::High => 85.0,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    /// Parse the stored representation. Case-insensitive.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw classifier output, before interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationResult {
    /// Predicted label for the high-risk class
    pub high_risk: bool,

    /// Probability mass on the high-risk class (0.0 to 1.0)
    pub probability: f64,

    /// Name of the classifier that produced this result
    pub classifier: &'static str,
}

impl ClassificationResult {
    #[must_use]
    pub fn new(high_risk: bool, probability: f64, classifier: &'static str) -> Self {
        Self {
            high_risk,
            probability,
            classifier,
        }
    }

    /// Unrounded probability as a percentage.
    fn raw_percentage(&self) -> f64 {
        self.probability.clamp(0.0, 1.0) * 100.0
    }

    /// Probability as a percentage rounded to two decimals, for reporting.
    #[must_use]
    pub fn risk_percentage(&self) -> f64 {
        round2(self.raw_percentage())
    }

    /// Tier for this result. Mapped from the unrounded percentage so values
    /// just below a threshold never round up into the next tier.
    #[must_use]
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_percentage(self.raw_percentage())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
