//! Deadline risk prediction.
//!
//! # Responsibility
//! - Assess goal risk from velocity, bottlenecks, simulated scenarios and
//!   historical patterns.
//! - Predict completion dates with a Monte Carlo trajectory simulation.
//!
//! # Invariants
//! - Public entry points never return errors; internal failures become a
//!   fixed low-confidence fallback assessment.
//! - Assessment confidence stays within `[0, confidence_cap]`.
//! - `risk_level` is a pure function of the bounded composite score.

pub mod bottleneck;
pub mod cache;
pub mod context;
pub mod predictor;
pub mod scenario;
pub mod trajectory;
pub mod velocity;

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Qualitative deadline risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Maps a composite score in `[0, 1]` to a level.
    pub fn from_score(score: f64) -> Self {
        if score > 0.8 {
            Self::Critical
        } else if score > 0.6 {
            Self::High
        } else if score > 0.3 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Internal assessment failure; converted into the fallback assessment.
#[derive(Debug, Clone, PartialEq)]
pub enum RiskAssessmentError {
    InvalidProgress(f64),
    InvalidHistory(String),
    InvalidResource(String),
}

impl Display for RiskAssessmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProgress(value) => write!(f, "progress {value} is not a finite fraction"),
            Self::InvalidHistory(message) => write!(f, "invalid progress history: {message}"),
            Self::InvalidResource(message) => write!(f, "invalid resource constraint: {message}"),
        }
    }
}

impl Error for RiskAssessmentError {}

#[cfg(test)]
mod tests {
    use super::RiskLevel;

    #[test]
    fn score_thresholds_are_exclusive() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.3), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.31), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.6), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(0.61), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.81), RiskLevel::Critical);
    }
}
