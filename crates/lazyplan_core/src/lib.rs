//! Core planning, prediction and retrieval logic for LazyPlan.
//! This crate is the single source of truth for planning invariants.

pub mod brain;
pub mod config;
pub mod logging;
pub mod model;
pub mod planner;
pub mod risk;
pub mod rules;

pub use brain::answer::ConversationalResponse;
pub use brain::index::{SearchOptions, SearchResult, SemanticIndex};
pub use brain::record::{IndexEntry, RecordType};
pub use brain::summary::Timeframe;
pub use brain::{IndexingError, SearchError, SummaryError};
pub use config::{ConfigError, EngineConfig, IndexConfig, PlannerConfig, RiskConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::goal::{Complexity, Goal, GoalStatus, KeyResult, Priority};
pub use model::plan::Milestone;
pub use model::task::{Task, TaskStatus, TimeBlock, TimeBlockType};
pub use planner::decomposer::GoalDecomposer;
pub use planner::{DecompositionError, DecompositionResult, GoalDecomposition};
pub use risk::context::HistoricalData;
pub use risk::predictor::{GoalRiskAssessment, RiskFactor, RiskPredictor};
pub use risk::trajectory::TrajectoryPrediction;
pub use risk::RiskLevel;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
