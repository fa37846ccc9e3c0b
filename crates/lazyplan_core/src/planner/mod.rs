//! Goal decomposition.
//!
//! # Responsibility
//! - Turn one goal (plus optional key results) into milestones, tasks,
//!   proposed time blocks and a weekly schedule recommendation.
//!
//! # Invariants
//! - Every call regenerates the whole plan; nothing is patched incrementally.
//! - A failed step fails the whole call; callers never see a partial plan.
//! - Milestone deadlines strictly increase and never pass the goal deadline.

pub mod decomposer;
pub mod schedule;
pub mod strategy;
pub mod tasks;

use crate::model::goal::Goal;
use crate::model::plan::Milestone;
use crate::model::task::{Task, TimeBlock};
use chrono::{DateTime, Utc};
use schedule::WeeklyScheduleRecommendation;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use strategy::DecompositionStrategy;

pub type DecompositionResult<T> = Result<T, DecompositionError>;

/// Hard failure of a decomposition call.
#[derive(Debug, Clone, PartialEq)]
pub enum DecompositionError {
    /// Goal input violates a precondition (e.g. blank title).
    InvalidGoal(String),
    DeadlineInPast { deadline: DateTime<Utc> },
    MilestoneGeneration(String),
    TaskGeneration(String),
    Scheduling(String),
}

impl Display for DecompositionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidGoal(message) => write!(f, "invalid goal: {message}"),
            Self::DeadlineInPast { deadline } => {
                write!(f, "goal deadline {} is not in the future", deadline.to_rfc3339())
            }
            Self::MilestoneGeneration(message) => {
                write!(f, "milestone generation failed: {message}")
            }
            Self::TaskGeneration(message) => write!(f, "task generation failed: {message}"),
            Self::Scheduling(message) => write!(f, "schedule generation failed: {message}"),
        }
    }
}

impl Error for DecompositionError {}

/// Complete plan produced for one goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDecomposition {
    pub goal: Goal,
    pub strategy: DecompositionStrategy,
    pub milestones: Vec<Milestone>,
    pub tasks: Vec<Task>,
    pub time_blocks: Vec<TimeBlock>,
    pub weekly_schedule: WeeklyScheduleRecommendation,
}
