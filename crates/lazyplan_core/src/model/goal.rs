//! Goal and key result model.

use crate::model::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shared priority scale for goals and tasks.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    /// Energy demand multiplier used by the energy bottleneck check.
    pub fn weight(self) -> f64 {
        match self {
            Self::Low => 0.5,
            Self::Medium => 1.0,
            Self::High => 1.5,
            Self::Critical => 2.0,
        }
    }

    /// Whether blocks for this priority go into the morning slot.
    pub fn is_urgent(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Perceived difficulty of a goal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    #[default]
    Moderate,
    Complex,
    Expert,
}

impl Complexity {
    pub fn weight(self) -> f64 {
        match self {
            Self::Simple => 0.8,
            Self::Moderate => 1.0,
            Self::Complex => 1.3,
            Self::Expert => 1.6,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    Active,
    Paused,
    Completed,
    Abandoned,
}

/// A user goal as supplied by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: GoalStatus,
    /// Soft target; used when no hard `deadline` exists.
    #[serde(default)]
    pub target_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_hours_target: Option<f64>,
    /// Planned hours per week.
    #[serde(default)]
    pub time_allocation_target: Option<f64>,
    #[serde(default)]
    pub complexity: Complexity,
}

impl Goal {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            priority: Priority::default(),
            status: GoalStatus::default(),
            target_date: None,
            deadline: None,
            total_hours_target: None,
            time_allocation_target: None,
            complexity: Complexity::default(),
        }
    }

    /// Hard deadline, falling back to the soft target date.
    pub fn effective_deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline.or(self.target_date)
    }

    /// Title and description joined for keyword classification.
    pub fn classification_text(&self) -> String {
        match self.description.as_deref() {
            Some(description) => format!("{} {}", self.title, description),
            None => self.title.clone(),
        }
    }
}

/// Measurable outcome attached to a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyResult {
    pub id: EntityId,
    pub goal_id: EntityId,
    pub title: String,
    /// Percent complete in `[0, 100]`.
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub target_value: f64,
    #[serde(default)]
    pub current_value: f64,
}

impl KeyResult {
    pub fn new(goal_id: EntityId, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal_id,
            title: title.into(),
            progress: 0.0,
            target_value: 0.0,
            current_value: 0.0,
        }
    }

    /// Progress as a fraction in `[0, 1]`.
    pub fn progress_fraction(&self) -> f64 {
        (self.progress / 100.0).clamp(0.0, 1.0)
    }
}
