//! Task and time-block model.

use crate::model::goal::Priority;
use crate::model::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Open tasks still consume time budget.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Todo | Self::InProgress)
    }
}

/// Actionable unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub goal_ids: Vec<EntityId>,
    /// Set for tasks generated from a milestone.
    #[serde(default)]
    pub milestone_id: Option<EntityId>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(title: impl Into<String>, estimated_minutes: u32, priority: Priority) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            estimated_minutes,
            priority,
            status: TaskStatus::Todo,
            goal_ids: Vec::new(),
            milestone_id: None,
            tags: Vec::new(),
            due_date: None,
        }
    }

    pub fn estimated_hours(&self) -> f64 {
        f64::from(self.estimated_minutes) / 60.0
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|value| value.eq_ignore_ascii_case(tag))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBlockType {
    DeepWork,
    #[default]
    Focus,
    Meeting,
    Break,
    Personal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBlockStatus {
    /// Suggested by the planner; the external scheduler decides placement.
    #[default]
    Proposed,
    Scheduled,
    Completed,
    Cancelled,
}

/// Calendar slot, either proposed by the planner or supplied by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBlock {
    pub id: EntityId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(rename = "type", default)]
    pub block_type: TimeBlockType,
    #[serde(default)]
    pub status: TimeBlockStatus,
    #[serde(default)]
    pub task_id: Option<EntityId>,
}

impl TimeBlock {
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}
