//! Milestone model.

use crate::model::EntityId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Intermediate checkpoint between now and a goal's deadline.
///
/// # Invariants
/// - Within one goal, deadlines strictly increase in list order.
/// - `dependencies` holds the previous milestone only (linear chain).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: EntityId,
    pub goal_id: EntityId,
    pub title: String,
    pub description: String,
    pub deadline: DateTime<Utc>,
    /// Percent complete in `[0, 100]`.
    pub progress: f64,
    pub dependencies: Vec<EntityId>,
    pub task_ids: Vec<EntityId>,
}
