//! Prediction context shared by all risk analyses.
//!
//! The context is built once per assessment and is fully deterministic for a
//! given goal, history and `now`.

use crate::config::RiskConfig;
use crate::model::goal::{Complexity, Goal, KeyResult, Priority};
use crate::model::task::Task;
use crate::model::EntityId;
use crate::risk::RiskAssessmentError;
use crate::rules::{contains_any, count_matches};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const SECONDS_PER_WEEK: f64 = 7.0 * 24.0 * 3600.0;

/// Caller-supplied history for one goal. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoricalData {
    /// Progress fraction gained per week, oldest first.
    pub weekly_velocity: Vec<f64>,
    pub tasks: Vec<Task>,
    pub available_hours_per_week: Option<f64>,
    /// Skill name to level in `[0, 1]`.
    pub skill_levels: BTreeMap<String, f64>,
    pub completed_goals: u32,
    pub missed_deadlines: u32,
    /// Used when no key results exist; fraction in `[0, 1]`.
    pub current_progress: Option<f64>,
}

/// Resource limits the bottleneck checks measure against.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceConstraints {
    pub available_hours_per_week: f64,
    pub energy_capacity: f64,
    pub deep_work_share: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionContext {
    pub goal_id: EntityId,
    pub now: DateTime<Utc>,
    /// Fraction in `[0, 1]`.
    pub progress: f64,
    pub deadline: Option<DateTime<Utc>>,
    pub weeks_remaining: f64,
    pub velocity_history: Vec<f64>,
    /// True when `velocity_history` is the configured default curve.
    pub cold_start: bool,
    pub seasonal_factor: f64,
    pub resources: ResourceConstraints,
    /// Open tasks linked to the goal (or unlinked).
    pub tasks: Vec<Task>,
    pub skill_levels: BTreeMap<String, f64>,
    pub priority: Priority,
    pub complexity: Complexity,
    /// Goal text plus open task titles, for keyword checks.
    pub text: String,
    pub risk_triggers: usize,
    pub missed_deadline_ratio: f64,
}

impl PredictionContext {
    pub fn build(
        goal: &Goal,
        key_results: &[KeyResult],
        history: &HistoricalData,
        now: DateTime<Utc>,
        config: &RiskConfig,
    ) -> Result<Self, RiskAssessmentError> {
        let progress = resolve_progress(key_results, history)?;

        let (velocity_history, cold_start) = if history.weekly_velocity.is_empty() {
            (config.default_velocity_curve.clone(), true)
        } else {
            (history.weekly_velocity.clone(), false)
        };
        if let Some(bad) = velocity_history.iter().find(|value| !value.is_finite()) {
            return Err(RiskAssessmentError::InvalidHistory(format!(
                "weekly velocity {bad} is not finite"
            )));
        }

        let available_hours = history
            .available_hours_per_week
            .or(goal.time_allocation_target)
            .unwrap_or(config.default_available_hours);
        if !available_hours.is_finite() || available_hours < 0.0 {
            return Err(RiskAssessmentError::InvalidResource(format!(
                "available hours {available_hours} must be a non-negative number"
            )));
        }

        let deadline = goal.effective_deadline();
        let weeks_remaining = match deadline {
            Some(deadline) => ((deadline - now).num_seconds() as f64 / SECONDS_PER_WEEK).max(0.0),
            None => config.default_timeframe_days as f64 / 7.0,
        };

        let tasks: Vec<Task> = history
            .tasks
            .iter()
            .filter(|task| task.status.is_open())
            .filter(|task| task.goal_ids.is_empty() || task.goal_ids.contains(&goal.id))
            .cloned()
            .collect();

        let mut text = goal.classification_text();
        for task in &tasks {
            text.push(' ');
            text.push_str(&task.title);
        }

        let seasonal_factor = config
            .seasonal_factors
            .get(now.month0() as usize)
            .copied()
            .unwrap_or(1.0);

        let attempts = history.completed_goals + history.missed_deadlines;
        let missed_deadline_ratio = if attempts == 0 {
            0.0
        } else {
            f64::from(history.missed_deadlines) / f64::from(attempts)
        };

        Ok(Self {
            goal_id: goal.id,
            now,
            progress,
            deadline,
            weeks_remaining,
            velocity_history,
            cold_start,
            seasonal_factor,
            resources: ResourceConstraints {
                available_hours_per_week: available_hours,
                energy_capacity: config.energy_capacity,
                deep_work_share: config.deep_work_share,
            },
            tasks,
            skill_levels: history.skill_levels.clone(),
            priority: goal.priority,
            complexity: goal.complexity,
            risk_triggers: count_matches(&text, &config.risk_trigger_keywords),
            text,
            missed_deadline_ratio,
        })
    }

    pub fn total_task_hours(&self) -> f64 {
        self.tasks.iter().map(Task::estimated_hours).sum()
    }

    /// Hours of open tasks carrying one of `tags`.
    pub fn tagged_task_hours(&self, tags: &[String]) -> f64 {
        self.tasks
            .iter()
            .filter(|task| tags.iter().any(|tag| task.has_tag(tag)))
            .map(Task::estimated_hours)
            .sum()
    }

    pub fn mentions_any(&self, keywords: &[String]) -> bool {
        contains_any(&self.text, keywords)
    }
}

fn resolve_progress(
    key_results: &[KeyResult],
    history: &HistoricalData,
) -> Result<f64, RiskAssessmentError> {
    let progress = if key_results.is_empty() {
        history.current_progress.unwrap_or(0.0)
    } else {
        key_results
            .iter()
            .map(|key_result| key_result.progress / 100.0)
            .sum::<f64>()
            / key_results.len() as f64
    };
    if !progress.is_finite() {
        return Err(RiskAssessmentError::InvalidProgress(progress));
    }
    Ok(progress.clamp(0.0, 1.0))
}
