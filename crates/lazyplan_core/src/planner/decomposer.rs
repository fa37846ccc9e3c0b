//! Goal decomposer service.
//!
//! # Responsibility
//! - Orchestrate strategy selection, milestone post-processing, task
//!   generation, time-block proposals and the weekly schedule.
//!
//! # Invariants
//! - Output is all-or-nothing: any step error aborts the call.
//! - Milestone `i` depends on milestone `i - 1` only.

use crate::config::{ConfigError, PlannerConfig};
use crate::model::goal::{Goal, KeyResult, Priority};
use crate::model::plan::Milestone;
use crate::planner::schedule::{
    domain_rules, propose_time_blocks, recommend_weekly_schedule, ScheduleDomain,
};
use crate::planner::strategy::{
    enforce_spacing, generate_drafts, rebase_to_deadline, StrategySelector,
};
use crate::planner::tasks::TemplateSelector;
use crate::planner::{DecompositionError, DecompositionResult, GoalDecomposition};
use crate::risk::predictor::GoalRiskAssessment;
use crate::risk::RiskLevel;
use crate::rules::RuleSet;
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use uuid::Uuid;

/// Planner service; construct once per configuration and reuse.
#[derive(Debug, Clone)]
pub struct GoalDecomposer {
    config: PlannerConfig,
    strategies: StrategySelector,
    templates: TemplateSelector,
    domains: RuleSet<ScheduleDomain>,
}

impl Default for GoalDecomposer {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl GoalDecomposer {
    /// Validates `config` before building the service.
    pub fn try_new(config: PlannerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn new(config: PlannerConfig) -> Self {
        Self {
            strategies: StrategySelector::from_config(&config),
            templates: TemplateSelector::from_config(&config),
            domains: domain_rules(&config),
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Decomposes `goal` relative to the current time.
    pub fn decompose(
        &self,
        goal: &Goal,
        key_results: &[KeyResult],
    ) -> DecompositionResult<GoalDecomposition> {
        self.decompose_at(goal, key_results, Utc::now())
    }

    /// Decomposes `goal` relative to `now`.
    ///
    /// # Errors
    /// - `InvalidGoal` when the title is blank.
    /// - `DeadlineInPast` when the effective deadline is not after `now`.
    /// - Step errors from milestone, task or schedule generation.
    pub fn decompose_at(
        &self,
        goal: &Goal,
        key_results: &[KeyResult],
        now: DateTime<Utc>,
    ) -> DecompositionResult<GoalDecomposition> {
        let result = self.build(goal, key_results, now);
        match &result {
            Ok(plan) => info!(
                "event=goal_decomposed module=planner status=ok goal_id={} strategy={:?} milestones={} tasks={} blocks={}",
                goal.id,
                plan.strategy,
                plan.milestones.len(),
                plan.tasks.len(),
                plan.time_blocks.len()
            ),
            Err(err) => warn!(
                "event=goal_decomposed module=planner status=error goal_id={} error={}",
                goal.id, err
            ),
        }
        result
    }

    /// Decomposes and then escalates first-milestone tasks for risky goals.
    ///
    /// When the assessment is `High` or `Critical`, medium-priority tasks of
    /// the earliest milestone become high priority before blocks are placed.
    ///
    /// # Errors
    /// - `InvalidGoal` when the assessment belongs to another goal.
    /// - Every error of `decompose_at`.
    pub fn decompose_with_assessment(
        &self,
        goal: &Goal,
        key_results: &[KeyResult],
        assessment: &GoalRiskAssessment,
        now: DateTime<Utc>,
    ) -> DecompositionResult<GoalDecomposition> {
        if assessment.goal_id != goal.id {
            warn!(
                "event=plan_escalated module=planner status=error goal_id={} assessment_goal_id={}",
                goal.id, assessment.goal_id
            );
            return Err(DecompositionError::InvalidGoal(format!(
                "risk assessment belongs to goal {}",
                assessment.goal_id
            )));
        }
        let mut plan = self.decompose_at(goal, key_results, now)?;
        if !matches!(assessment.risk_level, RiskLevel::High | RiskLevel::Critical) {
            return Ok(plan);
        }

        let Some(first) = plan.milestones.first() else {
            return Ok(plan);
        };
        let first_id = first.id;
        let mut escalated = 0usize;
        for task in plan
            .tasks
            .iter_mut()
            .filter(|task| task.milestone_id == Some(first_id))
        {
            if task.priority == Priority::Medium {
                task.priority = Priority::High;
                escalated += 1;
            }
        }
        if escalated > 0 {
            plan.time_blocks = propose_time_blocks(&plan.tasks, now, &self.config)?;
        }
        info!(
            "event=plan_escalated module=planner status=ok goal_id={} risk={:?} escalated={}",
            goal.id, assessment.risk_level, escalated
        );
        Ok(plan)
    }

    fn build(
        &self,
        goal: &Goal,
        key_results: &[KeyResult],
        now: DateTime<Utc>,
    ) -> DecompositionResult<GoalDecomposition> {
        if goal.title.trim().is_empty() {
            return Err(DecompositionError::InvalidGoal(
                "goal title must not be empty".to_string(),
            ));
        }
        let goal_deadline = goal.effective_deadline();
        if let Some(deadline) = goal_deadline {
            if deadline <= now {
                return Err(DecompositionError::DeadlineInPast { deadline });
            }
        }
        let horizon_end = match goal_deadline {
            Some(deadline) => deadline,
            None => Duration::try_days(self.config.default_timeframe_days)
                .and_then(|span| now.checked_add_signed(span))
                .ok_or_else(|| {
                    DecompositionError::MilestoneGeneration(
                        "default timeframe overflowed".to_string(),
                    )
                })?,
        };

        let strategy = self.strategies.select(goal, key_results);
        let mut drafts =
            generate_drafts(strategy, goal, key_results, now, horizon_end, &self.config)?;
        enforce_spacing(&mut drafts, now, self.config.min_milestone_spacing_days)?;
        if let Some(deadline) = goal_deadline {
            rebase_to_deadline(
                &mut drafts,
                now,
                deadline,
                self.config.min_milestone_spacing_days,
            )?;
        }

        let mut milestones = Vec::with_capacity(drafts.len());
        let mut tasks = Vec::new();
        let mut previous: Option<Uuid> = None;
        for draft in &drafts {
            let mut milestone = Milestone {
                id: Uuid::new_v4(),
                goal_id: goal.id,
                title: draft.title.clone(),
                description: draft.description.clone(),
                deadline: draft.deadline,
                progress: 0.0,
                dependencies: previous.into_iter().collect(),
                task_ids: Vec::new(),
            };
            tasks.extend(self.templates.generate(&mut milestone, &draft.phase)?);
            previous = Some(milestone.id);
            milestones.push(milestone);
        }

        let time_blocks = propose_time_blocks(&tasks, now, &self.config)?;
        let weekly_schedule = recommend_weekly_schedule(
            goal,
            &tasks,
            &self.domains,
            now,
            horizon_end,
            &self.config,
        );

        Ok(GoalDecomposition {
            goal: goal.clone(),
            strategy,
            milestones,
            tasks,
            time_blocks,
            weekly_schedule,
        })
    }
}
