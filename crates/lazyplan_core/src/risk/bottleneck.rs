//! Bottleneck detection.
//!
//! Four independent checks (time, skill, dependency, energy); each may emit
//! zero or more bottlenecks with a severity in `[0, 1]`.

use crate::config::RiskConfig;
use crate::risk::context::PredictionContext;
use crate::rules::contains_any;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BottleneckKind {
    Time,
    Skill,
    Dependency,
    Energy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bottleneck {
    pub kind: BottleneckKind,
    pub description: String,
    pub severity: f64,
    /// Set for dependency bottlenecks that gate a large share of the work.
    pub critical_path: bool,
    /// Estimated hours to close a skill gap.
    pub learning_hours: Option<f64>,
    pub mitigations: Vec<String>,
}

impl Bottleneck {
    fn new(kind: BottleneckKind, description: String, severity: f64) -> Self {
        Self {
            kind,
            description,
            severity: severity.clamp(0.0, 1.0),
            critical_path: false,
            learning_hours: None,
            mitigations: Vec::new(),
        }
    }

    fn with_mitigations(mut self, mitigations: &[&str]) -> Self {
        self.mitigations = mitigations.iter().map(|value| value.to_string()).collect();
        self
    }
}

pub fn detect(context: &PredictionContext, config: &RiskConfig) -> Vec<Bottleneck> {
    let mut found = Vec::new();
    found.extend(time_bottlenecks(context, config));
    found.extend(skill_bottlenecks(context, config));
    found.extend(dependency_bottleneck(context, config));
    found.extend(energy_bottleneck(context, config));
    found
}

fn time_bottlenecks(context: &PredictionContext, config: &RiskConfig) -> Vec<Bottleneck> {
    let mut found = Vec::new();
    let available = context.resources.available_hours_per_week;
    let total = context.total_task_hours();

    if total > 0.0 {
        let ratio = if available > 0.0 {
            total / available
        } else {
            f64::INFINITY
        };
        if ratio > config.time_overload_ratio {
            let severity = (2.0 * (ratio - 1.0)).min(1.0);
            found.push(
                Bottleneck::new(
                    BottleneckKind::Time,
                    format!(
                        "Open tasks need {total:.1} hours against {available:.1} available hours per week"
                    ),
                    severity,
                )
                .with_mitigations(&[
                    "Reduce scope or move the deadline to match available hours",
                    "Block recurring time on the calendar for this goal",
                ]),
            );
        }
    }

    let deep_hours = context.tagged_task_hours(&config.deep_work_tags);
    let deep_capacity = available * context.resources.deep_work_share;
    if deep_hours > deep_capacity * (1.0 + config.deep_work_tolerance) {
        let severity = if deep_capacity > 0.0 {
            (deep_hours / deep_capacity - 1.0).min(1.0)
        } else {
            1.0
        };
        found.push(
            Bottleneck::new(
                BottleneckKind::Time,
                format!(
                    "Deep-work tasks need {deep_hours:.1} hours but only {deep_capacity:.1} focused hours fit each week"
                ),
                severity,
            )
            .with_mitigations(&[
                "Protect uninterrupted morning blocks for deep work",
                "Split long deep-work tasks into smaller sessions",
            ]),
        );
    }

    found
}

fn skill_bottlenecks(context: &PredictionContext, config: &RiskConfig) -> Vec<Bottleneck> {
    config
        .skills
        .iter()
        .filter(|skill| contains_any(&context.text, &skill.keywords))
        .filter_map(|skill| {
            let current = context
                .skill_levels
                .get(&skill.name)
                .copied()
                .unwrap_or(config.default_skill_level);
            let gap = skill.required_level - current;
            if gap <= config.skill_gap_threshold {
                return None;
            }
            let hours = gap * config.learning_hours_per_gap;
            let mut bottleneck = Bottleneck::new(
                BottleneckKind::Skill,
                format!(
                    "Skill gap in {}: level {current:.2} against {:.2} required",
                    skill.name, skill.required_level
                ),
                gap,
            )
            .with_mitigations(&[
                "Schedule dedicated learning sessions before dependent work",
                "Find a mentor or course for the weakest skill",
            ]);
            bottleneck.learning_hours = Some(hours);
            Some(bottleneck)
        })
        .collect()
}

fn dependency_bottleneck(context: &PredictionContext, config: &RiskConfig) -> Option<Bottleneck> {
    let gated = context
        .tasks
        .iter()
        .filter(|task| {
            contains_any(&task.title, &config.approval_keywords)
                || task
                    .description
                    .as_deref()
                    .is_some_and(|text| contains_any(text, &config.approval_keywords))
        })
        .count();
    if gated == 0 {
        return None;
    }
    let share = gated as f64 / context.tasks.len().max(1) as f64;
    let mut bottleneck = Bottleneck::new(
        BottleneckKind::Dependency,
        format!("{gated} task(s) wait on approvals or stakeholder input"),
        0.3 + share,
    )
    .with_mitigations(&[
        "Request approvals as early as possible",
        "Agree on response deadlines with stakeholders",
    ]);
    bottleneck.critical_path = share > config.critical_path_share;
    Some(bottleneck)
}

fn energy_bottleneck(context: &PredictionContext, config: &RiskConfig) -> Option<Bottleneck> {
    let demand = context.priority.weight() * context.complexity.weight();
    let capacity = context.resources.energy_capacity;
    if demand <= capacity * (1.0 + config.energy_tolerance) {
        return None;
    }
    Some(
        Bottleneck::new(
            BottleneckKind::Energy,
            format!("Energy demand {demand:.2} exceeds sustainable capacity {capacity:.2}"),
            demand / capacity - 1.0,
        )
        .with_mitigations(&[
            "Schedule demanding work at peak-energy times",
            "Plan recovery days between intense sessions",
        ]),
    )
}
