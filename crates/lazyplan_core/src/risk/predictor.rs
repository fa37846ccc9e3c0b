//! Risk predictor service.
//!
//! # Responsibility
//! - Combine velocity, bottleneck, scenario and pattern signals into a
//!   composite score, risk level, risk factors and recommendations.
//! - Produce Monte Carlo trajectory predictions.
//!
//! # Invariants
//! - `assess_goal_risk*` never fails; internal errors yield the fallback
//!   assessment (medium risk, fixed low confidence).
//! - Composite score terms are bounded: velocity 0.4, bottlenecks 0.3,
//!   scenarios 0.2, patterns 0.1.

use crate::config::{ConfigError, RiskConfig};
use crate::model::goal::{Complexity, Goal, KeyResult};
use crate::model::EntityId;
use crate::risk::bottleneck::{self, Bottleneck, BottleneckKind};
use crate::risk::context::{HistoricalData, PredictionContext};
use crate::risk::scenario::{self, RiskScenario};
use crate::risk::trajectory::{
    estimate, milestone_predictions, percentile, simulate_weeks, NoiseSource, RngNoise,
    TrajectoryPrediction,
};
use crate::risk::velocity::{self, mean, VelocityAnalysis};
use crate::risk::{RiskAssessmentError, RiskLevel};
use crate::rules::contains_any;
use chrono::{DateTime, Datelike, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

const LOW_TIME_BUDGET_HOURS: f64 = 5.0;
const OPTIMISTIC_PROBABILITY: f64 = 0.9;
const REALISTIC_PROBABILITY: f64 = 0.5;
const CONSERVATIVE_PROBABILITY: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactorKind {
    Velocity,
    Time,
    Skill,
    Dependency,
    Energy,
    Scenario,
    Pattern,
}

impl From<BottleneckKind> for RiskFactorKind {
    fn from(value: BottleneckKind) -> Self {
        match value {
            BottleneckKind::Time => Self::Time,
            BottleneckKind::Skill => Self::Skill,
            BottleneckKind::Dependency => Self::Dependency,
            BottleneckKind::Energy => Self::Energy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub kind: RiskFactorKind,
    pub description: String,
    pub severity: f64,
}

/// Per-term breakdown of the composite score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub velocity: f64,
    pub bottlenecks: f64,
    pub scenarios: f64,
    pub patterns: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        (self.velocity + self.bottlenecks + self.scenarios + self.patterns).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalRiskAssessment {
    pub goal_id: EntityId,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub score_breakdown: ScoreBreakdown,
    /// In `[0, confidence_cap]`.
    pub confidence: f64,
    pub velocity: VelocityAnalysis,
    pub risk_factors: Vec<RiskFactor>,
    pub bottlenecks: Vec<Bottleneck>,
    pub scenarios: Vec<RiskScenario>,
    pub recommendations: Vec<String>,
    pub assessed_at: DateTime<Utc>,
    /// True when the assessment is the fixed fallback.
    pub fallback: bool,
}

/// Stateless risk service; construct once per configuration.
#[derive(Debug, Clone, Default)]
pub struct RiskPredictor {
    config: RiskConfig,
}

impl RiskPredictor {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn try_new(config: RiskConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn assess_goal_risk(
        &self,
        goal: &Goal,
        key_results: &[KeyResult],
        history: &HistoricalData,
    ) -> GoalRiskAssessment {
        self.assess_goal_risk_at(goal, key_results, history, Utc::now())
    }

    /// Assesses risk relative to `now`; never fails.
    pub fn assess_goal_risk_at(
        &self,
        goal: &Goal,
        key_results: &[KeyResult],
        history: &HistoricalData,
        now: DateTime<Utc>,
    ) -> GoalRiskAssessment {
        match self.try_assess(goal, key_results, history, now) {
            Ok(assessment) => {
                debug!(
                    "event=risk_assessed module=risk status=ok goal_id={} level={:?} score={:.3} confidence={:.3}",
                    goal.id, assessment.risk_level, assessment.risk_score, assessment.confidence
                );
                assessment
            }
            Err(err) => {
                warn!(
                    "event=risk_assessed module=risk status=degraded goal_id={} error={}",
                    goal.id, err
                );
                self.fallback_assessment(goal.id, now)
            }
        }
    }

    /// Risk factors only, for callers that do not need the full assessment.
    pub fn identify_risk_factors(
        &self,
        goal: &Goal,
        key_results: &[KeyResult],
        history: &HistoricalData,
    ) -> Vec<RiskFactor> {
        self.assess_goal_risk(goal, key_results, history).risk_factors
    }

    fn try_assess(
        &self,
        goal: &Goal,
        key_results: &[KeyResult],
        history: &HistoricalData,
        now: DateTime<Utc>,
    ) -> Result<GoalRiskAssessment, RiskAssessmentError> {
        let config = &self.config;
        let context = PredictionContext::build(goal, key_results, history, now, config)?;
        let velocity = velocity::analyze(&context, config);
        let bottlenecks = bottleneck::detect(&context, config);
        let scenarios = scenario::simulate(&context, &velocity, config);

        let score_breakdown = composite_score(&context, &velocity, &bottlenecks, &scenarios);
        let risk_score = score_breakdown.total();
        if !risk_score.is_finite() {
            return Err(RiskAssessmentError::InvalidHistory(
                "composite score is not finite".to_string(),
            ));
        }

        let mut confidence = velocity.confidence.min(config.confidence_cap);
        if velocity.cold_start {
            confidence = confidence.min(config.cold_start_confidence_cap);
        }

        let risk_factors = risk_factors(&context, &velocity, &bottlenecks, &scenarios);
        let recommendations = recommendations(
            &velocity,
            &bottlenecks,
            &scenarios,
            config.max_recommendations,
        );

        Ok(GoalRiskAssessment {
            goal_id: goal.id,
            risk_level: RiskLevel::from_score(risk_score),
            risk_score,
            score_breakdown,
            confidence: confidence.max(0.0),
            velocity,
            risk_factors,
            bottlenecks,
            scenarios,
            recommendations,
            assessed_at: now,
            fallback: false,
        })
    }

    fn fallback_assessment(&self, goal_id: EntityId, now: DateTime<Utc>) -> GoalRiskAssessment {
        GoalRiskAssessment {
            goal_id,
            risk_level: RiskLevel::Medium,
            risk_score: 0.5,
            score_breakdown: ScoreBreakdown::default(),
            confidence: self.config.fallback_confidence,
            velocity: VelocityAnalysis::default(),
            risk_factors: Vec::new(),
            bottlenecks: Vec::new(),
            scenarios: Vec::new(),
            recommendations: vec![
                "Risk analysis is unavailable for this goal; review its progress manually this week"
                    .to_string(),
            ],
            assessed_at: now,
            fallback: true,
        }
    }

    /// Predicts completion from the configured default velocity curve.
    pub fn predict_trajectory(&self, goal: &Goal, current_progress: f64) -> TrajectoryPrediction {
        let mut noise = RngNoise::from_seed_option(self.config.monte_carlo.seed);
        self.predict_trajectory_with(
            goal,
            current_progress,
            &HistoricalData::default(),
            &mut noise,
            Utc::now(),
        )
    }

    /// Predicts completion from `history` using `noise` for every sample.
    ///
    /// `current_progress` is a fraction; non-finite values are treated as 0.
    pub fn predict_trajectory_with(
        &self,
        goal: &Goal,
        current_progress: f64,
        history: &HistoricalData,
        noise: &mut dyn NoiseSource,
        now: DateTime<Utc>,
    ) -> TrajectoryPrediction {
        let config = &self.config;
        let progress = if current_progress.is_finite() {
            current_progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let curve: Vec<f64> = history
            .weekly_velocity
            .iter()
            .copied()
            .filter(|value| value.is_finite())
            .collect();
        let curve = if curve.is_empty() {
            &config.default_velocity_curve
        } else {
            &curve
        };
        let seasonal = config
            .seasonal_factors
            .get(now.month0() as usize)
            .copied()
            .unwrap_or(1.0);
        let base_velocity = mean(curve) * seasonal;

        let weeks = simulate_weeks(base_velocity, 1.0 - progress, &config.monte_carlo, noise);
        let optimistic = estimate(now, percentile(&weeks, 0.1), OPTIMISTIC_PROBABILITY);
        let realistic = estimate(now, percentile(&weeks, 0.5), REALISTIC_PROBABILITY);
        let conservative = estimate(now, percentile(&weeks, 0.9), CONSERVATIVE_PROBABILITY);
        let milestones = milestone_predictions(now, progress, realistic.weeks);
        let blockers = self.trajectory_blockers(goal, history, realistic.completion);

        debug!(
            "event=trajectory_predicted module=risk status=ok goal_id={} iterations={} realistic_weeks={:.2}",
            goal.id,
            weeks.len(),
            realistic.weeks
        );

        TrajectoryPrediction {
            goal_id: goal.id,
            current_progress: progress,
            optimistic,
            realistic,
            conservative,
            milestones,
            blockers,
            iterations: weeks.len(),
        }
    }

    fn trajectory_blockers(
        &self,
        goal: &Goal,
        history: &HistoricalData,
        realistic_completion: DateTime<Utc>,
    ) -> Vec<String> {
        let mut blockers = Vec::new();

        let budget = history
            .available_hours_per_week
            .or(goal.time_allocation_target);
        if let Some(hours) = budget.filter(|hours| *hours < LOW_TIME_BUDGET_HOURS) {
            blockers.push(format!(
                "Weekly time budget of {hours:.1} hours is below {LOW_TIME_BUDGET_HOURS:.0} hours"
            ));
        }

        let text = goal.classification_text();
        let mut skill_gap = false;
        for skill in &self.config.skills {
            if !contains_any(&text, &skill.keywords) {
                continue;
            }
            if let Some(level) = history.skill_levels.get(&skill.name) {
                if skill.required_level - level > self.config.skill_gap_threshold {
                    blockers.push(format!(
                        "Skill level in {} is below what the goal needs",
                        skill.name
                    ));
                    skill_gap = true;
                }
            }
        }
        if !skill_gap && history.skill_levels.is_empty() && goal.complexity == Complexity::Expert {
            blockers.push("Goal complexity may outpace current skill level".to_string());
        }

        if let Some(deadline) = goal.effective_deadline() {
            if realistic_completion > deadline {
                blockers.push(
                    "Current velocity is insufficient to meet the deadline".to_string(),
                );
            }
        }

        blockers
    }
}

fn composite_score(
    context: &PredictionContext,
    velocity: &VelocityAnalysis,
    bottlenecks: &[Bottleneck],
    scenarios: &[RiskScenario],
) -> ScoreBreakdown {
    let trend_penalty = if velocity.trend < 0.0 { 0.1 } else { 0.0 };
    let velocity_term = 0.4 * (velocity.shortfall() + trend_penalty).clamp(0.0, 1.0);

    let bottleneck_term = (0.1 * bottlenecks.len() as f64).min(0.3);

    let high_impact: Vec<f64> = scenarios
        .iter()
        .filter(|scenario| scenario.impact.is_high())
        .map(|scenario| scenario.probability)
        .collect();
    let scenario_term = 0.2 * mean(&high_impact);

    let pattern_term =
        (0.025 * context.risk_triggers as f64 + 0.1 * context.missed_deadline_ratio).min(0.1);

    ScoreBreakdown {
        velocity: velocity_term,
        bottlenecks: bottleneck_term,
        scenarios: scenario_term,
        patterns: pattern_term,
    }
}

fn risk_factors(
    context: &PredictionContext,
    velocity: &VelocityAnalysis,
    bottlenecks: &[Bottleneck],
    scenarios: &[RiskScenario],
) -> Vec<RiskFactor> {
    let mut factors = Vec::new();
    if velocity.shortfall() > 0.0 {
        factors.push(RiskFactor {
            kind: RiskFactorKind::Velocity,
            description: format!(
                "Current pace {:.1}% per week is below the required {:.1}%",
                velocity.current * 100.0,
                velocity.required * 100.0
            ),
            severity: velocity.shortfall(),
        });
    }
    if velocity.trend < 0.0 {
        factors.push(RiskFactor {
            kind: RiskFactorKind::Velocity,
            description: "Weekly progress is trending down".to_string(),
            severity: (velocity.trend.abs() * 10.0).min(1.0),
        });
    }
    factors.extend(bottlenecks.iter().map(|bottleneck| RiskFactor {
        kind: bottleneck.kind.into(),
        description: bottleneck.description.clone(),
        severity: bottleneck.severity,
    }));
    factors.extend(
        scenarios
            .iter()
            .filter(|scenario| scenario.probability >= 0.5)
            .map(|scenario| RiskFactor {
                kind: RiskFactorKind::Scenario,
                description: scenario.name.clone(),
                severity: scenario.probability,
            }),
    );
    if context.risk_triggers > 0 || context.missed_deadline_ratio > 0.0 {
        factors.push(RiskFactor {
            kind: RiskFactorKind::Pattern,
            description: format!(
                "{} external-risk keyword(s); {:.0}% of past deadlines missed",
                context.risk_triggers,
                context.missed_deadline_ratio * 100.0
            ),
            severity: (0.25 * context.risk_triggers as f64 + context.missed_deadline_ratio)
                .min(1.0),
        });
    }
    factors
}

fn recommendations(
    velocity: &VelocityAnalysis,
    bottlenecks: &[Bottleneck],
    scenarios: &[RiskScenario],
    limit: usize,
) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    let of_kind = |kind: BottleneckKind| bottlenecks.iter().filter(move |b| b.kind == kind);

    if velocity.shortfall() > 0.0 {
        items.push(format!(
            "Raise weekly progress from {:.1}% to {:.1}% to stay on schedule",
            velocity.current * 100.0,
            velocity.required * 100.0
        ));
    }
    if velocity.trend < 0.0 {
        items.push(
            "Progress is slowing; review what changed in recent weeks and remove blockers"
                .to_string(),
        );
    }
    for bottleneck in of_kind(BottleneckKind::Time) {
        items.extend(bottleneck.mitigations.first().cloned());
    }
    for bottleneck in of_kind(BottleneckKind::Skill) {
        if let Some(hours) = bottleneck.learning_hours {
            items.push(format!(
                "Budget about {hours:.0} hours of learning: {}",
                bottleneck.description
            ));
        }
    }
    for bottleneck in of_kind(BottleneckKind::Dependency) {
        items.extend(bottleneck.mitigations.first().cloned());
    }
    for bottleneck in of_kind(BottleneckKind::Energy) {
        items.extend(bottleneck.mitigations.first().cloned());
    }
    for scenario in scenarios
        .iter()
        .filter(|scenario| scenario.impact.is_high() && scenario.probability >= 0.5)
    {
        items.extend(scenario.prevention.first().cloned());
    }
    if velocity.consistency < 0.5 {
        items.push("Set a fixed weekly routine so progress becomes more consistent".to_string());
    }
    if velocity.cold_start {
        items.push("Log weekly progress so future assessments use real data".to_string());
    }
    if items.is_empty() {
        items.push("Current pace looks sustainable; keep the existing routine".to_string());
    }

    let mut seen = std::collections::HashSet::new();
    items.retain(|item| seen.insert(item.clone()));
    items.truncate(limit);
    items
}
