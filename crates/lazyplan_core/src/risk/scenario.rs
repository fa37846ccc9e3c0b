//! Named risk scenarios.

use crate::config::RiskConfig;
use crate::risk::context::PredictionContext;
use crate::risk::velocity::VelocityAnalysis;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactTier {
    Low,
    Medium,
    High,
    Critical,
}

impl ImpactTier {
    pub fn is_high(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScenario {
    pub name: String,
    pub probability: f64,
    pub impact: ImpactTier,
    pub time_to_impact_days: u32,
    pub prevention: Vec<String>,
    pub contingency: Vec<String>,
    pub early_warnings: Vec<String>,
}

impl RiskScenario {
    fn new(name: &str, probability: f64, impact: ImpactTier, time_to_impact_days: u32) -> Self {
        Self {
            name: name.to_string(),
            probability: probability.clamp(0.0, 1.0),
            impact,
            time_to_impact_days,
            prevention: Vec::new(),
            contingency: Vec::new(),
            early_warnings: Vec::new(),
        }
    }

    fn plans(mut self, prevention: &[&str], contingency: &[&str], warnings: &[&str]) -> Self {
        self.prevention = to_strings(prevention);
        self.contingency = to_strings(contingency);
        self.early_warnings = to_strings(warnings);
        self
    }
}

pub fn simulate(
    context: &PredictionContext,
    velocity: &VelocityAnalysis,
    config: &RiskConfig,
) -> Vec<RiskScenario> {
    let mut scenarios = Vec::new();

    if velocity.trend < 0.0 {
        scenarios.push(
            RiskScenario::new(
                "Continued velocity decline",
                (0.5 + velocity.trend.abs() * 10.0).min(0.9),
                ImpactTier::High,
                14,
            )
            .plans(
                &["Review what slowed progress in recent weeks and remove the biggest blocker"],
                &["Cut scope to the essential key results", "Negotiate a later deadline"],
                &["Two consecutive weeks below required velocity"],
            ),
        );
    }

    let hours = context.resources.available_hours_per_week;
    if hours < config.resource_shortage_hours {
        let impact = if hours < config.resource_shortage_hours / 2.0 {
            ImpactTier::High
        } else {
            ImpactTier::Medium
        };
        scenarios.push(
            RiskScenario::new(
                "Time resource shortage",
                ((config.resource_shortage_hours - hours) / config.resource_shortage_hours)
                    .clamp(0.1, 0.9),
                impact,
                7,
            )
            .plans(
                &["Reserve fixed weekly time blocks for this goal"],
                &["Drop or delegate lower-priority commitments"],
                &["Planned sessions skipped or shortened"],
            ),
        );
    }

    scenarios.push(
        RiskScenario::new(
            "External dependency delay",
            config.external_dependency_probability,
            ImpactTier::Medium,
            21,
        )
        .plans(
            &["Identify external inputs early and agree on dates"],
            &["Prepare a fallback option for each external input"],
            &["Unanswered requests older than one week"],
        ),
    );

    if (0.3..=0.7).contains(&context.progress) && velocity.consistency < 0.5 {
        scenarios.push(
            RiskScenario::new("Motivation plateau", 0.4, ImpactTier::Medium, 28).plans(
                &["Set a visible short-term target for the next two weeks"],
                &["Pair up with an accountability partner"],
                &["Sessions feel like chores", "Progress logging stops"],
            ),
        );
    }

    scenarios
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::{simulate, ImpactTier};
    use crate::config::RiskConfig;
    use crate::model::goal::Goal;
    use crate::risk::context::{HistoricalData, PredictionContext};
    use crate::risk::velocity::analyze;
    use chrono::Utc;

    fn run(history: HistoricalData) -> Vec<super::RiskScenario> {
        let config = RiskConfig::default();
        let context =
            PredictionContext::build(&Goal::new("Ship v2"), &[], &history, Utc::now(), &config)
                .unwrap();
        let velocity = analyze(&context, &config);
        simulate(&context, &velocity, &config)
    }

    #[test]
    fn declining_velocity_triggers_high_impact_scenario() {
        let scenarios = run(HistoricalData {
            weekly_velocity: vec![0.08, 0.06, 0.04, 0.02],
            available_hours_per_week: Some(30.0),
            ..HistoricalData::default()
        });
        let decline = scenarios
            .iter()
            .find(|s| s.name == "Continued velocity decline")
            .expect("decline scenario");
        assert_eq!(decline.impact, ImpactTier::High);
        assert!((decline.probability - 0.7).abs() < 1e-9);
        assert!(scenarios.iter().all(|s| s.name != "Time resource shortage"));
    }

    #[test]
    fn dependency_delay_is_always_present() {
        let scenarios = run(HistoricalData {
            weekly_velocity: vec![0.05, 0.05],
            available_hours_per_week: Some(5.0),
            ..HistoricalData::default()
        });
        let names: Vec<_> = scenarios.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"External dependency delay"));
        assert!(names.contains(&"Time resource shortage"));
        let shortage = &scenarios[0];
        assert_eq!(shortage.impact, ImpactTier::High);
        assert!((shortage.probability - 0.75).abs() < 1e-9);
    }
}
