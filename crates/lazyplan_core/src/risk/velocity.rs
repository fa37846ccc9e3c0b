//! Velocity analysis.
//!
//! Velocity is the progress fraction gained per week.

use crate::config::RiskConfig;
use crate::risk::context::PredictionContext;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityAnalysis {
    /// Mean of the last two weekly deltas, seasonally adjusted.
    pub current: f64,
    /// Weekly velocity needed to finish by the deadline.
    pub required: f64,
    /// Slope of a linear fit over the last four weeks.
    pub trend: f64,
    pub consistency: f64,
    pub sustainability: f64,
    pub confidence: f64,
    pub cold_start: bool,
}

impl VelocityAnalysis {
    /// Share of the required velocity not covered by the current one.
    pub fn shortfall(&self) -> f64 {
        if self.required <= 0.0 {
            return 0.0;
        }
        (1.0 - self.current / self.required).clamp(0.0, 1.0)
    }
}

pub fn analyze(context: &PredictionContext, config: &RiskConfig) -> VelocityAnalysis {
    let history = &context.velocity_history;
    let current = mean(tail(history, 2)) * context.seasonal_factor;
    let required = (1.0 - context.progress) / context.weeks_remaining.max(1.0);
    let trend = regression_slope(tail(history, 4));

    let history_mean = mean(history);
    let consistency = if history_mean > 0.0 {
        (1.0 - std_dev(history) / history_mean).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let sustainability = (1.0 - required / config.max_sustainable_velocity).clamp(0.0, 1.0);
    let pace = if required > 0.0 {
        (current / required).min(1.0)
    } else {
        1.0
    };
    let confidence = (consistency * sustainability * pace).clamp(0.0, config.confidence_cap);

    VelocityAnalysis {
        current,
        required,
        trend,
        consistency,
        sustainability,
        confidence,
        cold_start: context.cold_start,
    }
}

fn tail(values: &[f64], count: usize) -> &[f64] {
    &values[values.len().saturating_sub(count)..]
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let center = mean(values);
    let variance =
        values.iter().map(|value| (value - center).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Least-squares slope with x = 0, 1, 2, ...
pub fn regression_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);
    let (numerator, denominator) =
        values
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(num, den), (index, value)| {
                let dx = index as f64 - x_mean;
                (num + dx * (value - y_mean), den + dx * dx)
            });
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
