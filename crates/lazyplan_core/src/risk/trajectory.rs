//! Monte Carlo trajectory simulation.
//!
//! # Invariants
//! - Simulated durations are sorted before percentiles are read, so
//!   `optimistic <= realistic <= conservative` always holds.
//! - Durations are capped at `max_weeks`; zero or negative velocity yields
//!   the cap instead of an infinite date.

use crate::config::MonteCarloConfig;
use crate::model::EntityId;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const SECONDS_PER_WEEK: f64 = 7.0 * 24.0 * 3600.0;
const MILESTONE_TARGETS: [f64; 4] = [0.25, 0.5, 0.75, 0.9];

/// Source of uniform samples in `[0, 1)` for the simulation.
pub trait NoiseSource {
    fn next_unit(&mut self) -> f64;
}

/// `rand`-backed noise.
pub struct RngNoise<R: Rng> {
    rng: R,
}

impl<R: Rng> RngNoise<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngNoise<StdRng> {
    /// Seeded when `seed` is set, entropy-seeded otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::new(StdRng::seed_from_u64(seed)),
            None => Self::new(StdRng::from_entropy()),
        }
    }
}

impl<R: Rng> NoiseSource for RngNoise<R> {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Returns the same sample forever.
#[derive(Debug, Clone, Copy)]
pub struct FixedNoise(pub f64);

impl NoiseSource for FixedNoise {
    fn next_unit(&mut self) -> f64 {
        self.0.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionEstimate {
    pub completion: DateTime<Utc>,
    pub weeks: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestonePrediction {
    /// Progress fraction, e.g. `0.25`.
    pub target: f64,
    pub predicted_date: DateTime<Utc>,
    pub achieved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPrediction {
    pub goal_id: EntityId,
    pub current_progress: f64,
    pub optimistic: CompletionEstimate,
    pub realistic: CompletionEstimate,
    pub conservative: CompletionEstimate,
    pub milestones: Vec<MilestonePrediction>,
    pub blockers: Vec<String>,
    pub iterations: usize,
}

/// Sorted simulated weeks-to-complete, one per iteration.
pub fn simulate_weeks(
    base_velocity: f64,
    remaining: f64,
    config: &MonteCarloConfig,
    noise: &mut dyn NoiseSource,
) -> Vec<f64> {
    let mut weeks: Vec<f64> = (0..config.iterations.max(1))
        .map(|_| {
            if remaining <= 0.0 {
                return 0.0;
            }
            let perturbation = 1.0 + (noise.next_unit() * 2.0 - 1.0) * config.velocity_noise;
            let fatigue = config.fatigue_min
                + noise.next_unit() * (config.fatigue_max - config.fatigue_min);
            let effective = base_velocity * perturbation * fatigue;
            if effective > 0.0 {
                (remaining / effective).min(config.max_weeks)
            } else {
                config.max_weeks
            }
        })
        .collect();
    weeks.sort_by(f64::total_cmp);
    weeks
}

/// Value at `fraction` of a sorted slice (nearest rank).
pub fn percentile(sorted: &[f64], fraction: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((sorted.len() - 1) as f64 * fraction.clamp(0.0, 1.0)).round() as usize;
    sorted[index.min(sorted.len() - 1)]
}

pub fn estimate(now: DateTime<Utc>, weeks: f64, probability: f64) -> CompletionEstimate {
    CompletionEstimate {
        completion: after_weeks(now, weeks),
        weeks,
        probability,
    }
}

/// Interpolates 25/50/75/90% dates along the realistic timeline.
pub fn milestone_predictions(
    now: DateTime<Utc>,
    progress: f64,
    realistic_weeks: f64,
) -> Vec<MilestonePrediction> {
    let remaining = 1.0 - progress;
    MILESTONE_TARGETS
        .iter()
        .map(|&target| {
            if progress >= target || remaining <= 0.0 {
                return MilestonePrediction {
                    target,
                    predicted_date: now,
                    achieved: true,
                };
            }
            let weeks = realistic_weeks * (target - progress) / remaining;
            MilestonePrediction {
                target,
                predicted_date: after_weeks(now, weeks),
                achieved: false,
            }
        })
        .collect()
}

fn after_weeks(now: DateTime<Utc>, weeks: f64) -> DateTime<Utc> {
    let seconds = (weeks.max(0.0) * SECONDS_PER_WEEK).round() as i64;
    now.checked_add_signed(Duration::seconds(seconds))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::{milestone_predictions, percentile, simulate_weeks, FixedNoise, RngNoise};
    use crate::config::MonteCarloConfig;
    use chrono::Utc;

    #[test]
    fn fixed_noise_gives_identical_trials() {
        let config = MonteCarloConfig::default();
        // Midpoint noise: no perturbation, fatigue 0.95.
        let weeks = simulate_weeks(0.05, 0.5, &config, &mut FixedNoise(0.5));
        assert_eq!(weeks.len(), 1000);
        let expected = 0.5 / (0.05 * 0.95);
        assert!(weeks.iter().all(|w| (w - expected).abs() < 1e-9));
    }

    #[test]
    fn seeded_runs_are_reproducible_and_sorted() {
        let config = MonteCarloConfig::default();
        let first = simulate_weeks(0.05, 0.6, &config, &mut RngNoise::from_seed_option(Some(9)));
        let second = simulate_weeks(0.05, 0.6, &config, &mut RngNoise::from_seed_option(Some(9)));
        assert_eq!(first, second);
        assert!(first.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(percentile(&first, 0.1) <= percentile(&first, 0.5));
        assert!(percentile(&first, 0.5) <= percentile(&first, 0.9));
    }

    #[test]
    fn zero_velocity_hits_the_cap() {
        let config = MonteCarloConfig::default();
        let weeks = simulate_weeks(0.0, 0.5, &config, &mut FixedNoise(0.3));
        assert!(weeks.iter().all(|w| *w == config.max_weeks));
    }

    #[test]
    fn milestones_before_current_progress_are_achieved() {
        let now = Utc::now();
        let predictions = milestone_predictions(now, 0.5, 10.0);
        assert!(predictions[0].achieved);
        assert!(predictions[1].achieved);
        assert!(!predictions[2].achieved);
        assert!(predictions[2].predicted_date < predictions[3].predicted_date);
    }
}
