//! Milestone strategies.
//!
//! # Responsibility
//! - Select a decomposition strategy for a goal.
//! - Emit the ordered milestone drafts for that strategy.
//! - Apply the spacing and deadline re-basing passes shared by all strategies.
//!
//! # Invariants
//! - Three or more key results always select `KeyResults`, before any
//!   keyword rule is consulted.
//! - Draft deadlines are strictly increasing after `enforce_spacing` and
//!   after `rebase_to_deadline`.
//! - Re-based drafts stay inside `[now + min spacing, goal deadline]`.

use crate::config::PlannerConfig;
use crate::model::goal::{Goal, KeyResult};
use crate::planner::{DecompositionError, DecompositionResult};
use crate::rules::RuleSet;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How milestones are derived for a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecompositionStrategy {
    /// One milestone per key result.
    KeyResults,
    /// Learning stages at fixed intervals.
    SkillBased,
    /// Quarterly habit checkpoints.
    HabitBased,
    /// Project sub-phases.
    ProjectBased,
    /// Evenly split phases, one per ~30 days.
    TimeBased,
}

/// Milestone before ids, dependencies and tasks are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneDraft {
    pub title: String,
    pub description: String,
    /// Short label used to pick the task template set.
    pub phase: String,
    pub deadline: DateTime<Utc>,
}

/// Ordered strategy rules plus the key-result threshold.
#[derive(Debug, Clone)]
pub struct StrategySelector {
    rules: RuleSet<DecompositionStrategy>,
    min_key_results: usize,
}

impl StrategySelector {
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            rules: RuleSet::new(DecompositionStrategy::TimeBased)
                .with_rule(
                    config.learning_keywords.iter().cloned(),
                    DecompositionStrategy::SkillBased,
                )
                .with_rule(
                    config.habit_keywords.iter().cloned(),
                    DecompositionStrategy::HabitBased,
                )
                .with_rule(
                    config.project_keywords.iter().cloned(),
                    DecompositionStrategy::ProjectBased,
                ),
            min_key_results: 3,
        }
    }

    pub fn select(&self, goal: &Goal, key_results: &[KeyResult]) -> DecompositionStrategy {
        if key_results.len() >= self.min_key_results {
            return DecompositionStrategy::KeyResults;
        }
        self.rules.classify(&goal.classification_text())
    }
}

/// Produces drafts for `strategy` between `now` and `horizon_end`.
pub fn generate_drafts(
    strategy: DecompositionStrategy,
    goal: &Goal,
    key_results: &[KeyResult],
    now: DateTime<Utc>,
    horizon_end: DateTime<Utc>,
    config: &PlannerConfig,
) -> DecompositionResult<Vec<MilestoneDraft>> {
    let span = horizon_end - now;
    if span <= Duration::zero() {
        return Err(DecompositionError::MilestoneGeneration(
            "planning horizon is empty".to_string(),
        ));
    }
    let subject = goal.title.trim();

    let drafts = match strategy {
        DecompositionStrategy::KeyResults => {
            let count = key_results.len();
            key_results
                .iter()
                .enumerate()
                .map(|(index, key_result)| {
                    Ok(MilestoneDraft {
                        title: format!("Achieve: {}", key_result.title.trim()),
                        description: format!(
                            "Move key result from {} to {} ({:.0}% complete today)",
                            key_result.current_value, key_result.target_value, key_result.progress
                        ),
                        phase: key_result.title.clone(),
                        deadline: fraction_of(now, span, index + 1, count)?,
                    })
                })
                .collect::<DecompositionResult<Vec<_>>>()?
        }
        DecompositionStrategy::SkillBased => {
            let stages = [
                ("fundamentals", "Learn the fundamentals of", "Cover core concepts and vocabulary"),
                ("core practice", "Practice core skills in", "Build fluency by practicing often"),
                ("applied practice", "Apply", "Use the skill in realistic situations"),
                ("proficiency", "Reach working proficiency in", "Demonstrate independent use"),
            ];
            stages
                .iter()
                .enumerate()
                .map(|(index, (phase, lead, description))| {
                    let offset = days(config.skill_stage_interval_days * (index as i64 + 1))?;
                    Ok(MilestoneDraft {
                        title: format!("{lead} {}", skill_subject(subject)),
                        description: description.to_string(),
                        phase: phase.to_string(),
                        deadline: add(now, offset)?,
                    })
                })
                .collect::<DecompositionResult<Vec<_>>>()?
        }
        DecompositionStrategy::HabitBased => {
            let quarters = [
                ("establish", "Establish the routine", "Hit the habit on most planned days"),
                ("consistency", "Build consistency", "Keep a steady streak through setbacks"),
                ("deepen", "Deepen the habit", "Raise intensity or duration"),
                ("sustain", "Sustain long-term", "Make the habit automatic"),
            ];
            quarters
                .iter()
                .enumerate()
                .map(|(index, (phase, lead, description))| {
                    Ok(MilestoneDraft {
                        title: format!("Q{}: {lead} for {subject}", index + 1),
                        description: description.to_string(),
                        phase: phase.to_string(),
                        deadline: fraction_of(now, span, index + 1, quarters.len())?,
                    })
                })
                .collect::<DecompositionResult<Vec<_>>>()?
        }
        DecompositionStrategy::ProjectBased => {
            let phases = [
                ("planning", "Planning & research", 0.15),
                ("foundation", "Foundation setup", 0.35),
                ("development", "Core development", 0.70),
                ("testing", "Testing & refinement", 0.90),
                ("launch", "Launch & completion", 1.00),
            ];
            phases
                .iter()
                .map(|(phase, label, share)| {
                    let offset = Duration::seconds((span.num_seconds() as f64 * share) as i64);
                    Ok(MilestoneDraft {
                        title: format!("{label}: {subject}"),
                        description: format!("Complete the {phase} phase"),
                        phase: phase.to_string(),
                        deadline: add(now, offset)?,
                    })
                })
                .collect::<DecompositionResult<Vec<_>>>()?
        }
        DecompositionStrategy::TimeBased => {
            let timeframe_days = span.num_days().max(1);
            let count = usize::try_from(timeframe_days / config.phase_length_days.max(1))
                .unwrap_or(config.max_phases)
                .max(config.min_phases)
                .min(config.max_phases)
                .max(1);
            (0..count)
                .map(|index| {
                    let phase = if index == 0 {
                        "planning"
                    } else if index + 1 == count {
                        "completion"
                    } else {
                        "development"
                    };
                    Ok(MilestoneDraft {
                        title: format!("Phase {} of {count}: {subject}", index + 1),
                        description: format!("Complete the {phase} work for this phase"),
                        phase: phase.to_string(),
                        deadline: fraction_of(now, span, index + 1, count)?,
                    })
                })
                .collect::<DecompositionResult<Vec<_>>>()?
        }
    };

    if drafts.is_empty() {
        return Err(DecompositionError::MilestoneGeneration(
            "strategy produced no milestones".to_string(),
        ));
    }
    Ok(drafts)
}

/// Raises each deadline to at least `min_spacing_days` after its predecessor,
/// with "now" as the predecessor of the first draft.
pub fn enforce_spacing(
    drafts: &mut [MilestoneDraft],
    now: DateTime<Utc>,
    min_spacing_days: i64,
) -> DecompositionResult<()> {
    let spacing = days(min_spacing_days)?;
    let mut previous = now;
    for draft in drafts.iter_mut() {
        let earliest = add(previous, spacing)?;
        if draft.deadline < earliest {
            draft.deadline = earliest;
        }
        previous = draft.deadline;
    }
    Ok(())
}

/// Pulls drafts back inside `deadline` when any of them overshoots it.
///
/// Drafts already inside the deadline keep their dates. The overshooting
/// tail is spread evenly after its predecessor, ending on the deadline. When
/// that gap is too narrow, every draft is spread over
/// `[now + min_spacing_days, deadline]` instead.
///
/// # Errors
/// - `MilestoneGeneration` when that window cannot hold every draft at a
///   distinct instant.
pub fn rebase_to_deadline(
    drafts: &mut [MilestoneDraft],
    now: DateTime<Utc>,
    deadline: DateTime<Utc>,
    min_spacing_days: i64,
) -> DecompositionResult<bool> {
    let Some(first_over) = drafts.iter().position(|draft| draft.deadline > deadline) else {
        return Ok(false);
    };
    let window_start = add(now, days(min_spacing_days)?)?;
    let count = drafts.len();
    if window_start > deadline || seconds_between(window_start, deadline) < count as i64 - 1 {
        return Err(DecompositionError::MilestoneGeneration(format!(
            "{count} milestones do not fit between {} and the goal deadline",
            window_start.to_rfc3339()
        )));
    }

    if first_over > 0 {
        let floor = drafts[first_over - 1].deadline;
        if seconds_between(floor, deadline) >= (count - first_over) as i64 {
            spread(&mut drafts[first_over..], floor, deadline, false)?;
            return Ok(true);
        }
    }
    spread(drafts, window_start, deadline, true)?;
    Ok(true)
}

/// Places drafts evenly on `(start, end]`, or on `[start, end]` when
/// `include_start` is set. The last draft always lands on `end`.
fn spread(
    drafts: &mut [MilestoneDraft],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    include_start: bool,
) -> DecompositionResult<()> {
    let span = i128::from(seconds_between(start, end));
    let count = drafts.len() as i128;
    for (index, draft) in drafts.iter_mut().enumerate() {
        let index = index as i128;
        let offset = match (include_start, count) {
            (true, 1) => span,
            (true, _) => span * index / (count - 1),
            (false, _) => span * (index + 1) / count,
        };
        let offset = i64::try_from(offset).map_err(|_| {
            DecompositionError::MilestoneGeneration("milestone offset overflowed".to_string())
        })?;
        draft.deadline = add(start, Duration::seconds(offset))?;
    }
    Ok(())
}

fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds()
}

fn skill_subject(title: &str) -> String {
    let lowered = title.to_lowercase();
    for prefix in ["learn to ", "learn ", "study ", "master ", "practice "] {
        if !lowered.starts_with(prefix) {
            continue;
        }
        if let Some(rest) = title.get(prefix.len()..).map(str::trim) {
            if !rest.is_empty() {
                return rest.to_string();
            }
        }
    }
    title.to_string()
}

fn fraction_of(
    now: DateTime<Utc>,
    span: Duration,
    numerator: usize,
    denominator: usize,
) -> DecompositionResult<DateTime<Utc>> {
    let seconds = span.num_seconds() as i128 * numerator as i128 / denominator.max(1) as i128;
    let seconds = i64::try_from(seconds).map_err(|_| {
        DecompositionError::MilestoneGeneration("milestone offset overflowed".to_string())
    })?;
    add(now, Duration::seconds(seconds))
}

fn days(value: i64) -> DecompositionResult<Duration> {
    Duration::try_days(value).ok_or_else(|| {
        DecompositionError::MilestoneGeneration(format!("{value} days is out of range"))
    })
}

fn add(base: DateTime<Utc>, offset: Duration) -> DecompositionResult<DateTime<Utc>> {
    base.checked_add_signed(offset).ok_or_else(|| {
        DecompositionError::MilestoneGeneration("milestone deadline overflowed".to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::{
        enforce_spacing, generate_drafts, rebase_to_deadline, skill_subject,
        DecompositionStrategy, MilestoneDraft, StrategySelector,
    };
    use crate::config::PlannerConfig;
    use crate::model::goal::{Goal, KeyResult};
    use crate::planner::DecompositionError;
    use chrono::{Duration, TimeZone, Utc};

    fn selector() -> StrategySelector {
        StrategySelector::from_config(&PlannerConfig::default())
    }

    fn draft_at(days: i64) -> MilestoneDraft {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        MilestoneDraft {
            title: format!("m{days}"),
            description: String::new(),
            phase: "generic".to_string(),
            deadline: now + Duration::days(days),
        }
    }

    #[test]
    fn key_results_take_precedence_over_keywords() {
        let goal = Goal::new("Learn Spanish");
        let krs: Vec<_> = (0..3)
            .map(|i| KeyResult::new(goal.id, format!("kr {i}")))
            .collect();
        assert_eq!(selector().select(&goal, &krs), DecompositionStrategy::KeyResults);
        assert_eq!(selector().select(&goal, &krs[..2]), DecompositionStrategy::SkillBased);
    }

    #[test]
    fn keyword_rules_follow_declared_order() {
        assert_eq!(
            selector().select(&Goal::new("Daily meditation habit"), &[]),
            DecompositionStrategy::HabitBased
        );
        assert_eq!(
            selector().select(&Goal::new("Launch my bakery website"), &[]),
            DecompositionStrategy::ProjectBased
        );
        assert_eq!(
            selector().select(&Goal::new("Save for a house"), &[]),
            DecompositionStrategy::TimeBased
        );
    }

    #[test]
    fn time_based_phase_count_is_clamped() {
        let config = PlannerConfig::default();
        let goal = Goal::new("Save for a house");
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();

        let short = generate_drafts(
            DecompositionStrategy::TimeBased,
            &goal,
            &[],
            now,
            now + Duration::days(45),
            &config,
        )
        .unwrap();
        assert_eq!(short.len(), 3);

        let long = generate_drafts(
            DecompositionStrategy::TimeBased,
            &goal,
            &[],
            now,
            now + Duration::days(400),
            &config,
        )
        .unwrap();
        assert_eq!(long.len(), 8);
        assert_eq!(long.last().unwrap().deadline, now + Duration::days(400));
    }

    #[test]
    fn spacing_pushes_crowded_drafts_apart() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let mut drafts = vec![draft_at(3), draft_at(10), draft_at(40)];
        enforce_spacing(&mut drafts, now, 14).unwrap();
        assert_eq!(drafts[0].deadline, now + Duration::days(14));
        assert_eq!(drafts[1].deadline, now + Duration::days(28));
        assert_eq!(drafts[2].deadline, now + Duration::days(42));
    }

    #[test]
    fn rebase_spreads_overshooting_tail_after_last_fitting_draft() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let deadline = now + Duration::days(30);
        let mut drafts = vec![draft_at(14), draft_at(28), draft_at(42), draft_at(56)];

        assert!(rebase_to_deadline(&mut drafts, now, deadline, 14).unwrap());
        let deadlines: Vec<_> = drafts.iter().map(|d| d.deadline).collect();
        assert_eq!(deadlines[0], now + Duration::days(14));
        assert_eq!(deadlines[1], now + Duration::days(28));
        assert_eq!(deadlines[2], now + Duration::days(29));
        assert_eq!(deadlines[3], deadline);
    }

    #[test]
    fn rebase_respreads_whole_window_when_tail_has_no_room() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let deadline = now + Duration::days(20);
        let mut drafts = vec![draft_at(14), draft_at(20), draft_at(34)];

        assert!(rebase_to_deadline(&mut drafts, now, deadline, 14).unwrap());
        let deadlines: Vec<_> = drafts.iter().map(|d| d.deadline).collect();
        assert_eq!(
            deadlines,
            vec![
                now + Duration::days(14),
                now + Duration::days(17),
                now + Duration::days(20)
            ]
        );
    }

    #[test]
    fn rebase_rejects_deadline_inside_minimum_spacing() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let mut drafts = vec![draft_at(14), draft_at(28)];
        let err = rebase_to_deadline(&mut drafts, now, now + Duration::days(10), 14).unwrap_err();
        assert!(matches!(err, DecompositionError::MilestoneGeneration(_)));
    }

    #[test]
    fn rebase_is_noop_inside_deadline() {
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let mut drafts = vec![draft_at(14), draft_at(28)];
        assert!(!rebase_to_deadline(&mut drafts, now, now + Duration::days(60), 14).unwrap());
        assert_eq!(drafts[1].deadline, now + Duration::days(28));
    }

    #[test]
    fn inverted_phase_bounds_do_not_panic() {
        let config = PlannerConfig {
            min_phases: 6,
            max_phases: 3,
            ..PlannerConfig::default()
        };
        let now = Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap();
        let drafts = generate_drafts(
            DecompositionStrategy::TimeBased,
            &Goal::new("Save for a house"),
            &[],
            now,
            now + Duration::days(120),
            &config,
        )
        .unwrap();
        assert_eq!(drafts.len(), 3);
    }

    #[test]
    fn skill_subject_strips_learning_verb() {
        assert_eq!(skill_subject("Learn Spanish"), "Spanish");
        assert_eq!(skill_subject("Learn to juggle"), "juggle");
        assert_eq!(skill_subject("Guitar"), "Guitar");
    }
}
