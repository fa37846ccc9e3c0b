//! Time-block proposals and weekly schedule recommendation.
//!
//! # Invariants
//! - Proposed blocks always have a positive duration and status `proposed`.
//! - At most `max_blocks_per_day` blocks per day; tasks shorter than
//!   `min_block_minutes` never get a block.
//! - Recommended weekly hours never exceed `weekly_hours_cap`.

use crate::config::PlannerConfig;
use crate::model::goal::Goal;
use crate::model::task::{Task, TimeBlock, TimeBlockStatus, TimeBlockType};
use crate::planner::{DecompositionError, DecompositionResult};
use crate::rules::RuleSet;
use chrono::{DateTime, Duration, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Daily window suggested for working on a goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyScheduleRecommendation {
    pub goal_id: Uuid,
    pub hours_per_week: f64,
    pub preferred_days: Vec<Weekday>,
    pub time_slots: Vec<TimeSlot>,
    pub reasoning: String,
}

/// Goal domain used to choose days and slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDomain {
    Fitness,
    Learning,
    Creative,
    General,
}

impl ScheduleDomain {
    fn preferred_days(self) -> Vec<Weekday> {
        match self {
            Self::Fitness => vec![Weekday::Mon, Weekday::Wed, Weekday::Fri],
            Self::Learning => vec![Weekday::Tue, Weekday::Thu, Weekday::Sat],
            Self::Creative => vec![Weekday::Sat, Weekday::Sun],
            Self::General => vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        }
    }

    fn time_slots(self) -> Vec<TimeSlot> {
        let slots: &[(u32, u32)] = match self {
            Self::Fitness => &[(7, 8), (18, 19)],
            Self::Learning => &[(19, 21)],
            Self::Creative => &[(10, 12)],
            Self::General => &[(9, 11), (14, 16)],
        };
        slots
            .iter()
            .filter_map(|(start, end)| {
                Some(TimeSlot {
                    start: NaiveTime::from_hms_opt(*start, 0, 0)?,
                    end: NaiveTime::from_hms_opt(*end, 0, 0)?,
                })
            })
            .collect()
    }
}

pub fn domain_rules(config: &PlannerConfig) -> RuleSet<ScheduleDomain> {
    RuleSet::new(ScheduleDomain::General)
        .with_rule(config.fitness_keywords.iter().cloned(), ScheduleDomain::Fitness)
        .with_rule(config.learning_keywords.iter().cloned(), ScheduleDomain::Learning)
        .with_rule(config.creative_keywords.iter().cloned(), ScheduleDomain::Creative)
}

/// Proposes blocks for the next `horizon_days`, starting today.
///
/// Tasks are taken in priority order (ties keep input order), up to
/// `max_blocks_per_day` per day. Urgent tasks start at `urgent_start_hour`,
/// others at `normal_start_hour`; blocks sharing a slot are stacked. Today's
/// slots never start before `now`.
pub fn propose_time_blocks(
    tasks: &[Task],
    now: DateTime<Utc>,
    config: &PlannerConfig,
) -> DecompositionResult<Vec<TimeBlock>> {
    let mut queue: Vec<&Task> = tasks
        .iter()
        .filter(|task| task.status.is_open())
        .filter(|task| task.estimated_minutes >= config.min_block_minutes)
        .collect();
    queue.sort_by(|left, right| right.priority.cmp(&left.priority));

    let urgent_start = slot_time(config.urgent_start_hour)?;
    let normal_start = slot_time(config.normal_start_hour)?;
    let today = now.date_naive();

    let mut blocks = Vec::new();
    let mut pending = queue.into_iter();
    for day_offset in 0..config.horizon_days.max(0) {
        let day = Duration::try_days(day_offset)
            .and_then(|offset| today.checked_add_signed(offset))
            .ok_or_else(|| scheduling("horizon day overflowed"))?;
        let mut urgent_cursor = day.and_time(urgent_start).and_utc().max(now);
        let mut normal_cursor = day.and_time(normal_start).and_utc().max(now);

        for task in pending.by_ref().take(config.max_blocks_per_day) {
            let cursor = if task.priority.is_urgent() {
                &mut urgent_cursor
            } else {
                &mut normal_cursor
            };
            let start = *cursor;
            let end = start
                .checked_add_signed(Duration::minutes(i64::from(task.estimated_minutes)))
                .ok_or_else(|| scheduling("block end overflowed"))?;
            if end <= start {
                return Err(scheduling("block duration must be positive"));
            }
            *cursor = end;

            let block_type = if task.priority.is_urgent()
                && task.estimated_minutes >= config.deep_work_min_minutes
            {
                TimeBlockType::DeepWork
            } else {
                TimeBlockType::Focus
            };
            blocks.push(TimeBlock {
                id: Uuid::new_v4(),
                title: task.title.clone(),
                start_time: start,
                end_time: end,
                block_type,
                status: TimeBlockStatus::Proposed,
                task_id: Some(task.id),
            });
        }
    }

    Ok(blocks)
}

/// Derives weekly hours, days and slots for a goal from its generated tasks.
pub fn recommend_weekly_schedule(
    goal: &Goal,
    tasks: &[Task],
    domains: &RuleSet<ScheduleDomain>,
    now: DateTime<Utc>,
    deadline: DateTime<Utc>,
    config: &PlannerConfig,
) -> WeeklyScheduleRecommendation {
    let total_hours: f64 = tasks.iter().map(Task::estimated_hours).sum();
    let hours_per_week = (total_hours / config.weekly_hours_divisor).min(config.weekly_hours_cap);
    let domain = domains.classify(&goal.classification_text());
    let preferred_days = domain.preferred_days();

    let weeks_remaining = ((deadline - now).num_days() as f64 / 7.0).max(0.0);
    let pressure = if weeks_remaining < 4.0 {
        "high"
    } else if weeks_remaining < 12.0 {
        "moderate"
    } else {
        "low"
    };
    let day_names: Vec<String> = preferred_days.iter().map(|day| day.to_string()).collect();
    let reasoning = format!(
        "Allocating {hours_per_week:.1} hours per week across {}. Priority: {}. \
         Task intensity: {} tasks totaling {total_hours:.1} hours. \
         Deadline pressure: {pressure} ({weeks_remaining:.1} weeks remaining).",
        day_names.join(", "),
        goal.priority.as_str(),
        tasks.len(),
    );

    WeeklyScheduleRecommendation {
        goal_id: goal.id,
        hours_per_week,
        preferred_days,
        time_slots: domain.time_slots(),
        reasoning,
    }
}

fn slot_time(hour: u32) -> DecompositionResult<NaiveTime> {
    NaiveTime::from_hms_opt(hour, 0, 0).ok_or_else(|| scheduling("slot hour out of range"))
}

fn scheduling(message: &str) -> DecompositionError {
    DecompositionError::Scheduling(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::{domain_rules, propose_time_blocks, recommend_weekly_schedule, ScheduleDomain};
    use crate::config::PlannerConfig;
    use crate::model::goal::{Goal, Priority};
    use crate::model::task::{Task, TimeBlockType};
    use chrono::{Duration, TimeZone, Timelike, Utc, Weekday};

    #[test]
    fn places_urgent_tasks_in_the_morning_and_skips_short_ones() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 30, 0).unwrap();
        let tasks = vec![
            Task::new("quick call", 15, Priority::Critical),
            Task::new("write outline", 60, Priority::Medium),
            Task::new("deep draft", 120, Priority::High),
        ];
        let blocks = propose_time_blocks(&tasks, now, &PlannerConfig::default()).unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].title, "deep draft");
        assert_eq!(blocks[0].start_time.hour(), 9);
        assert_eq!(blocks[0].block_type, TimeBlockType::DeepWork);
        assert_eq!(blocks[1].start_time.hour(), 14);
        assert_eq!(blocks[1].duration_minutes(), 60);
    }

    #[test]
    fn todays_passed_slots_start_at_now() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 20, 0, 0).unwrap();
        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let priority = if i % 2 == 0 { Priority::High } else { Priority::Medium };
                Task::new(format!("task {i}"), 60, priority)
            })
            .collect();
        let blocks = propose_time_blocks(&tasks, now, &PlannerConfig::default()).unwrap();

        assert_eq!(blocks.len(), 10);
        assert!(blocks.iter().all(|block| block.start_time >= now));
        assert_eq!(blocks[0].start_time, now);
        assert_eq!(blocks[1].start_time, now + Duration::hours(1));
        assert_eq!(blocks[3].start_time.hour(), 9);
    }

    #[test]
    fn caps_blocks_per_day_and_stacks_shared_slots() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 30, 0).unwrap();
        let tasks: Vec<_> = (0..4)
            .map(|i| Task::new(format!("task {i}"), 60, Priority::High))
            .collect();
        let blocks = propose_time_blocks(&tasks, now, &PlannerConfig::default()).unwrap();

        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[1].start_time, blocks[0].end_time);
        assert_eq!(blocks[2].start_time, blocks[1].end_time);
        assert_eq!(
            blocks[3].start_time.date_naive(),
            (now + Duration::days(1)).date_naive()
        );
    }

    #[test]
    fn weekly_hours_are_capped_and_domain_days_applied() {
        let config = PlannerConfig::default();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 30, 0).unwrap();
        let goal = Goal::new("Run a marathon");
        let tasks: Vec<_> = (0..30)
            .map(|i| Task::new(format!("run {i}"), 120, Priority::High))
            .collect();

        let schedule = recommend_weekly_schedule(
            &goal,
            &tasks,
            &domain_rules(&config),
            now,
            now + Duration::days(120),
            &config,
        );
        assert_eq!(schedule.hours_per_week, 10.0);
        assert_eq!(
            schedule.preferred_days,
            vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]
        );
        assert!(schedule.reasoning.contains("Deadline pressure: low"));
    }

    #[test]
    fn domain_rules_default_to_business_days() {
        let rules = domain_rules(&PlannerConfig::default());
        assert_eq!(rules.classify("Learn Spanish"), ScheduleDomain::Learning);
        assert_eq!(rules.classify("Paint a mural"), ScheduleDomain::Creative);
        assert_eq!(rules.classify("File taxes"), ScheduleDomain::General);
    }
}
