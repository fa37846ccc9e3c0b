//! Plain-text activity summaries for a period.

use crate::brain::index::SemanticIndex;
use crate::brain::record::{IndexEntry, RecordType};
use crate::brain::SummaryError;
use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const NO_ACTIVITY: &str = "No activity recorded for this period.";
pub const SUMMARY_UNAVAILABLE: &str = "Summary unavailable for the requested period.";

const MAX_ACHIEVEMENTS: usize = 3;
const TOP_THEMES: usize = 3;
const CHALLENGE_SENTIMENT: f64 = -0.05;

/// Period covered by a summary, ending at `now` unless custom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    Day,
    Week,
    Month,
    Custom {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl Timeframe {
    pub fn range(self, now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), SummaryError> {
        match self {
            Self::Day => Ok((now - Duration::days(1), now)),
            Self::Week => Ok((now - Duration::days(7), now)),
            Self::Month => Ok((now - Duration::days(30), now)),
            Self::Custom { start, end } if start <= end => Ok((start, end)),
            Self::Custom { .. } => Err(SummaryError::InvalidRange),
        }
    }
}

impl SemanticIndex {
    pub fn generate_summary(&self, timeframe: Timeframe) -> String {
        self.generate_summary_at(timeframe, Utc::now())
    }

    /// Never fails; errors become a fixed message.
    pub fn generate_summary_at(&self, timeframe: Timeframe, now: DateTime<Utc>) -> String {
        match self.try_summary_at(timeframe, now) {
            Ok(summary) => summary,
            Err(err) => {
                warn!("event=summary_generated module=brain status=degraded error={err}");
                SUMMARY_UNAVAILABLE.to_string()
            }
        }
    }

    pub fn try_summary_at(
        &self,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Result<String, SummaryError> {
        let (start, end) = timeframe.range(now)?;
        let mut entries: Vec<&IndexEntry> = self
            .entries()
            .filter(|entry| entry.timestamp >= start && entry.timestamp <= end)
            .collect();
        if entries.is_empty() {
            return Ok(NO_ACTIVITY.to_string());
        }
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

        let sections = [
            format!(
                "Activity summary {} to {} ({} records)",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d"),
                entries.len()
            ),
            productivity_section(&entries),
            goals_section(&entries),
            patterns_section(&entries),
            achievements_section(&entries),
            challenges_section(&entries),
            closing_insight(&entries),
        ];
        debug!(
            "event=summary_generated module=brain status=ok records={}",
            entries.len()
        );
        Ok(sections.join("\n\n"))
    }
}

fn of_type<'a>(
    entries: &'a [&'a IndexEntry],
    kinds: &'a [RecordType],
) -> impl Iterator<Item = &'a IndexEntry> + 'a {
    entries
        .iter()
        .copied()
        .filter(move |entry| kinds.contains(&entry.record_type))
}

fn completion_rate(entries: &[&IndexEntry]) -> Option<f64> {
    let tasks: Vec<&IndexEntry> = of_type(entries, &[RecordType::Task]).collect();
    if tasks.is_empty() {
        return None;
    }
    let done = tasks.iter().filter(|task| task.metadata.is_completed()).count();
    Some(done as f64 / tasks.len() as f64)
}

fn productivity_section(entries: &[&IndexEntry]) -> String {
    let tasks = of_type(entries, &[RecordType::Task]).count();
    let sessions = of_type(entries, &[RecordType::Session, RecordType::Timeblock]).count();
    let rate = match completion_rate(entries) {
        Some(rate) => format!("{:.0}% of tracked tasks completed", rate * 100.0),
        None => "no tasks tracked".to_string(),
    };
    format!("Productivity: {tasks} tasks and {sessions} work sessions; {rate}.")
}

fn goals_section(entries: &[&IndexEntry]) -> String {
    let goals: Vec<&IndexEntry> = of_type(entries, &[RecordType::Goal]).collect();
    if goals.is_empty() {
        return "Goals: no goal updates in this period.".to_string();
    }
    let completed = goals.iter().filter(|goal| goal.metadata.is_completed()).count();
    format!("Goals: {} goal updates, {completed} completed.", goals.len())
}

fn patterns_section(entries: &[&IndexEntry]) -> String {
    let mut by_day: BTreeMap<u32, (Weekday, usize)> = BTreeMap::new();
    let mut themes: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in entries {
        let weekday = entry.timestamp.weekday();
        by_day
            .entry(weekday.num_days_from_monday())
            .or_insert((weekday, 0))
            .1 += 1;
        for keyword in &entry.keywords {
            *themes.entry(keyword.as_str()).or_insert(0) += 1;
        }
    }
    // Ties go to the earlier weekday.
    let busiest = by_day
        .iter()
        .max_by(|a, b| a.1 .1.cmp(&b.1 .1).then_with(|| b.0.cmp(a.0)))
        .map(|(_, (day, _))| day.to_string())
        .unwrap_or_default();
    let mut ranked: Vec<(&str, usize)> = themes.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let themes: Vec<&str> = ranked
        .into_iter()
        .take(TOP_THEMES)
        .map(|(theme, _)| theme)
        .collect();
    if themes.is_empty() {
        format!("Patterns: most active on {busiest}.")
    } else {
        format!(
            "Patterns: most active on {busiest}; recurring themes: {}.",
            themes.join(", ")
        )
    }
}

fn achievements_section(entries: &[&IndexEntry]) -> String {
    let done: Vec<String> = entries
        .iter()
        .filter(|entry| entry.metadata.is_completed())
        .map(|entry| entry.label())
        .collect();
    if done.is_empty() {
        return "Achievements: none recorded.".to_string();
    }
    let shown = done
        .iter()
        .take(MAX_ACHIEVEMENTS)
        .cloned()
        .collect::<Vec<_>>()
        .join("; ");
    if done.len() > MAX_ACHIEVEMENTS {
        format!(
            "Achievements: {shown} and {} more.",
            done.len() - MAX_ACHIEVEMENTS
        )
    } else {
        format!("Achievements: {shown}.")
    }
}

fn challenges_section(entries: &[&IndexEntry]) -> String {
    let negative = entries
        .iter()
        .filter(|entry| entry.sentiment < CHALLENGE_SENTIMENT)
        .count();
    let open_urgent = entries
        .iter()
        .filter(|entry| entry.metadata.is_high_priority() && !entry.metadata.is_completed())
        .count();
    if negative == 0 && open_urgent == 0 {
        return "Challenges: none detected.".to_string();
    }
    format!(
        "Challenges: {negative} records with a negative tone; {open_urgent} high-priority items still open."
    )
}

fn closing_insight(entries: &[&IndexEntry]) -> String {
    let mood = entries.iter().map(|entry| entry.sentiment).sum::<f64>() / entries.len() as f64;
    let rate = completion_rate(entries);
    let insight = match rate {
        Some(rate) if rate >= 0.7 => "Strong follow-through; keep the current rhythm.",
        Some(rate) if rate < 0.3 => {
            "Few tasks were finished; consider planning fewer, smaller tasks."
        }
        _ if mood < CHALLENGE_SENTIMENT => "The tone was mostly negative; leave room for recovery.",
        _ => "Steady activity; pick one priority to push forward next.",
    };
    format!("Insight: {insight}")
}

#[cfg(test)]
mod tests {
    use super::{Timeframe, NO_ACTIVITY, SUMMARY_UNAVAILABLE};
    use crate::brain::index::SemanticIndex;
    use crate::brain::record::RecordType;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn empty_period_uses_fixed_message() {
        let index = SemanticIndex::default();
        assert_eq!(index.generate_summary(Timeframe::Week), NO_ACTIVITY);
    }

    #[test]
    fn inverted_custom_range_degrades() {
        let now = Utc::now();
        let index = SemanticIndex::default();
        let summary = index.generate_summary(Timeframe::Custom {
            start: now,
            end: now - Duration::days(1),
        });
        assert_eq!(summary, SUMMARY_UNAVAILABLE);
    }

    #[test]
    fn week_summary_lists_sections() {
        let now = Utc.with_ymd_and_hms(2026, 4, 6, 9, 0, 0).unwrap();
        let mut index = SemanticIndex::default();
        index.index_new_data_at(
            &json!({"id": "t1", "title": "Submit grant report", "status": "completed",
                    "updated_at": "2026-04-03T10:00:00Z"}),
            RecordType::Task,
            now,
        );
        index.index_new_data_at(
            &json!({"id": "t2", "title": "Fix flaky build", "priority": "high", "status": "todo",
                    "updated_at": "2026-04-04T10:00:00Z"}),
            RecordType::Task,
            now,
        );
        index.index_new_data_at(
            &json!({"id": "old", "title": "Ancient task", "updated_at": "2026-01-01T10:00:00Z"}),
            RecordType::Task,
            now,
        );

        let summary = index.generate_summary_at(Timeframe::Week, now);
        assert!(summary.contains("(2 records)"));
        assert!(summary.contains("Productivity: 2 tasks"));
        assert!(summary.contains("50% of tracked tasks completed"));
        assert!(summary.contains("Achievements: Submit grant report."));
        assert!(summary.contains("1 high-priority items still open"));
        assert!(!summary.contains("Ancient"));
    }
}
