//! Conversational answers over search results.
//!
//! Answers are templated from aggregate statistics of the retrieved
//! entries; nothing is generated beyond those templates.

use crate::brain::index::{SearchOptions, SearchResult, SemanticIndex};
use crate::brain::query::QuestionTopic;
use crate::brain::record::{IndexEntry, RecordType};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use std::collections::BTreeMap;

const EMPTY_ANSWER: &str =
    "I could not find anything in your records about that yet. Try adding more detail or logging related activity.";
const EMPTY_CONFIDENCE: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.95;
const POSITIVE_MOOD: f64 = 0.05;
const NEGATIVE_MOOD: f64 = -0.05;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerSource {
    pub id: String,
    pub record_type: RecordType,
    pub label: String,
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationalResponse {
    pub answer: String,
    pub confidence: f64,
    pub topic: QuestionTopic,
    pub sources: Vec<AnswerSource>,
    pub follow_up_questions: Vec<String>,
    pub insights: Vec<String>,
}

/// Aggregates over the entries behind an answer.
#[derive(Debug, Default)]
struct SourceStats {
    by_type: BTreeMap<RecordType, usize>,
    completed: usize,
    high_priority: usize,
    mean_sentiment: f64,
    top_keyword: Option<String>,
}

impl SourceStats {
    fn collect(entries: &[&IndexEntry]) -> Self {
        let mut stats = Self::default();
        let mut keyword_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for entry in entries {
            *stats.by_type.entry(entry.record_type).or_insert(0) += 1;
            stats.completed += usize::from(entry.metadata.is_completed());
            stats.high_priority += usize::from(entry.metadata.is_high_priority());
            stats.mean_sentiment += entry.sentiment;
            for keyword in &entry.keywords {
                *keyword_counts.entry(keyword.as_str()).or_insert(0) += 1;
            }
        }
        if !entries.is_empty() {
            stats.mean_sentiment /= entries.len() as f64;
        }
        stats.top_keyword = keyword_counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(keyword, _)| keyword.to_string());
        stats
    }

    fn count(&self, kinds: &[RecordType]) -> usize {
        kinds
            .iter()
            .map(|kind| self.by_type.get(kind).copied().unwrap_or(0))
            .sum()
    }

    fn dominant_type(&self) -> Option<RecordType> {
        self.by_type
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(kind, _)| *kind)
    }

    fn mood(&self) -> &'static str {
        if self.mean_sentiment > POSITIVE_MOOD {
            "mostly positive"
        } else if self.mean_sentiment < NEGATIVE_MOOD {
            "mostly negative"
        } else {
            "fairly neutral"
        }
    }
}

impl SemanticIndex {
    /// Answers `question`, optionally widened by caller `context` text.
    pub fn ask_question(&self, question: &str, context: Option<&str>) -> ConversationalResponse {
        self.ask_question_at(question, context, Utc::now())
    }

    pub fn ask_question_at(
        &self,
        question: &str,
        context: Option<&str>,
        now: DateTime<Utc>,
    ) -> ConversationalResponse {
        let topic = self.classifier().topic(question);
        let query = match context.map(str::trim).filter(|text| !text.is_empty()) {
            Some(extra) => format!("{question} {extra}"),
            None => question.to_string(),
        };
        let options = SearchOptions::new().with_threshold(self.config().question_threshold);
        let results = self.semantic_search_at(&query, &options, now);

        if results.is_empty() {
            debug!(
                "event=question_answered module=brain status=degraded topic={topic:?} sources=0"
            );
            return ConversationalResponse {
                answer: EMPTY_ANSWER.to_string(),
                confidence: EMPTY_CONFIDENCE,
                topic,
                sources: Vec::new(),
                follow_up_questions: self.follow_ups(topic),
                insights: Vec::new(),
            };
        }

        let entries: Vec<&IndexEntry> = results
            .iter()
            .filter_map(|result| self.get(&result.id))
            .collect();
        let stats = SourceStats::collect(&entries);

        let mut answer = topic_answer(topic, &stats, results.len());
        answer.push(' ');
        answer.push_str(&format!("The closest match is \"{}\".", results[0].label));
        if results.len() > self.config().provenance_threshold {
            answer.push_str(&format!(
                " This answer draws on {} of your records.",
                results.len()
            ));
        }

        let confidence = confidence(&results);
        debug!(
            "event=question_answered module=brain status=ok topic={topic:?} sources={} confidence={confidence:.2}",
            results.len()
        );

        ConversationalResponse {
            answer,
            confidence,
            topic,
            sources: results
                .iter()
                .map(|result| AnswerSource {
                    id: result.id.clone(),
                    record_type: result.record_type,
                    label: result.label.clone(),
                    relevance: result.relevance,
                })
                .collect(),
            follow_up_questions: self.follow_ups(topic),
            insights: insights(&stats, self.config().max_insights),
        }
    }

    fn follow_ups(&self, topic: QuestionTopic) -> Vec<String> {
        follow_up_bank(topic)
            .iter()
            .take(self.config().max_follow_ups)
            .map(|question| question.to_string())
            .collect()
    }
}

fn topic_answer(topic: QuestionTopic, stats: &SourceStats, total: usize) -> String {
    use RecordType::*;
    match topic {
        QuestionTopic::Productivity => format!(
            "Across {total} related records I see {} tasks and {} work sessions; {} items are marked completed.",
            stats.count(&[Task]),
            stats.count(&[Session, Timeblock]),
            stats.completed
        ),
        QuestionTopic::Goals => format!(
            "I found {} goal records and {} related tasks; {} items are completed and {} are high priority.",
            stats.count(&[Goal]),
            stats.count(&[Task]),
            stats.completed,
            stats.high_priority
        ),
        QuestionTopic::Habits => format!(
            "Your records mention {} habits and {} sessions that relate to this.",
            stats.count(&[Habit]),
            stats.count(&[Session])
        ),
        QuestionTopic::Time => format!(
            "I found {} scheduled blocks and {} sessions related to your question.",
            stats.count(&[Timeblock]),
            stats.count(&[Session])
        ),
        QuestionTopic::Wellbeing => format!(
            "Across {total} related records the tone is {}.",
            stats.mood()
        ),
        QuestionTopic::General => match stats.dominant_type() {
            Some(kind) => format!(
                "I found {total} relevant records, mostly of type {}.",
                kind.as_str()
            ),
            None => format!("I found {total} relevant records."),
        },
    }
}

/// Mean relevance of the five best sources, capped.
fn confidence(results: &[SearchResult]) -> f64 {
    let top: Vec<f64> = results.iter().take(5).map(|result| result.relevance).collect();
    if top.is_empty() {
        return EMPTY_CONFIDENCE;
    }
    (top.iter().sum::<f64>() / top.len() as f64).clamp(0.0, MAX_CONFIDENCE)
}

fn insights(stats: &SourceStats, limit: usize) -> Vec<String> {
    let mut found = Vec::new();
    if let Some(kind) = stats.dominant_type() {
        found.push(format!("Most related activity is recorded as {} entries", kind.as_str()));
    }
    if let Some(keyword) = &stats.top_keyword {
        found.push(format!("\"{keyword}\" is a recurring theme"));
    }
    if stats.completed > 0 {
        found.push(format!("{} related items are already completed", stats.completed));
    }
    if stats.high_priority > 0 {
        found.push(format!("{} related items are high priority", stats.high_priority));
    }
    found.push(format!("The overall tone is {}", stats.mood()));
    found.truncate(limit);
    found
}

fn follow_up_bank(topic: QuestionTopic) -> &'static [&'static str] {
    match topic {
        QuestionTopic::Productivity => &[
            "Which tasks took longer than planned this week?",
            "When during the day do you get the most done?",
            "What could you drop to free up focus time?",
        ],
        QuestionTopic::Goals => &[
            "Which goal is closest to its deadline?",
            "What is the next milestone for this goal?",
            "Are any goals blocked by other people?",
        ],
        QuestionTopic::Habits => &[
            "Which habit streak matters most to you right now?",
            "What usually breaks this routine?",
            "Would a smaller daily version of this habit be easier?",
        ],
        QuestionTopic::Time => &[
            "How many hours per week can you reserve for this?",
            "Which recurring commitments could move?",
            "Do you want time blocks proposed for next week?",
        ],
        QuestionTopic::Wellbeing => &[
            "What gave you energy this week?",
            "When did you last take a full day off?",
            "Which activities leave you most drained?",
        ],
        QuestionTopic::General => &[
            "What would you like to focus on next?",
            "Should I summarize your activity for this week?",
            "Which goal does this relate to?",
        ],
    }
}
