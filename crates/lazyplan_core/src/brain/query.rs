//! Query intent and question topic classification.

use crate::brain::record::RecordType;
use crate::config::{IndexConfig, IntentTrigger, TopicTrigger};
use crate::rules::RuleSet;
use serde::{Deserialize, Serialize};

/// What a search query is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    Explanation,
    Information,
    Temporal,
    Recommendation,
    Analysis,
    Comparison,
    General,
}

impl QueryIntent {
    /// Affinity in `[0, 1]` between this intent and a record type.
    pub fn affinity(self, record_type: RecordType) -> f64 {
        use RecordType::*;
        match (self, record_type) {
            (Self::General, _) => 0.5,
            (Self::Temporal, Session | Timeblock) => 1.0,
            (Self::Temporal, Task) => 0.7,
            (Self::Recommendation, Insight | Goal) => 1.0,
            (Self::Recommendation, Habit) => 0.7,
            (Self::Analysis, Session | Habit | Insight) => 1.0,
            (Self::Analysis, Goal | Task) => 0.7,
            (Self::Explanation, Note | Insight) => 1.0,
            (Self::Explanation, Goal) => 0.6,
            (Self::Comparison, Goal | Habit | Session) => 0.8,
            (Self::Information, _) => 0.6,
            _ => 0.3,
        }
    }
}

/// Broad subject of a conversational question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionTopic {
    Productivity,
    Goals,
    Habits,
    Time,
    Wellbeing,
    General,
}

/// Ordered intent and topic rules compiled from configuration.
#[derive(Debug, Clone)]
pub struct QueryClassifier {
    intents: RuleSet<QueryIntent>,
    topics: RuleSet<QuestionTopic>,
}

impl QueryClassifier {
    pub fn from_config(config: &IndexConfig) -> Self {
        Self {
            intents: intent_rules(&config.intent_triggers),
            topics: topic_rules(&config.topic_triggers),
        }
    }

    /// First matching trigger wins; `General` otherwise.
    pub fn intent(&self, query: &str) -> QueryIntent {
        self.intents.classify(query)
    }

    pub fn topic(&self, question: &str) -> QuestionTopic {
        self.topics.classify(question)
    }
}

fn intent_rules(triggers: &[IntentTrigger]) -> RuleSet<QueryIntent> {
    triggers
        .iter()
        .fold(RuleSet::new(QueryIntent::General), |rules, trigger| {
            rules.with_rule(trigger.keywords.iter().cloned(), trigger.intent)
        })
}

fn topic_rules(triggers: &[TopicTrigger]) -> RuleSet<QuestionTopic> {
    triggers
        .iter()
        .fold(RuleSet::new(QuestionTopic::General), |rules, trigger| {
            rules.with_rule(trigger.keywords.iter().cloned(), trigger.topic)
        })
}
