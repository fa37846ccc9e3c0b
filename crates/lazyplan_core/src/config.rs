//! Engine configuration.
//!
//! # Responsibility
//! - Hold every keyword table and tuning constant used by the planner, the
//!   risk predictor and the semantic index.
//! - Load partial TOML documents on top of built-in defaults.
//!
//! # Invariants
//! - `EngineConfig::default()` always passes `validate()`.
//! - Services receive their section by value at construction; nothing reads
//!   configuration from global state.

use crate::brain::query::{QueryIntent, QuestionTopic};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Configuration loading and validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read configuration: {err}"),
            Self::Parse(err) => write!(f, "invalid configuration syntax: {err}"),
            Self::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Top-level configuration for all three engine services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub planner: PlannerConfig,
    pub risk: RiskConfig,
    pub index: IndexConfig,
}

impl EngineConfig {
    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.planner.validate()?;
        self.risk.validate()?;
        self.index.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub default_timeframe_days: i64,
    pub min_milestone_spacing_days: i64,
    pub skill_stage_interval_days: i64,
    pub phase_length_days: i64,
    pub min_phases: usize,
    pub max_phases: usize,
    pub weekly_hours_cap: f64,
    /// Total task hours are spread over this many weeks.
    pub weekly_hours_divisor: f64,
    pub horizon_days: i64,
    pub max_blocks_per_day: usize,
    pub min_block_minutes: u32,
    pub urgent_start_hour: u32,
    pub normal_start_hour: u32,
    pub deep_work_min_minutes: u32,
    pub learning_keywords: Vec<String>,
    pub habit_keywords: Vec<String>,
    pub project_keywords: Vec<String>,
    pub fitness_keywords: Vec<String>,
    pub creative_keywords: Vec<String>,
    pub planning_phase_keywords: Vec<String>,
    pub development_phase_keywords: Vec<String>,
    pub completion_phase_keywords: Vec<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_timeframe_days: 90,
            min_milestone_spacing_days: 14,
            skill_stage_interval_days: 21,
            phase_length_days: 30,
            min_phases: 3,
            max_phases: 8,
            weekly_hours_cap: 10.0,
            weekly_hours_divisor: 4.0,
            horizon_days: 7,
            max_blocks_per_day: 3,
            min_block_minutes: 30,
            urgent_start_hour: 9,
            normal_start_hour: 14,
            deep_work_min_minutes: 90,
            learning_keywords: words(&[
                "learn", "study", "master", "course", "skill", "language", "practice",
                "certif", "understand", "reading",
            ]),
            habit_keywords: words(&[
                "habit", "daily", "routine", "every day", "meditat", "journal", "consistent",
                "streak",
            ]),
            project_keywords: words(&[
                "project", "build", "launch", "create", "develop", "ship", "mobile app", "website",
                "product", "write a book",
            ]),
            fitness_keywords: words(&[
                "fitness", "workout", "exercise", "run", "gym", "marathon", "health", "weight",
                "yoga",
            ]),
            creative_keywords: words(&[
                "creative", "paint", "draw", "music", "novel", "design", "photograph", "art",
            ]),
            planning_phase_keywords: words(&[
                "planning", "plan", "foundation", "fundamentals", "research", "establish",
            ]),
            development_phase_keywords: words(&[
                "development", "develop", "build", "practice", "core", "consistency", "deepen",
            ]),
            completion_phase_keywords: words(&[
                "completion", "complete", "launch", "final", "proficiency", "sustain", "testing",
                "review",
            ]),
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_timeframe_days <= 0 {
            return Err(invalid("planner.default_timeframe_days must be positive"));
        }
        if self.min_milestone_spacing_days <= 0 {
            return Err(invalid("planner milestone spacing must be positive"));
        }
        if self.min_phases == 0 || self.min_phases > self.max_phases {
            return Err(invalid("planner.min_phases must be in 1..=max_phases"));
        }
        if self.urgent_start_hour > 23 || self.normal_start_hour > 23 {
            return Err(invalid("planner start hours must be in 0..=23"));
        }
        if self.weekly_hours_divisor <= 0.0 || self.weekly_hours_cap <= 0.0 {
            return Err(invalid("planner weekly hour settings must be positive"));
        }
        require_keywords("planner.learning_keywords", &self.learning_keywords)?;
        require_keywords("planner.habit_keywords", &self.habit_keywords)?;
        require_keywords("planner.project_keywords", &self.project_keywords)
    }
}

/// Monte Carlo trajectory constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    pub iterations: usize,
    /// Uniform velocity perturbation half-width (0.2 = ±20%).
    pub velocity_noise: f64,
    pub fatigue_min: f64,
    pub fatigue_max: f64,
    pub max_weeks: f64,
    /// Fixed seed for reproducible runs; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            velocity_noise: 0.2,
            fatigue_min: 0.9,
            fatigue_max: 1.0,
            max_weeks: 520.0,
            seed: None,
        }
    }
}

/// Skill inferred from goal keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub name: String,
    pub keywords: Vec<String>,
    pub required_level: f64,
}

impl SkillRequirement {
    fn new(name: &str, keywords: &[&str], required_level: f64) -> Self {
        Self {
            name: name.to_string(),
            keywords: words(keywords),
            required_level,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub default_timeframe_days: i64,
    /// Highest weekly progress fraction considered sustainable.
    pub max_sustainable_velocity: f64,
    /// Weekly velocity history assumed when a goal has none.
    pub default_velocity_curve: Vec<f64>,
    pub cold_start_confidence_cap: f64,
    pub confidence_cap: f64,
    pub fallback_confidence: f64,
    pub default_available_hours: f64,
    pub time_overload_ratio: f64,
    pub deep_work_share: f64,
    pub deep_work_tolerance: f64,
    pub deep_work_tags: Vec<String>,
    pub default_skill_level: f64,
    pub skill_gap_threshold: f64,
    pub learning_hours_per_gap: f64,
    pub critical_path_share: f64,
    pub energy_capacity: f64,
    pub energy_tolerance: f64,
    pub resource_shortage_hours: f64,
    pub external_dependency_probability: f64,
    pub max_recommendations: usize,
    /// Velocity multiplier per calendar month, January first.
    pub seasonal_factors: Vec<f64>,
    pub skills: Vec<SkillRequirement>,
    pub approval_keywords: Vec<String>,
    pub risk_trigger_keywords: Vec<String>,
    pub cache_ttl_seconds: i64,
    pub monte_carlo: MonteCarloConfig,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            default_timeframe_days: 90,
            max_sustainable_velocity: 0.25,
            default_velocity_curve: vec![0.04, 0.05, 0.06, 0.05, 0.055, 0.05],
            cold_start_confidence_cap: 0.5,
            confidence_cap: 0.95,
            fallback_confidence: 0.3,
            default_available_hours: 10.0,
            time_overload_ratio: 1.2,
            deep_work_share: 0.4,
            deep_work_tolerance: 0.1,
            deep_work_tags: words(&["deep-work", "deep_work", "deep work", "focus"]),
            default_skill_level: 0.3,
            skill_gap_threshold: 0.2,
            learning_hours_per_gap: 40.0,
            critical_path_share: 0.3,
            energy_capacity: 1.5,
            energy_tolerance: 0.2,
            resource_shortage_hours: 20.0,
            external_dependency_probability: 0.3,
            max_recommendations: 8,
            seasonal_factors: vec![1.1, 1.05, 1.0, 1.0, 1.0, 0.95, 0.9, 0.9, 1.05, 1.0, 0.95, 0.8],
            skills: vec![
                SkillRequirement::new(
                    "programming",
                    &["code", "software", "mobile app", "web app", "program", "develop", "website"],
                    0.7,
                ),
                SkillRequirement::new(
                    "language",
                    &["spanish", "french", "german", "japanese", "mandarin", "language", "fluent"],
                    0.6,
                ),
                SkillRequirement::new(
                    "writing",
                    &["write", "book", "novel", "blog", "article", "essay"],
                    0.6,
                ),
                SkillRequirement::new(
                    "design",
                    &["design", "ui", "ux", "illustrat", "brand"],
                    0.6,
                ),
                SkillRequirement::new(
                    "finance",
                    &["invest", "budget", "finance", "saving", "debt"],
                    0.5,
                ),
                SkillRequirement::new(
                    "endurance",
                    &["marathon", "triathlon", "ultra", "half marathon"],
                    0.6,
                ),
                SkillRequirement::new(
                    "public_speaking",
                    &["speak", "presentation", "talk", "pitch"],
                    0.5,
                ),
            ],
            approval_keywords: words(&[
                "approval", "approve", "sign-off", "sign off", "stakeholder", "waiting for",
                "feedback from", "review by", "permission",
            ]),
            risk_trigger_keywords: words(&[
                "external", "vendor", "depends", "dependency", "legal", "visa", "permit",
                "contract", "hiring", "funding",
            ]),
            cache_ttl_seconds: 15 * 60,
            monte_carlo: MonteCarloConfig::default(),
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mc = &self.monte_carlo;
        if mc.iterations == 0 {
            return Err(invalid("risk.monte_carlo.iterations must be positive"));
        }
        if !(0.0..1.0).contains(&mc.velocity_noise) {
            return Err(invalid("risk.monte_carlo.velocity_noise must be in [0, 1)"));
        }
        if mc.fatigue_min <= 0.0 || mc.fatigue_min > mc.fatigue_max {
            return Err(invalid(
                "risk.monte_carlo fatigue range must satisfy 0 < fatigue_min <= fatigue_max",
            ));
        }
        if mc.max_weeks <= 0.0 {
            return Err(invalid("risk.monte_carlo.max_weeks must be positive"));
        }
        if self.seasonal_factors.len() != 12 {
            return Err(invalid("risk.seasonal_factors must list 12 months"));
        }
        if self.default_velocity_curve.is_empty()
            || self
                .default_velocity_curve
                .iter()
                .any(|value| !value.is_finite() || *value < 0.0)
        {
            return Err(invalid(
                "risk.default_velocity_curve must be non-empty and non-negative",
            ));
        }
        if self.max_sustainable_velocity <= 0.0 || self.energy_capacity <= 0.0 {
            return Err(invalid("risk capacities must be positive"));
        }
        if !(0.0..=1.0).contains(&self.confidence_cap) {
            return Err(invalid("risk.confidence_cap must be in [0, 1]"));
        }
        require_keywords("risk.approval_keywords", &self.approval_keywords)
    }
}

/// Relative weights of the search relevance blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub similarity: f64,
    pub overlap: f64,
    pub recency: f64,
    pub importance: f64,
    pub intent: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            similarity: 0.40,
            overlap: 0.25,
            recency: 0.15,
            importance: 0.10,
            intent: 0.10,
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.similarity + self.overlap + self.recency + self.importance + self.intent
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentTrigger {
    pub intent: QueryIntent,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicTrigger {
    pub topic: QuestionTopic,
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub embedding_dimension: usize,
    pub relevance_threshold: f64,
    pub question_threshold: f64,
    pub max_results: usize,
    pub max_related: usize,
    pub related_discount: f64,
    pub recency_window_days: f64,
    pub weights: ScoringWeights,
    pub max_follow_ups: usize,
    pub max_insights: usize,
    /// Answers citing more sources than this get a provenance note.
    pub provenance_threshold: usize,
    pub recent_entity_window: usize,
    pub top_keyword_count: usize,
    pub stopwords: Vec<String>,
    pub positive_words: Vec<String>,
    pub negative_words: Vec<String>,
    pub intent_triggers: Vec<IntentTrigger>,
    pub topic_triggers: Vec<TopicTrigger>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            embedding_dimension: 256,
            relevance_threshold: 0.3,
            question_threshold: 0.4,
            max_results: 20,
            max_related: 3,
            related_discount: 0.7,
            recency_window_days: 30.0,
            weights: ScoringWeights::default(),
            max_follow_ups: 3,
            max_insights: 3,
            provenance_threshold: 5,
            recent_entity_window: 20,
            top_keyword_count: 10,
            stopwords: words(&[
                "the", "and", "for", "with", "that", "this", "from", "have", "has", "had",
                "was", "were", "are", "been", "being", "into", "onto", "about", "what", "when",
                "where", "which", "while", "would", "could", "should", "there", "their",
                "them", "they", "then", "than", "your", "yours", "mine", "just", "very",
                "some", "more", "most", "much", "many", "also", "only", "over", "after",
                "before", "will", "shall", "does", "did", "doing", "done", "each", "every",
                "other", "such", "here", "how", "why", "who", "whom", "can", "not", "but",
            ]),
            positive_words: words(&[
                "great", "good", "happy", "excellent", "productive", "achieved", "completed",
                "success", "love", "progress", "focused", "energized", "proud", "win",
                "enjoyed", "calm", "motivated",
            ]),
            negative_words: words(&[
                "bad", "tired", "stressed", "failed", "stuck", "difficult", "frustrated",
                "blocked", "late", "missed", "anxious", "overwhelmed", "exhausted",
                "distracted", "behind",
            ]),
            intent_triggers: vec![
                intent(QueryIntent::Explanation, &["why", "explain", "reason", "how come"]),
                intent(
                    QueryIntent::Comparison,
                    &["compare", "versus", "vs", "difference", "better than"],
                ),
                intent(
                    QueryIntent::Temporal,
                    &["when", "yesterday", "today", "last week", "recent", "schedule", "tomorrow"],
                ),
                intent(
                    QueryIntent::Recommendation,
                    &["should", "recommend", "suggest", "next step", "best way"],
                ),
                intent(
                    QueryIntent::Analysis,
                    &["analyze", "analyse", "pattern", "trend", "how much", "how many", "progress"],
                ),
                intent(
                    QueryIntent::Information,
                    &["what", "who", "which", "show", "list", "find"],
                ),
            ],
            topic_triggers: vec![
                topic(
                    QuestionTopic::Productivity,
                    &["productive", "productivity", "focus", "efficient", "output", "done"],
                ),
                topic(
                    QuestionTopic::Goals,
                    &["goal", "milestone", "target", "objective", "progress"],
                ),
                topic(QuestionTopic::Habits, &["habit", "routine", "streak", "daily"]),
                topic(
                    QuestionTopic::Time,
                    &["time", "schedule", "hours", "calendar", "when", "week"],
                ),
                topic(
                    QuestionTopic::Wellbeing,
                    &["feel", "mood", "energy", "stress", "happy", "tired"],
                ),
            ],
        }
    }
}

impl IndexConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding_dimension == 0 {
            return Err(invalid("index.embedding_dimension must be positive"));
        }
        if (self.weights.total() - 1.0).abs() > 1e-6 {
            return Err(invalid("index.weights must sum to 1"));
        }
        if self.recency_window_days <= 0.0 {
            return Err(invalid("index.recency_window_days must be positive"));
        }
        if self.max_results == 0 {
            return Err(invalid("index.max_results must be positive"));
        }
        if !(0.0..=1.0).contains(&self.related_discount) {
            return Err(invalid("index.related_discount must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.relevance_threshold)
            || !(0.0..=1.0).contains(&self.question_threshold)
        {
            return Err(invalid("index thresholds must be in [0, 1]"));
        }
        Ok(())
    }
}

fn words(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn intent(intent: QueryIntent, keywords: &[&str]) -> IntentTrigger {
    IntentTrigger {
        intent,
        keywords: words(keywords),
    }
}

fn topic(topic: QuestionTopic, keywords: &[&str]) -> TopicTrigger {
    TopicTrigger {
        topic,
        keywords: words(keywords),
    }
}

fn invalid(message: &str) -> ConfigError {
    ConfigError::Invalid(message.to_string())
}

fn require_keywords(name: &str, keywords: &[String]) -> Result<(), ConfigError> {
    if keywords.iter().all(|keyword| keyword.trim().is_empty()) {
        return Err(ConfigError::Invalid(format!("{name} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EngineConfig};

    #[test]
    fn default_config_is_valid() {
        EngineConfig::default()
            .validate()
            .expect("defaults should validate");
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = EngineConfig::from_toml_str(
            "[risk.monte_carlo]\niterations = 250\nseed = 7\n\n[planner]\nweekly_hours_cap = 6.0\n",
        )
        .expect("partial config should parse");

        assert_eq!(config.risk.monte_carlo.iterations, 250);
        assert_eq!(config.risk.monte_carlo.seed, Some(7));
        assert_eq!(config.risk.monte_carlo.velocity_noise, 0.2);
        assert_eq!(config.planner.weekly_hours_cap, 6.0);
        assert_eq!(config.planner.min_milestone_spacing_days, 14);
        assert_eq!(config.index.max_results, 20);
    }

    #[test]
    fn rejects_inverted_fatigue_range() {
        let err = EngineConfig::from_toml_str(
            "[risk.monte_carlo]\nfatigue_min = 1.0\nfatigue_max = 0.9\n",
        )
        .expect_err("inverted range must fail");
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_weights_that_do_not_sum_to_one() {
        let err = EngineConfig::from_toml_str("[index.weights]\nsimilarity = 0.9\n")
            .expect_err("weights must sum to 1");
        assert!(err.to_string().contains("sum to 1"));
    }

    #[test]
    fn reports_syntax_errors_as_parse() {
        let err = EngineConfig::from_toml_str("[planner\n").expect_err("broken toml");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
