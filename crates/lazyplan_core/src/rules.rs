//! Ordered keyword rules.
//!
//! # Responsibility
//! - Express every keyword-driven classification in the engine (strategy,
//!   task template, schedule domain, skill, intent, topic) as an explicit
//!   ordered list of `(keywords, outcome)` pairs with a documented default.
//!
//! # Invariants
//! - The first rule with a matching keyword wins; order is significant.
//! - Matching is case-insensitive. Single-word keywords match the start of a
//!   token (`learn` matches `learning`); multi-word keywords match anywhere.

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-z0-9][a-z0-9'\-]*").expect("valid token regex"));

/// One classification rule.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRule<T> {
    pub keywords: Vec<String>,
    pub outcome: T,
}

impl<T> KeywordRule<T> {
    pub fn new<I, S>(keywords: I, outcome: T) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|keyword| keyword.into().trim().to_lowercase())
                .filter(|keyword| !keyword.is_empty())
                .collect(),
            outcome,
        }
    }

    fn matches(&self, text: &MatchText) -> bool {
        self.keywords.iter().any(|keyword| text.contains(keyword))
    }
}

/// Ordered rule list with a fallback outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet<T> {
    rules: Vec<KeywordRule<T>>,
    default: T,
}

impl<T: Clone> RuleSet<T> {
    pub fn new(default: T) -> Self {
        Self {
            rules: Vec::new(),
            default,
        }
    }

    /// Appends a rule at the lowest precedence.
    pub fn with_rule<I, S>(mut self, keywords: I, outcome: T) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push(KeywordRule::new(keywords, outcome));
        self
    }

    /// Returns the outcome of the first matching rule, or the default.
    pub fn classify(&self, text: &str) -> T {
        self.first_match(text).unwrap_or_else(|| self.default.clone())
    }

    /// Returns the first matching outcome without falling back.
    pub fn first_match(&self, text: &str) -> Option<T> {
        let text = MatchText::new(text);
        self.rules
            .iter()
            .find(|rule| rule.matches(&text))
            .map(|rule| rule.outcome.clone())
    }

    /// Returns every matching outcome in rule order.
    pub fn matches(&self, text: &str) -> Vec<T> {
        let text = MatchText::new(text);
        self.rules
            .iter()
            .filter(|rule| rule.matches(&text))
            .map(|rule| rule.outcome.clone())
            .collect()
    }

    pub fn default_outcome(&self) -> &T {
        &self.default
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Returns true when any keyword matches `text` under rule semantics.
pub fn contains_any(text: &str, keywords: &[String]) -> bool {
    let text = MatchText::new(text);
    keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .any(|keyword| text.contains(&keyword))
}

/// Counts the keywords that match `text` under rule semantics.
pub fn count_matches(text: &str, keywords: &[String]) -> usize {
    let text = MatchText::new(text);
    keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty() && text.contains(keyword))
        .count()
}

struct MatchText {
    lowered: String,
    tokens: Vec<String>,
}

impl MatchText {
    fn new(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let tokens = TOKEN_RE
            .find_iter(&lowered)
            .map(|token| token.as_str().to_string())
            .collect();
        Self { lowered, tokens }
    }

    fn contains(&self, keyword: &str) -> bool {
        if keyword.contains(' ') {
            self.lowered.contains(keyword)
        } else {
            self.tokens.iter().any(|token| token.starts_with(keyword))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{contains_any, count_matches, RuleSet};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        Learning,
        Habit,
        Other,
    }

    fn rules() -> RuleSet<Kind> {
        RuleSet::new(Kind::Other)
            .with_rule(["learn", "study"], Kind::Learning)
            .with_rule(["daily", "habit", "every day"], Kind::Habit)
    }

    #[test]
    fn first_matching_rule_wins() {
        assert_eq!(rules().classify("Study every day"), Kind::Learning);
        assert_eq!(rules().classify("Meditate every day"), Kind::Habit);
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(rules().classify("Renovate the kitchen"), Kind::Other);
        assert_eq!(rules().first_match("Renovate the kitchen"), None);
    }

    #[test]
    fn keywords_match_token_prefixes_not_infixes() {
        assert_eq!(rules().classify("LEARNING Rust"), Kind::Learning);
        assert_eq!(rules().classify("unlearn bad posture"), Kind::Other);
    }

    #[test]
    fn matches_returns_all_outcomes_in_order() {
        assert_eq!(
            rules().matches("daily study block"),
            vec![Kind::Learning, Kind::Habit]
        );
    }

    #[test]
    fn helpers_share_rule_semantics() {
        let keywords = vec!["approval".to_string(), "sign off".to_string()];
        assert!(contains_any("Waiting for approvals", &keywords));
        assert_eq!(count_matches("approval then sign off", &keywords), 2);
        assert_eq!(count_matches("nothing here", &keywords), 0);
    }
}
