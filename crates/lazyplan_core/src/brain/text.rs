//! Keyword, entity and sentiment extraction.
//!
//! All outputs are lower-cased and deduplicated in first-seen order.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9][A-Za-z0-9'\-]*").expect("valid word regex"));
static CAPITALIZED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-zA-Z0-9\-]+\b").expect("valid capitalized regex"));
static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}(?:/\d{2,4})?)\b").expect("valid date regex")
});
static TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d{1,2}:\d{2}(?:\s?[ap]m)?\b").expect("valid time regex")
});

const MIN_KEYWORD_CHARS: usize = 4;

/// Lower-cased word tokens in order.
pub fn tokens(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|token| token.as_str().to_lowercase())
        .collect()
}

/// Tokens longer than three characters that are not stopwords.
pub fn keywords(text: &str, stopwords: &HashSet<String>) -> Vec<String> {
    dedup(
        tokens(text)
            .into_iter()
            .filter(|token| token.chars().count() >= MIN_KEYWORD_CHARS)
            .filter(|token| !stopwords.contains(token)),
    )
}

/// Capitalized words plus date-like and time-like tokens.
pub fn entities(text: &str, stopwords: &HashSet<String>) -> Vec<String> {
    let capitalized = CAPITALIZED_RE
        .find_iter(text)
        .map(|found| found.as_str().to_lowercase())
        .filter(|word| !stopwords.contains(word));
    let dates = DATE_RE.find_iter(text).map(|found| found.as_str().to_string());
    let times = TIME_RE
        .find_iter(text)
        .map(|found| found.as_str().to_lowercase());
    dedup(capitalized.chain(dates).chain(times))
}

/// Lexicon sentiment in `[-1, 1]`, averaged by token count.
pub fn sentiment(text: &str, positive: &HashSet<String>, negative: &HashSet<String>) -> f64 {
    let tokens = tokens(text);
    if tokens.is_empty() {
        return 0.0;
    }
    let score: i64 = tokens
        .iter()
        .map(|token| {
            if positive.contains(token) {
                1
            } else if negative.contains(token) {
                -1
            } else {
                0
            }
        })
        .sum();
    (score as f64 / tokens.len() as f64).clamp(-1.0, 1.0)
}

pub fn lexicon(words: &[String]) -> HashSet<String> {
    words.iter().map(|word| word.trim().to_lowercase()).collect()
}

fn dedup(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values.filter(|value| seen.insert(value.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::{entities, keywords, lexicon, sentiment};

    fn stopwords() -> std::collections::HashSet<String> {
        lexicon(&["with".to_string(), "this".to_string(), "the".to_string()])
    }

    #[test]
    fn keywords_skip_short_words_and_stopwords() {
        let found = keywords("Practice Spanish with Maria, practice verbs this week", &stopwords());
        assert_eq!(found, vec!["practice", "spanish", "maria", "verbs", "week"]);
    }

    #[test]
    fn entities_include_dates_and_times() {
        let found = entities("Call Maria on 2026-05-01 at 9:30 am about The plan", &stopwords());
        assert_eq!(found, vec!["call", "maria", "2026-05-01", "9:30 am"]);
    }

    #[test]
    fn sentiment_is_averaged_by_token_count() {
        let positive = lexicon(&["great".to_string()]);
        let negative = lexicon(&["tired".to_string()]);
        assert!((sentiment("great great tired day", &positive, &negative) - 0.25).abs() < 1e-9);
        assert_eq!(sentiment("", &positive, &negative), 0.0);
    }
}
