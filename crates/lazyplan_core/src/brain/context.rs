//! Rolling summary of everything indexed so far.

use crate::brain::record::{IndexEntry, RecordType};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};

#[derive(Debug, Clone, Default, Serialize)]
pub struct SemanticContext {
    pub counts_by_type: BTreeMap<RecordType, usize>,
    /// Most frequent keywords, heaviest first.
    pub top_keywords: Vec<String>,
    /// Newest first.
    pub recent_entities: VecDeque<String>,
    pub mean_sentiment: f64,
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip)]
    keyword_counts: HashMap<String, usize>,
    #[serde(skip)]
    sentiment_sum: f64,
}

impl SemanticContext {
    pub fn entry_count(&self) -> usize {
        self.counts_by_type.values().sum()
    }

    /// Folds `entry` in, replacing `previous` when the id was already indexed.
    pub(crate) fn apply(
        &mut self,
        entry: &IndexEntry,
        previous: Option<&IndexEntry>,
        entity_window: usize,
        top_keyword_count: usize,
        now: DateTime<Utc>,
    ) {
        if let Some(previous) = previous {
            if let Some(count) = self.counts_by_type.get_mut(&previous.record_type) {
                *count = count.saturating_sub(1);
            }
            self.sentiment_sum -= previous.sentiment;
            for keyword in &previous.keywords {
                if let Some(count) = self.keyword_counts.get_mut(keyword) {
                    *count = count.saturating_sub(1);
                }
            }
            self.keyword_counts.retain(|_, count| *count > 0);
        }
        *self.counts_by_type.entry(entry.record_type).or_insert(0) += 1;
        self.counts_by_type.retain(|_, count| *count > 0);
        self.sentiment_sum += entry.sentiment;
        let total = self.entry_count();
        self.mean_sentiment = if total == 0 {
            0.0
        } else {
            self.sentiment_sum / total as f64
        };

        for keyword in &entry.keywords {
            *self.keyword_counts.entry(keyword.clone()).or_insert(0) += 1;
        }
        let mut ranked: Vec<(&String, &usize)> = self.keyword_counts.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        self.top_keywords = ranked
            .into_iter()
            .take(top_keyword_count)
            .map(|(keyword, _)| keyword.clone())
            .collect();

        for entity in &entry.entities {
            self.recent_entities.retain(|known| known != entity);
            self.recent_entities.push_front(entity.clone());
        }
        self.recent_entities.truncate(entity_window);
        self.last_updated = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use crate::brain::index::SemanticIndex;
    use crate::brain::record::RecordType;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[test]
    fn reindexing_replaces_previous_contribution() {
        let now = Utc.with_ymd_and_hms(2026, 4, 6, 9, 0, 0).unwrap();
        let mut index = SemanticIndex::default();
        index.index_new_data_at(
            &json!({"id": "n1", "content": "terrible commute with Alice"}),
            RecordType::Note,
            now,
        );
        index.index_new_data_at(
            &json!({"id": "n1", "content": "pleasant garden walk with Bob"}),
            RecordType::Note,
            now,
        );
        let chores = json!({"id": "t1", "title": "garden chores"});
        index.index_new_data_at(&chores, RecordType::Task, now);

        let context = index.semantic_context();
        assert_eq!(context.entry_count(), 2);
        assert_eq!(context.top_keywords[0], "garden");
        assert!(!context.top_keywords.contains(&"commute".to_string()));
        assert_eq!(context.recent_entities.front().map(String::as_str), Some("bob"));
        assert_eq!(context.last_updated, Some(now));
    }
}
