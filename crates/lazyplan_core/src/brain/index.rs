//! Semantic index service.
//!
//! # Responsibility
//! - Own the id-keyed entry map, the knowledge graph and the rolling
//!   semantic context.
//! - Rank entries against a query with a fixed weighted blend.
//!
//! # Invariants
//! - Re-indexing an id overwrites its entry; `len()` counts unique ids.
//! - Results are sorted by relevance (ties by id) and never fall below the
//!   effective threshold.

use crate::brain::context::SemanticContext;
use crate::brain::embedder::{cosine, Embedder, HashedBagOfWords};
use crate::brain::graph::KnowledgeGraph;
use crate::brain::query::{QueryClassifier, QueryIntent};
use crate::brain::record::{extract, IndexEntry, RecordType};
use crate::brain::text::{entities, keywords, lexicon, sentiment};
use crate::brain::{IndexingError, IndexingResult, SearchError};
use crate::config::{ConfigError, IndexConfig};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

const SECONDS_PER_DAY: f64 = 24.0 * 3600.0;

/// Filters and limits for one search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    /// Empty means all types.
    pub record_types: Vec<RecordType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Overrides the configured relevance threshold.
    pub threshold: Option<f64>,
    /// Overrides the configured result limit.
    pub limit: Option<usize>,
    pub include_related: bool,
}

impl SearchOptions {
    /// No filters, configured limits, related-entry expansion on.
    pub fn new() -> Self {
        Self {
            include_related: true,
            ..Self::default()
        }
    }

    pub fn with_types(mut self, record_types: impl IntoIterator<Item = RecordType>) -> Self {
        self.record_types = record_types.into_iter().collect();
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    fn admits(&self, entry: &IndexEntry) -> bool {
        (self.record_types.is_empty() || self.record_types.contains(&entry.record_type))
            && self.since.map_or(true, |since| entry.timestamp >= since)
            && self.until.map_or(true, |until| entry.timestamp <= until)
    }
}

/// Graph-connected entry attached to a search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedEntry {
    pub id: String,
    pub record_type: RecordType,
    pub label: String,
    pub relevance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub record_type: RecordType,
    pub label: String,
    pub content: String,
    pub relevance: f64,
    pub similarity: f64,
    pub intent: QueryIntent,
    /// Query keywords and entities found in the entry.
    pub matched_terms: Vec<String>,
    pub related: Vec<RelatedEntry>,
}

pub struct SemanticIndex {
    config: IndexConfig,
    embedder: Box<dyn Embedder>,
    classifier: QueryClassifier,
    stopwords: HashSet<String>,
    positive: HashSet<String>,
    negative: HashSet<String>,
    entries: HashMap<String, IndexEntry>,
    graph: KnowledgeGraph,
    context: SemanticContext,
}

impl std::fmt::Debug for SemanticIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticIndex")
            .field("embedder", &self.embedder.name())
            .field("entries", &self.entries.len())
            .field("graph_nodes", &self.graph.node_count())
            .finish()
    }
}

impl Default for SemanticIndex {
    fn default() -> Self {
        Self::new(IndexConfig::default())
    }
}

impl SemanticIndex {
    pub fn new(config: IndexConfig) -> Self {
        let embedder = HashedBagOfWords::new(config.embedding_dimension);
        Self::with_embedder(config, Box::new(embedder))
    }

    /// Validates `config` before building the index.
    pub fn try_new(config: IndexConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn with_embedder(config: IndexConfig, embedder: Box<dyn Embedder>) -> Self {
        Self {
            classifier: QueryClassifier::from_config(&config),
            stopwords: lexicon(&config.stopwords),
            positive: lexicon(&config.positive_words),
            negative: lexicon(&config.negative_words),
            config,
            embedder,
            entries: HashMap::new(),
            graph: KnowledgeGraph::new(),
            context: SemanticContext::default(),
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&IndexEntry> {
        self.entries.get(id)
    }

    pub fn graph(&self) -> &KnowledgeGraph {
        &self.graph
    }

    /// Mutable access for explicit maintenance (`decay`, `prune`).
    pub fn graph_mut(&mut self) -> &mut KnowledgeGraph {
        &mut self.graph
    }

    pub fn semantic_context(&self) -> &SemanticContext {
        &self.context
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = &IndexEntry> {
        self.entries.values()
    }

    pub(crate) fn classifier(&self) -> &QueryClassifier {
        &self.classifier
    }

    /// Indexes `record`, logging and swallowing failures.
    ///
    /// Returns whether the record was stored.
    pub fn index_new_data(&mut self, record: &Value, record_type: RecordType) -> bool {
        self.index_new_data_at(record, record_type, Utc::now())
    }

    pub fn index_new_data_at(
        &mut self,
        record: &Value,
        record_type: RecordType,
        now: DateTime<Utc>,
    ) -> bool {
        match self.try_index_at(record, record_type, now) {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    "event=record_indexed module=brain status=error type={} error={}",
                    record_type.as_str(),
                    err
                );
                false
            }
        }
    }

    pub fn try_index(
        &mut self,
        record: &Value,
        record_type: RecordType,
    ) -> IndexingResult<&IndexEntry> {
        self.try_index_at(record, record_type, Utc::now())
    }

    pub fn try_index_at(
        &mut self,
        record: &Value,
        record_type: RecordType,
        now: DateTime<Utc>,
    ) -> IndexingResult<&IndexEntry> {
        let extracted = extract(record, record_type, now)?;
        let embedding = self.embedder.embed(&extracted.content);
        if embedding.len() != self.embedder.dimension() {
            return Err(IndexingError::InvalidRecord(format!(
                "embedder returned {} values, expected {}",
                embedding.len(),
                self.embedder.dimension()
            )));
        }

        let entry = IndexEntry {
            keywords: keywords(&extracted.content, &self.stopwords),
            entities: entities(&extracted.content, &self.stopwords),
            sentiment: sentiment(&extracted.content, &self.positive, &self.negative),
            id: extracted.id,
            record_type,
            content: extracted.content,
            embedding,
            importance: extracted.importance,
            timestamp: extracted.timestamp,
            metadata: extracted.metadata,
        };

        let previous = self.entries.remove(&entry.id);
        if let Some(previous) = &previous {
            self.graph.remove_entry(&previous.id, &previous.entities);
        }
        self.graph.record_cooccurrence(&entry.id, &entry.entities);
        self.context.apply(
            &entry,
            previous.as_ref(),
            self.config.recent_entity_window,
            self.config.top_keyword_count,
            now,
        );

        debug!(
            "event=record_indexed module=brain status=ok type={} replaced={} keywords={} entities={} size={}",
            record_type.as_str(),
            previous.is_some(),
            entry.keywords.len(),
            entry.entities.len(),
            self.entries.len() + 1
        );

        let id = entry.id.clone();
        let stored: &IndexEntry = self.entries.entry(id).or_insert(entry);
        Ok(stored)
    }

    /// Ranked search; failures degrade to an empty list.
    pub fn semantic_search(&self, query: &str, options: &SearchOptions) -> Vec<SearchResult> {
        self.semantic_search_at(query, options, Utc::now())
    }

    pub fn semantic_search_at(
        &self,
        query: &str,
        options: &SearchOptions,
        now: DateTime<Utc>,
    ) -> Vec<SearchResult> {
        match self.try_search_at(query, options, now) {
            Ok(results) => results,
            Err(SearchError::EmptyQuery) => Vec::new(),
            Err(err) => {
                warn!("event=semantic_search module=brain status=degraded error={err}");
                Vec::new()
            }
        }
    }

    pub fn try_search_at(
        &self,
        query: &str,
        options: &SearchOptions,
        now: DateTime<Utc>,
    ) -> Result<Vec<SearchResult>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        let query_embedding = self.embedder.embed(query);
        let intent = self.classifier.intent(query);
        let mut query_terms = keywords(query, &self.stopwords);
        for entity in entities(query, &self.stopwords) {
            if !query_terms.contains(&entity) {
                query_terms.push(entity);
            }
        }
        let threshold = options.threshold.unwrap_or(self.config.relevance_threshold);
        let limit = options.limit.unwrap_or(self.config.max_results);

        let mut results = Vec::new();
        for entry in self.entries.values().filter(|entry| options.admits(entry)) {
            let similarity = cosine(&query_embedding, &entry.embedding)?;
            let matched_terms: Vec<String> = query_terms
                .iter()
                .filter(|term| entry.keywords.contains(term) || entry.entities.contains(term))
                .cloned()
                .collect();
            let relevance =
                self.relevance(entry, similarity, &matched_terms, &query_terms, intent, now);
            if relevance < threshold {
                continue;
            }
            results.push(SearchResult {
                id: entry.id.clone(),
                record_type: entry.record_type,
                label: entry.label(),
                content: entry.content.clone(),
                relevance,
                similarity,
                intent,
                matched_terms,
                related: Vec::new(),
            });
        }
        results.sort_by(|a, b| {
            b.relevance
                .total_cmp(&a.relevance)
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(limit);

        if options.include_related {
            for result in &mut results {
                result.related = self.related_to(&result.id, result.relevance);
            }
        }

        debug!(
            "event=semantic_search module=brain status=ok intent={:?} candidates={} results={}",
            intent,
            self.entries.len(),
            results.len()
        );
        Ok(results)
    }

    fn relevance(
        &self,
        entry: &IndexEntry,
        similarity: f64,
        matched_terms: &[String],
        query_terms: &[String],
        intent: QueryIntent,
        now: DateTime<Utc>,
    ) -> f64 {
        let weights = &self.config.weights;
        let overlap = if query_terms.is_empty() {
            0.0
        } else {
            matched_terms.len() as f64 / query_terms.len() as f64
        };
        let age_days = (now - entry.timestamp).num_seconds() as f64 / SECONDS_PER_DAY;
        let recency = (1.0 - age_days.max(0.0) / self.config.recency_window_days).clamp(0.0, 1.0);

        (weights.similarity * similarity.max(0.0)
            + weights.overlap * overlap
            + weights.recency * recency
            + weights.importance * entry.importance
            + weights.intent * intent.affinity(entry.record_type))
        .clamp(0.0, 1.0)
    }

    fn related_to(&self, id: &str, relevance: f64) -> Vec<RelatedEntry> {
        let Some(entry) = self.entries.get(id) else {
            return Vec::new();
        };
        self.graph
            .related_entries(&entry.entities, id)
            .into_iter()
            .filter_map(|(related_id, _)| self.entries.get(&related_id))
            .take(self.config.max_related)
            .map(|related| RelatedEntry {
                id: related.id.clone(),
                record_type: related.record_type,
                label: related.label(),
                relevance: relevance * self.config.related_discount,
            })
            .collect()
    }
}
