//! Semantic index over activity records ("second brain").
//!
//! # Responsibility
//! - Index arbitrary activity records with keywords, entities, a hashed
//!   embedding, sentiment and importance.
//! - Answer ranked searches, conversational questions and period summaries.
//!
//! # Invariants
//! - Entries are keyed by record id; re-indexing overwrites.
//! - Public entry points never return errors; failures are logged and
//!   degrade to empty results, apologetic answers or a fixed message.
//! - The index is single-writer; callers serialize `index_new_data`.

pub mod answer;
pub mod context;
pub mod embedder;
pub mod graph;
pub mod index;
pub mod query;
pub mod record;
pub mod summary;
pub mod text;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type IndexingResult<T> = Result<T, IndexingError>;

#[derive(Debug, Clone, PartialEq)]
pub enum IndexingError {
    /// Record is not a JSON object.
    InvalidRecord(String),
    MissingId,
    /// No searchable text could be extracted.
    EmptyContent { id: String },
}

impl Display for IndexingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRecord(message) => write!(f, "invalid record: {message}"),
            Self::MissingId => write!(f, "record has no id"),
            Self::EmptyContent { id } => write!(f, "record `{id}` has no searchable text"),
        }
    }
}

impl Error for IndexingError {}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    EmptyQuery,
    /// Embedder produced a vector of unexpected length.
    DimensionMismatch { expected: usize, actual: usize },
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyQuery => write!(f, "search query is empty"),
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "embedding dimension mismatch: expected {expected}, got {actual}"
            ),
        }
    }
}

impl Error for SearchError {}

#[derive(Debug, Clone, PartialEq)]
pub enum SummaryError {
    InvalidRange,
}

impl Display for SummaryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange => write!(f, "summary range end precedes its start"),
        }
    }
}

impl Error for SummaryError {}
