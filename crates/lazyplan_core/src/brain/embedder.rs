//! Text embedding capability.
//!
//! # Responsibility
//! - Define the `Embedder` seam used by search scoring.
//! - Provide the default deterministic hashed bag-of-words embedder.
//!
//! # Invariants
//! - `embed` returns exactly `dimension()` values.
//! - Non-empty input yields an L2-normalized vector; empty input yields zeros.

use crate::brain::text::tokens;
use crate::brain::SearchError;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;
    fn dimension(&self) -> usize;
    fn embed(&self, text: &str) -> Vec<f64>;
}

/// Token counts hashed into fixed buckets with FNV-1a.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashedBagOfWords {
    dimension: usize,
}

impl HashedBagOfWords {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Embedder for HashedBagOfWords {
    fn name(&self) -> &str {
        "hashed-bag-of-words"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Vec<f64> {
        let mut vector = vec![0.0; self.dimension];
        for token in tokens(text) {
            let bucket = (fnv1a(token.as_bytes()) % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }
        normalize(&mut vector);
        vector
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

fn normalize(vector: &mut [f64]) {
    let norm = vector.iter().map(|value| value * value).sum::<f64>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|value| *value /= norm);
    }
}

/// Cosine similarity; zero vectors score 0.
pub fn cosine(left: &[f64], right: &[f64]) -> Result<f64, SearchError> {
    if left.len() != right.len() {
        return Err(SearchError::DimensionMismatch {
            expected: left.len(),
            actual: right.len(),
        });
    }
    let dot: f64 = left.iter().zip(right).map(|(a, b)| a * b).sum();
    let left_norm = left.iter().map(|value| value * value).sum::<f64>().sqrt();
    let right_norm = right.iter().map(|value| value * value).sum::<f64>().sqrt();
    if left_norm == 0.0 || right_norm == 0.0 {
        return Ok(0.0);
    }
    Ok((dot / (left_norm * right_norm)).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::{cosine, Embedder, HashedBagOfWords};
    use crate::brain::SearchError;

    #[test]
    fn embeddings_are_deterministic_and_normalized() {
        let embedder = HashedBagOfWords::new(64);
        let first = embedder.embed("Morning run along the river");
        let second = embedder.embed("morning RUN along the river");
        assert_eq!(first, second);
        let norm: f64 = first.iter().map(|v| v * v).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
        assert!(embedder.embed("").iter().all(|v| *v == 0.0));
    }

    #[test]
    fn similar_texts_score_higher() {
        let embedder = HashedBagOfWords::new(256);
        let base = embedder.embed("spanish vocabulary practice");
        let near = embedder.embed("spanish vocabulary review");
        let far = embedder.embed("quarterly tax filing");
        assert!(cosine(&base, &near).unwrap() > cosine(&base, &far).unwrap());
        assert!((cosine(&base, &base).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        assert_eq!(
            cosine(&[1.0, 0.0], &[1.0]),
            Err(SearchError::DimensionMismatch { expected: 2, actual: 1 })
        );
    }
}
