//! Undirected, weighted similarity edges

use serde::{Deserialize, Serialize};

/// An undirected edge between two concepts.
///
/// Stored canonically with `source < target`, so a pair has exactly one
/// representation regardless of the order it was given in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityEdge {
    /// Lower node index
    pub source: usize,
    /// Higher node index
    pub target: usize,
    /// Cosine similarity between the two concepts
    pub weight: f32,
}

impl SimilarityEdge {
    /// Create an edge, ordering the endpoints canonically
    pub fn new(a: usize, b: usize, weight: f32) -> Self {
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Self {
            source,
            target,
            weight,
        }
    }

    /// Canonical `(low, high)` endpoint pair
    pub fn key(&self) -> (usize, usize) {
        (self.source, self.target)
    }
}
