//! Grouping and 2D projection of concept embeddings
//!
//! Both passes are seeded, so the same vectors and config always produce the
//! same labels and the same layout.

mod kmeans;
mod tsne;

pub use kmeans::{ClusterAssignment, KMeans, KMeansConfig};
pub use tsne::{Point2, Tsne, TsneConfig};

use thiserror::Error;

/// Errors that can occur while clustering or projecting
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClusterError {
    #[error("cannot cluster an empty set of vectors")]
    EmptyInput,

    #[error("number of clusters must be > 0")]
    ZeroClusters,

    #[error("number of clusters ({k}) must be <= number of vectors ({n})")]
    TooManyClusters { k: usize, n: usize },

    #[error("vector {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("perplexity ({perplexity}) must be less than the number of vectors ({n})")]
    PerplexityTooLarge { perplexity: f64, n: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for clustering operations
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Check every vector has the first vector's dimension; returns that dimension
pub(crate) fn common_dimension(vectors: &[Vec<f32>]) -> ClusterResult<usize> {
    let expected = vectors.first().map_or(0, Vec::len);
    for (index, v) in vectors.iter().enumerate() {
        if v.len() != expected {
            return Err(ClusterError::DimensionMismatch {
                index,
                expected,
                actual: v.len(),
            });
        }
    }
    Ok(expected)
}

#[inline]
pub(crate) fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}
