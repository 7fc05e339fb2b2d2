//! Deterministic embedders for tests

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thoughtnet::{Embedder, EmbeddingError};

/// Mock embedder that returns predetermined vectors based on text.
///
/// Unknown texts get a zero vector.
pub struct MockEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dimension: usize,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(vectors: HashMap<String, Vec<f32>>) -> Self {
        let dimension = vectors.values().next().map_or(3, Vec::len);
        Self {
            vectors,
            dimension,
            calls: AtomicUsize::new(0),
        }
    }

    /// travel/journey/voyage close together, democracy off on its own
    pub fn concepts() -> Self {
        Self::new(HashMap::from([
            ("travel".to_string(), vec![0.9, 0.3, 0.1]),
            ("journey".to_string(), vec![0.85, 0.35, 0.15]),
            ("voyage".to_string(), vec![0.8, 0.4, 0.1]),
            ("democracy".to_string(), vec![0.1, 0.2, 0.95]),
        ]))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Embedder for MockEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(texts
            .iter()
            .map(|t| {
                self.vectors
                    .get(*t)
                    .cloned()
                    .unwrap_or_else(|| vec![0.0; self.dimension])
            })
            .collect())
    }
}

/// `n` seeded random vectors with components in `[-1, 1)`
pub fn random_vectors(n: usize, dimension: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| (0..dimension).map(|_| rng.gen_range(-1.0f32..1.0)).collect())
        .collect()
}
