//! In-process embedding cache keyed by text

use super::{Embedder, EmbeddingError};
use dashmap::DashMap;
use std::collections::HashSet;

/// Wraps an embedder and remembers every vector it produced.
///
/// Only texts not seen before reach the inner embedder, in one batch.
pub struct CachedEmbedder<E> {
    inner: E,
    cache: DashMap<String, Vec<f32>>,
}

impl<E: Embedder> CachedEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.cache.contains_key(text)
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: Embedder> Embedder for CachedEmbedder<E> {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut seen = HashSet::new();
        let misses: Vec<&str> = texts
            .iter()
            .copied()
            .filter(|t| !self.cache.contains_key(*t) && seen.insert(*t))
            .collect();

        if !misses.is_empty() {
            let vectors = self.inner.embed_batch(&misses)?;
            if vectors.len() != misses.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: misses.len(),
                    actual: vectors.len(),
                });
            }
            for (text, vector) in misses.into_iter().zip(vectors) {
                self.cache.insert(text.to_string(), vector);
            }
        }

        texts
            .iter()
            .map(|t| {
                self.cache
                    .get(*t)
                    .map(|entry| entry.value().clone())
                    .ok_or(EmbeddingError::EmptyResult)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every batch it is asked to embed
    struct RecordingEmbedder {
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl RecordingEmbedder {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
            }
        }
    }

    impl Embedder for RecordingEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.batches
                .lock()
                .unwrap()
                .push(texts.iter().map(|t| t.to_string()).collect());
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }
    }

    #[test]
    fn only_misses_reach_the_model() {
        let cached = CachedEmbedder::new(RecordingEmbedder::new());
        cached.embed_batch(&["a", "bb"]).unwrap();
        let vectors = cached.embed_batch(&["bb", "ccc", "a"]).unwrap();

        assert_eq!(vectors, vec![vec![2.0], vec![3.0], vec![1.0]]);
        let batches = cached.inner().batches.lock().unwrap().clone();
        assert_eq!(batches, vec![vec!["a", "bb"], vec!["ccc"]]);
        assert_eq!(cached.len(), 3);
    }

    #[test]
    fn duplicates_in_one_batch_are_embedded_once() {
        let cached = CachedEmbedder::new(RecordingEmbedder::new());
        let vectors = cached.embed_batch(&["x", "x", "y"]).unwrap();
        assert_eq!(vectors.len(), 3);
        let batches = cached.inner().batches.lock().unwrap().clone();
        assert_eq!(batches, vec![vec!["x", "y"]]);
    }

    #[test]
    fn fully_cached_batch_skips_the_model() {
        let cached = CachedEmbedder::new(RecordingEmbedder::new());
        cached.embed_batch(&["a"]).unwrap();
        cached.embed_batch(&["a", "a"]).unwrap();
        assert_eq!(cached.inner().batches.lock().unwrap().len(), 1);
        cached.clear();
        assert!(cached.is_empty());
    }
}
