//! Text to vector embedding
//!
//! The model sits behind the `Embedder` trait: fastembed in production
//! (feature `embeddings`), precomputed vectors from a JSON file otherwise,
//! and deterministic mocks in tests.

mod cache;

pub use cache::CachedEmbedder;

use crate::graph::{ProgressObserver, ProgressUpdate, Stage};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Error type for embedding operations.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// The embedding model returned no results
    EmptyResult,
    /// Model loading or inference failed
    ModelError(String),
    /// The model returned a different number of vectors than texts given
    CountMismatch { expected: usize, actual: usize },
    /// No precomputed vector exists for this text
    UnknownText(String),
    /// Precomputed vectors could not be read
    Load(String),
}

impl fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingError::EmptyResult => write!(f, "embedding returned no results"),
            EmbeddingError::ModelError(msg) => write!(f, "embedding model error: {}", msg),
            EmbeddingError::CountMismatch { expected, actual } => write!(
                f,
                "embedding returned {} vectors for {} texts",
                actual, expected
            ),
            EmbeddingError::UnknownText(text) => write!(f, "no vector for text: {:?}", text),
            EmbeddingError::Load(msg) => write!(f, "failed to load vectors: {}", msg),
        }
    }
}

impl std::error::Error for EmbeddingError {}

/// Trait for embedding text into vectors.
///
/// Implementations handle model loading and inference.
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts, returning one vector per text.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed_batch(texts)
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).embed_batch(texts)
    }
}

/// Embed every text in batches of `batch_size`, reporting after each batch
pub fn embed_all(
    embedder: &dyn Embedder,
    texts: &[&str],
    batch_size: usize,
    progress: &dyn ProgressObserver,
) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let batch_size = batch_size.max(1);
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size) {
        let embedded = embedder.embed_batch(batch)?;
        if embedded.len() != batch.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: batch.len(),
                actual: embedded.len(),
            });
        }
        vectors.extend(embedded);
        progress.on_progress(
            &ProgressUpdate::new(Stage::Embedding, vectors.len() as f32 / texts.len() as f32)
                .with_message(format!("Embedded {}/{} concepts", vectors.len(), texts.len())),
        );
    }
    debug!(count = vectors.len(), batch_size, "embedded texts");
    Ok(vectors)
}

/// Vectors computed ahead of time, looked up by exact text
#[derive(Debug, Clone, Default)]
pub struct PrecomputedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
}

impl PrecomputedEmbedder {
    pub fn new(vectors: HashMap<String, Vec<f32>>) -> Self {
        Self { vectors }
    }

    /// Read a JSON object mapping each text to its vector
    pub fn from_file(path: &Path) -> Result<Self, EmbeddingError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EmbeddingError::Load(format!("{}: {}", path.display(), e)))?;
        let vectors: HashMap<String, Vec<f32>> = serde_json::from_str(&content)
            .map_err(|e| EmbeddingError::Load(format!("{}: {}", path.display(), e)))?;
        debug!(path = %path.display(), count = vectors.len(), "loaded precomputed vectors");
        Ok(Self { vectors })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl Embedder for PrecomputedEmbedder {
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts
            .iter()
            .map(|text| {
                self.vectors
                    .get(*text)
                    .cloned()
                    .ok_or_else(|| EmbeddingError::UnknownText(text.to_string()))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// FastEmbedEmbedder: production embedder behind the `embeddings` feature
// ---------------------------------------------------------------------------

#[cfg(feature = "embeddings")]
mod fastembed_impl {
    use super::{Embedder, EmbeddingError};
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::Mutex;

    /// Production embedder backed by fastembed (ONNX Runtime).
    ///
    /// `TextEmbedding::embed` needs `&mut self`, hence the `Mutex`.
    pub struct FastEmbedEmbedder {
        model: Mutex<TextEmbedding>,
    }

    impl FastEmbedEmbedder {
        pub fn new(model: EmbeddingModel) -> Result<Self, EmbeddingError> {
            let options = InitOptions::new(model).with_show_download_progress(false);
            let embedding = TextEmbedding::try_new(options)
                .map_err(|e| EmbeddingError::ModelError(e.to_string()))?;
            Ok(Self {
                model: Mutex::new(embedding),
            })
        }

        /// all-MiniLM-L12-v2, 384 dimensions
        pub fn default_model() -> Result<Self, EmbeddingError> {
            Self::new(EmbeddingModel::AllMiniLML12V2)
        }

        /// Load a model by its Hugging Face name
        pub fn from_name(name: &str) -> Result<Self, EmbeddingError> {
            let model = match name.trim_start_matches("sentence-transformers/") {
                "all-MiniLM-L12-v2" => EmbeddingModel::AllMiniLML12V2,
                "all-MiniLM-L6-v2" => EmbeddingModel::AllMiniLML6V2,
                other => {
                    return Err(EmbeddingError::ModelError(format!(
                        "unsupported model: {}",
                        other
                    )))
                }
            };
            Self::new(model)
        }
    }

    impl Embedder for FastEmbedEmbedder {
        fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let mut model = self
                .model
                .lock()
                .map_err(|e| EmbeddingError::ModelError(e.to_string()))?;
            let embeddings = model
                .embed(texts.to_vec(), None)
                .map_err(|e| EmbeddingError::ModelError(e.to_string()))?;
            if embeddings.is_empty() {
                return Err(EmbeddingError::EmptyResult);
            }
            Ok(embeddings)
        }
    }
}

#[cfg(feature = "embeddings")]
pub use fastembed_impl::FastEmbedEmbedder;
