//! Shared helpers for thoughtnet integration tests
//!
//! Card fixtures written to temporary directories, plus deterministic
//! embedders that stand in for the model.

pub mod cards;
pub mod mock_embedder;

pub use cards::{card_corpus, write_collection, CardCorpus};
pub use mock_embedder::{random_vectors, MockEmbedder};
