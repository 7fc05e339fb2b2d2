//! Thoughtnet: concept maps for AI thought-network card collections
//!
//! Turns flattened card records into chart-ready aggregates and, for the
//! concepts they name, into a pruned cosine-similarity graph with cluster
//! assignments and a 2D projection.
//!
//! # Core Concepts
//!
//! - **Concepts**: unique card names, index-aligned with their embeddings
//! - **Similarity graph**: one node per concept, top-K edges above a threshold
//! - **Clusters / projection**: k-means ids and t-SNE points for display
//!
//! # Example
//!
//! ```
//! use thoughtnet::{build_similarity_graph, NoProgress, SimilarityGraphConfig};
//!
//! let concepts = vec!["travel".to_string(), "journey".to_string()];
//! let embeddings = vec![vec![0.9, 0.3, 0.1], vec![0.85, 0.35, 0.15]];
//! let graph = build_similarity_graph(
//!     &concepts,
//!     &embeddings,
//!     &SimilarityGraphConfig::default(),
//!     &NoProgress,
//! )
//! .unwrap();
//! assert_eq!(graph.node_count(), 2);
//! assert_eq!(graph.edge_count(), 1);
//! ```

pub mod aggregate;
pub mod cluster;
pub mod config;
pub mod embedding;
mod graph;
pub mod normalize;
pub mod pipeline;
pub mod search;
pub mod sentiment;
pub mod source;

pub use aggregate::{ChartData, ChartError, CountRow, Kpis, LinePoint, Record, Table};
pub use cluster::{ClusterAssignment, ClusterError, KMeans, KMeansConfig, Point2, Tsne, TsneConfig};
pub use config::{Config, ConfigError, SourceSpec};
#[cfg(feature = "embeddings")]
pub use embedding::FastEmbedEmbedder;
pub use embedding::{CachedEmbedder, Embedder, EmbeddingError, PrecomputedEmbedder};
pub use graph::{
    build_similarity_graph, ConceptNode, GraphError, GraphResult, GraphView, NoProgress,
    NodeRole, ProgressObserver, ProgressUpdate, SimilarityEdge, SimilarityGraph,
    SimilarityGraphConfig, SimilarityMatrix, Stage, ViewNode,
};
pub use pipeline::{ConceptMap, Dashboard, DashboardSummary, PipelineError, PipelineResult};
pub use search::{search_concepts, SearchMatch, SearchOutcome};
pub use sentiment::{SentimentError, TextClassifier, TextLabel};
#[cfg(feature = "mongo")]
pub use source::MongoSource;
pub use source::{load_cards, JsonFileSource, RecordSource, SourceError, SourceResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
