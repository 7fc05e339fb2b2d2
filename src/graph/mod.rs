//! Concept similarity graph: construction, progress reporting and views

mod builder;
mod edge;
mod node;
mod progress;
mod similarity;
mod view;


pub use builder::{build_similarity_graph, SimilarityGraphConfig, SimilarityMatrix};
pub use edge::SimilarityEdge;
pub use node::ConceptNode;
pub use progress::{NoProgress, ProgressObserver, ProgressUpdate, Stage};
pub use similarity::{GraphError, GraphResult, SimilarityGraph};
pub use view::{GraphView, NodeRole, ViewNode};

pub(crate) use progress::checkpoint_interval;
