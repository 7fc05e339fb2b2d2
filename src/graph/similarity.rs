//! SimilarityGraph: concepts joined by their strongest cosine similarities

use super::edge::SimilarityEdge;
use super::node::ConceptNode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use thiserror::Error;

/// Errors that can occur while building or editing a similarity graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("got {concepts} concepts but {embeddings} embeddings")]
    LengthMismatch { concepts: usize, embeddings: usize },

    #[error("embedding {index} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("node {index} out of range for graph with {node_count} nodes")]
    NodeOutOfRange { index: usize, node_count: usize },

    #[error("self-loop on node {0}")]
    SelfLoop(usize),

    #[error("duplicate edge ({0}, {1})")]
    DuplicateEdge(usize, usize),
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// An undirected, simple, weighted graph over a fixed concept list.
///
/// Every concept is a node, isolated or not. Edges are kept in insertion
/// order, which for built graphs is descending weight.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "GraphData", try_from = "GraphData")]
pub struct SimilarityGraph {
    nodes: Vec<ConceptNode>,
    edges: Vec<SimilarityEdge>,
    adjacency: Vec<Vec<usize>>,
    edge_keys: HashSet<(usize, usize)>,
}

/// Wire shape: nodes and edges only, adjacency is rebuilt on load
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphData {
    nodes: Vec<ConceptNode>,
    edges: Vec<SimilarityEdge>,
}

impl From<SimilarityGraph> for GraphData {
    fn from(graph: SimilarityGraph) -> Self {
        Self {
            nodes: graph.nodes,
            edges: graph.edges,
        }
    }
}

impl TryFrom<GraphData> for SimilarityGraph {
    type Error = GraphError;

    fn try_from(data: GraphData) -> GraphResult<Self> {
        let mut graph = SimilarityGraph::with_labels(data.nodes.into_iter().map(|n| n.label));
        for edge in data.edges {
            graph.add_edge(edge.source, edge.target, edge.weight)?;
        }
        Ok(graph)
    }
}

impl SimilarityGraph {
    /// Create an edgeless graph with one node per label, indexed in order
    pub fn with_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let nodes: Vec<ConceptNode> = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| ConceptNode::new(i, label))
            .collect();
        let adjacency = vec![Vec::new(); nodes.len()];
        Self {
            nodes,
            edges: Vec::new(),
            adjacency,
            edge_keys: HashSet::new(),
        }
    }

    /// Add an undirected edge.
    ///
    /// Rejects self-loops, unknown nodes and pairs that are already joined.
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f32) -> GraphResult<()> {
        let node_count = self.nodes.len();
        for index in [a, b] {
            if index >= node_count {
                return Err(GraphError::NodeOutOfRange { index, node_count });
            }
        }
        if a == b {
            return Err(GraphError::SelfLoop(a));
        }
        let edge = SimilarityEdge::new(a, b, weight);
        if !self.edge_keys.insert(edge.key()) {
            return Err(GraphError::DuplicateEdge(edge.source, edge.target));
        }
        self.adjacency[edge.source].push(edge.target);
        self.adjacency[edge.target].push(edge.source);
        self.edges.push(edge);
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[ConceptNode] {
        &self.nodes
    }

    /// Edges in insertion order
    pub fn edges(&self) -> &[SimilarityEdge] {
        &self.edges
    }

    /// Label of a node, if it exists
    pub fn label(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).map(|n| n.label.as_str())
    }

    /// Neighbours of a node in edge insertion order (empty for unknown nodes)
    pub fn neighbors(&self, index: usize) -> &[usize] {
        self.adjacency.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn degree(&self, index: usize) -> usize {
        self.neighbors(index).len()
    }

    /// Whether the two nodes are joined by an edge
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.edge_keys.contains(&key)
    }

    /// Connected components, each sorted ascending, ordered by their lowest node
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.nodes.len()];
        let mut components = Vec::new();

        for start in 0..self.nodes.len() {
            if seen[start] {
                continue;
            }
            seen[start] = true;
            let mut component = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(node) = queue.pop_front() {
                for &next in &self.adjacency[node] {
                    if !seen[next] {
                        seen[next] = true;
                        component.push(next);
                        queue.push_back(next);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }

        components
    }

    /// The largest connected component; ties go to the one with the lowest node
    pub fn largest_component(&self) -> Vec<usize> {
        let mut best: Vec<usize> = Vec::new();
        for component in self.connected_components() {
            if component.len() > best.len() {
                best = component;
            }
        }
        best
    }

    /// Edges whose endpoints both lie in `keep`, in insertion order
    pub fn induced_edges(&self, keep: &BTreeSet<usize>) -> Vec<SimilarityEdge> {
        self.edges
            .iter()
            .filter(|e| keep.contains(&e.source) && keep.contains(&e.target))
            .copied()
            .collect()
    }
}
