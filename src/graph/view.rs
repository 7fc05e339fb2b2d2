//! Display-ready views of a similarity graph
//!
//! A view picks which nodes to show and how to mark them; positions are
//! left to the renderer.

use super::edge::SimilarityEdge;
use super::similarity::{GraphError, GraphResult, SimilarityGraph};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

const HIGHLIGHT_SIZE: u32 = 15;
const DEFAULT_SIZE: u32 = 10;

/// How a node is marked in a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Default,
    Highlight,
    Neighbor,
}

/// A node as shown in a view; `index` refers to the full graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewNode {
    pub index: usize,
    pub label: String,
    pub role: NodeRole,
    pub size: u32,
    /// Degree in the full graph
    pub degree: usize,
}

/// A filtered, annotated slice of a similarity graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    pub title: String,
    pub nodes: Vec<ViewNode>,
    pub edges: Vec<SimilarityEdge>,
}

impl GraphView {
    /// The whole graph, or only its largest component when it has more than `limit` nodes
    pub fn overview(graph: &SimilarityGraph, limit: usize) -> Self {
        let keep: BTreeSet<usize> = if graph.node_count() > limit {
            graph.largest_component().into_iter().collect()
        } else {
            (0..graph.node_count()).collect()
        };

        let nodes = keep
            .iter()
            .map(|&i| view_node(graph, i, NodeRole::Default))
            .collect();

        Self {
            title: "Concept Similarity Graph".to_string(),
            nodes,
            edges: graph.induced_edges(&keep),
        }
    }

    /// A node and its direct neighbours
    pub fn focus(graph: &SimilarityGraph, node: usize) -> GraphResult<Self> {
        let label = graph.label(node).ok_or(GraphError::NodeOutOfRange {
            index: node,
            node_count: graph.node_count(),
        })?;

        let mut keep: BTreeSet<usize> = graph.neighbors(node).iter().copied().collect();
        keep.insert(node);

        let nodes = keep
            .iter()
            .map(|&i| {
                let role = if i == node {
                    NodeRole::Highlight
                } else {
                    NodeRole::Neighbor
                };
                view_node(graph, i, role)
            })
            .collect();

        Ok(Self {
            title: format!("Concept Similarity Graph - Highlighting: {}", label),
            nodes,
            edges: graph.induced_edges(&keep),
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

fn view_node(graph: &SimilarityGraph, index: usize, role: NodeRole) -> ViewNode {
    let size = match role {
        NodeRole::Highlight => HIGHLIGHT_SIZE,
        NodeRole::Default | NodeRole::Neighbor => DEFAULT_SIZE,
    };
    ViewNode {
        index,
        label: graph.label(index).unwrap_or_default().to_string(),
        role,
        size,
        degree: graph.degree(index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0-1-2 path, 3-4 pair, 5 isolated
    fn sample() -> SimilarityGraph {
        let mut g = SimilarityGraph::with_labels(["a", "b", "c", "d", "e", "f"]);
        g.add_edge(0, 1, 0.9).unwrap();
        g.add_edge(1, 2, 0.8).unwrap();
        g.add_edge(3, 4, 0.7).unwrap();
        g
    }

    #[test]
    fn overview_under_limit_keeps_everything() {
        let g = sample();
        let view = GraphView::overview(&g, 200);
        assert_eq!(view.node_count(), 6);
        assert_eq!(view.edge_count(), 3);
        assert!(view.nodes.iter().all(|n| n.role == NodeRole::Default && n.size == 10));
    }

    #[test]
    fn overview_over_limit_keeps_largest_component() {
        let g = sample();
        let view = GraphView::overview(&g, 4);
        let indices: Vec<usize> = view.nodes.iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(view.edge_count(), 2);
    }

    #[test]
    fn focus_marks_highlight_and_neighbors() {
        let g = sample();
        let view = GraphView::focus(&g, 1).unwrap();
        assert_eq!(view.title, "Concept Similarity Graph - Highlighting: b");
        assert_eq!(view.node_count(), 3);
        assert_eq!(view.edge_count(), 2);

        let b = view.nodes.iter().find(|n| n.index == 1).unwrap();
        assert_eq!(b.role, NodeRole::Highlight);
        assert_eq!(b.size, 15);
        assert!(view
            .nodes
            .iter()
            .filter(|n| n.index != 1)
            .all(|n| n.role == NodeRole::Neighbor && n.size == 10));
    }

    #[test]
    fn focus_on_isolated_node() {
        let g = sample();
        let view = GraphView::focus(&g, 5).unwrap();
        assert_eq!(view.node_count(), 1);
        assert_eq!(view.edge_count(), 0);
    }

    #[test]
    fn focus_on_unknown_node_fails() {
        let g = sample();
        assert!(matches!(
            GraphView::focus(&g, 9),
            Err(GraphError::NodeOutOfRange { index: 9, .. })
        ));
    }

    #[test]
    fn view_serializes_roles_lowercase() {
        let g = sample();
        let json = serde_json::to_value(GraphView::focus(&g, 0).unwrap()).unwrap();
        assert_eq!(json["nodes"][0]["role"], "highlight");
        assert_eq!(json["edges"][0]["source"], 0);
    }
}
