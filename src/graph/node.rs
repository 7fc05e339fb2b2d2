//! Concept nodes in the similarity graph

use serde::{Deserialize, Serialize};

/// A concept in the similarity graph.
///
/// The index is the node identifier: it is the concept's position in the
/// concept list and the row of its embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptNode {
    /// Position in the concept list
    pub index: usize,
    /// Display name of the concept
    pub label: String,
}

impl ConceptNode {
    /// Create a new node
    pub fn new(index: usize, label: impl Into<String>) -> Self {
        Self {
            index,
            label: label.into(),
        }
    }
}

impl std::fmt::Display for ConceptNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.index, self.label)
    }
}
