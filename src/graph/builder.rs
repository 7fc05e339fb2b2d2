//! Similarity graph construction
//!
//! Builds the concept graph in one pass: all pairwise cosine similarities,
//! keep pairs strictly above the threshold, sort them by score (stable, so
//! ties stay in `(i, j)` enumeration order) and add the first `max_edges`.
//! The quadratic candidate list is transient; only the capped edge set
//! survives into the graph.

use super::progress::{checkpoint_interval, NoProgress, ProgressObserver, ProgressUpdate, Stage};
use super::similarity::{GraphError, GraphResult, SimilarityGraph};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Progress share given to the similarity matrix; edge insertion gets the rest
const MATRIX_SHARE: f32 = 0.9;

/// Thresholding and pruning policy for the similarity graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityGraphConfig {
    /// Pairs must score strictly above this to become candidates
    pub threshold: f32,
    /// Upper bound on the number of edges kept
    pub max_edges: usize,
}

impl Default for SimilarityGraphConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            max_edges: 10_000,
        }
    }
}

impl SimilarityGraphConfig {
    pub fn new(threshold: f32, max_edges: usize) -> Self {
        Self {
            threshold,
            max_edges,
        }
    }
}

/// Symmetric N×N cosine similarity matrix, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute all pairwise cosine similarities
    pub fn cosine(embeddings: &[Vec<f32>]) -> GraphResult<Self> {
        Self::cosine_with_progress(embeddings, &NoProgress, 1.0)
    }

    /// Like `cosine`, reporting row checkpoints scaled into `[0, share]`
    fn cosine_with_progress(
        embeddings: &[Vec<f32>],
        progress: &dyn ProgressObserver,
        share: f32,
    ) -> GraphResult<Self> {
        let n = embeddings.len();
        let dim = check_dimensions(embeddings)?;

        // Unit-normalise once; zero vectors stay zero and score 0 against everything
        let unit: Vec<Vec<f32>> = embeddings.iter().map(|v| normalized(v)).collect();

        let mut values = vec![0.0f32; n * n];
        let interval = checkpoint_interval(n);
        for i in 0..n {
            for j in i..n {
                let dot: f32 = (0..dim).map(|d| unit[i][d] * unit[j][d]).sum();
                values[i * n + j] = dot;
                values[j * n + i] = dot;
            }
            if i % interval == 0 {
                progress.on_progress(
                    &ProgressUpdate::new(Stage::ComputingSimilarity, share * i as f32 / n as f32)
                        .with_message(format!("compared {} of {} concepts", i, n)),
                );
            }
        }

        Ok(Self { n, values })
    }

    /// Number of rows (and columns)
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Similarity between concepts `i` and `j`
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i < self.n && j < self.n {
            Some(self.values[i * self.n + j])
        } else {
            None
        }
    }

    /// All pairs `i < j` scoring strictly above `threshold`, in enumeration order
    pub fn pairs_above(&self, threshold: f32) -> Vec<(usize, usize, f32)> {
        let mut pairs = Vec::new();
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                let score = self.values[i * self.n + j];
                if score > threshold {
                    pairs.push((i, j, score));
                }
            }
        }
        pairs
    }
}

/// Build the pruned similarity graph for `concepts` and their `embeddings`.
///
/// Every concept becomes a node, isolated or not. At most
/// `config.max_edges` edges are added, highest weight first, and none with
/// weight `<= config.threshold`.
pub fn build_similarity_graph(
    concepts: &[String],
    embeddings: &[Vec<f32>],
    config: &SimilarityGraphConfig,
    progress: &dyn ProgressObserver,
) -> GraphResult<SimilarityGraph> {
    if concepts.len() != embeddings.len() {
        return Err(GraphError::LengthMismatch {
            concepts: concepts.len(),
            embeddings: embeddings.len(),
        });
    }

    let mut graph = SimilarityGraph::with_labels(concepts.iter().cloned());

    let matrix = SimilarityMatrix::cosine_with_progress(embeddings, progress, MATRIX_SHARE)?;
    let mut candidates = matrix.pairs_above(config.threshold);
    let total_candidates = candidates.len();

    // Stable: equal scores keep (i ascending, j ascending) order
    candidates.sort_by(|a, b| b.2.total_cmp(&a.2));
    candidates.truncate(config.max_edges);

    progress.on_progress(
        &ProgressUpdate::new(Stage::AddingEdges, MATRIX_SHARE).with_message(format!(
            "found {} candidate edges, adding top {}",
            total_candidates,
            candidates.len()
        )),
    );
    debug!(
        candidates = total_candidates,
        kept = candidates.len(),
        threshold = config.threshold,
        "similarity candidates filtered"
    );

    let kept = candidates.len();
    let interval = checkpoint_interval(kept);
    for (idx, (i, j, score)) in candidates.into_iter().enumerate() {
        graph.add_edge(i, j, score)?;
        if idx % interval == 0 {
            let done = (1.0 - MATRIX_SHARE) * idx as f32 / kept as f32;
            progress.on_progress(&ProgressUpdate::new(Stage::AddingEdges, MATRIX_SHARE + done));
        }
    }

    progress.on_progress(&ProgressUpdate::new(Stage::Done, 1.0));
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "built similarity graph"
    );

    Ok(graph)
}

/// Shared dimensionality of the embeddings (0 when there are none)
fn check_dimensions(embeddings: &[Vec<f32>]) -> GraphResult<usize> {
    let expected = embeddings.first().map_or(0, Vec::len);
    for (index, v) in embeddings.iter().enumerate() {
        if v.len() != expected {
            return Err(GraphError::DimensionMismatch {
                index,
                expected,
                actual: v.len(),
            });
        }
    }
    Ok(expected)
}

fn normalized(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vec![0.0; v.len()];
    }
    v.iter().map(|x| x / norm).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("concept-{}", i)).collect()
    }

    // travel/journey/voyage point the same way, democracy is nearly orthogonal
    fn travel_vectors() -> (Vec<String>, Vec<Vec<f32>>) {
        let concepts = vec![
            "travel".to_string(),
            "journey".to_string(),
            "voyage".to_string(),
            "democracy".to_string(),
        ];
        let embeddings = vec![
            vec![0.9, 0.3, 0.1],
            vec![0.85, 0.35, 0.15],
            vec![0.88, 0.32, 0.12],
            vec![0.1, 0.2, 0.95],
        ];
        (concepts, embeddings)
    }

    #[test]
    fn cosine_matrix_is_symmetric_with_unit_diagonal() {
        let (_, embeddings) = travel_vectors();
        let m = SimilarityMatrix::cosine(&embeddings).unwrap();
        assert_eq!(m.len(), 4);
        for i in 0..4 {
            assert!((m.get(i, i).unwrap() - 1.0).abs() < 1e-5);
            for j in 0..4 {
                assert_eq!(m.get(i, j), m.get(j, i));
            }
        }
        assert!(m.get(4, 0).is_none());
    }

    #[test]
    fn cosine_known_values() {
        let embeddings = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0], vec![0.0, 0.0]];
        let m = SimilarityMatrix::cosine(&embeddings).unwrap();
        assert!(m.get(0, 1).unwrap().abs() < 1e-6, "orthogonal");
        assert!((m.get(0, 2).unwrap() + 1.0).abs() < 1e-6, "opposite");
        assert_eq!(m.get(0, 3).unwrap(), 0.0, "zero vector");
    }

    #[test]
    fn builds_edges_above_threshold_only() {
        let (concepts, embeddings) = travel_vectors();
        let graph = build_similarity_graph(
            &concepts,
            &embeddings,
            &SimilarityGraphConfig::new(0.7, 100),
            &NoProgress,
        )
        .unwrap();

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 3, "travel, journey and voyage form a triangle");
        assert_eq!(graph.degree(3), 0, "democracy stays isolated");
        assert!(graph.edges().iter().all(|e| e.weight > 0.7));
    }

    #[test]
    fn edges_are_inserted_in_descending_weight() {
        let (concepts, embeddings) = travel_vectors();
        let graph = build_similarity_graph(
            &concepts,
            &embeddings,
            &SimilarityGraphConfig::new(-1.0, 100),
            &NoProgress,
        )
        .unwrap();
        assert_eq!(graph.edge_count(), 6);
        for pair in graph.edges().windows(2) {
            assert!(pair[0].weight >= pair[1].weight);
        }
    }

    #[test]
    fn max_edges_keeps_the_strongest() {
        let (concepts, embeddings) = travel_vectors();
        let full = build_similarity_graph(
            &concepts,
            &embeddings,
            &SimilarityGraphConfig::new(0.0, 100),
            &NoProgress,
        )
        .unwrap();
        let capped = build_similarity_graph(
            &concepts,
            &embeddings,
            &SimilarityGraphConfig::new(0.0, 2),
            &NoProgress,
        )
        .unwrap();

        assert_eq!(capped.edge_count(), 2);
        assert_eq!(capped.edges(), &full.edges()[..2]);
    }

    #[test]
    fn ties_keep_enumeration_order() {
        // Identical vectors: every pair scores 1.0
        let embeddings = vec![vec![1.0, 1.0]; 4];
        let graph = build_similarity_graph(
            &labels(4),
            &embeddings,
            &SimilarityGraphConfig::new(0.5, 3),
            &NoProgress,
        )
        .unwrap();
        let keys: Vec<_> = graph.edges().iter().map(|e| e.key()).collect();
        assert_eq!(keys, vec![(0, 1), (0, 2), (0, 3)]);
    }

    #[test]
    fn threshold_of_one_yields_no_edges() {
        let embeddings = vec![vec![1.0, 0.0]; 3];
        let graph = build_similarity_graph(
            &labels(3),
            &embeddings,
            &SimilarityGraphConfig::new(1.0, 10),
            &NoProgress,
        )
        .unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn empty_and_single_inputs() {
        let config = SimilarityGraphConfig::default();
        let empty = build_similarity_graph(&[], &[], &config, &NoProgress).unwrap();
        assert_eq!(empty.node_count(), 0);
        assert_eq!(empty.edge_count(), 0);

        let single =
            build_similarity_graph(&labels(1), &[vec![0.3, 0.4]], &config, &NoProgress).unwrap();
        assert_eq!(single.node_count(), 1);
        assert_eq!(single.edge_count(), 0);
    }

    #[test]
    fn zero_max_edges_keeps_nodes_only() {
        let (concepts, embeddings) = travel_vectors();
        let graph = build_similarity_graph(
            &concepts,
            &embeddings,
            &SimilarityGraphConfig::new(0.0, 0),
            &NoProgress,
        )
        .unwrap();
        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn rejects_length_mismatch() {
        let result = build_similarity_graph(
            &labels(2),
            &[vec![1.0]],
            &SimilarityGraphConfig::default(),
            &NoProgress,
        );
        assert!(matches!(
            result,
            Err(GraphError::LengthMismatch { concepts: 2, embeddings: 1 })
        ));
    }

    #[test]
    fn rejects_ragged_embeddings() {
        let result = build_similarity_graph(
            &labels(2),
            &[vec![1.0, 0.0], vec![1.0]],
            &SimilarityGraphConfig::default(),
            &NoProgress,
        );
        assert!(matches!(
            result,
            Err(GraphError::DimensionMismatch { index: 1, expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn progress_is_monotonic_and_finishes() {
        let (concepts, embeddings) = travel_vectors();
        let seen = RefCell::new(Vec::new());
        let observer = |u: &ProgressUpdate| seen.borrow_mut().push((u.stage, u.fraction));
        build_similarity_graph(
            &concepts,
            &embeddings,
            &SimilarityGraphConfig::new(0.0, 10),
            &observer,
        )
        .unwrap();

        let seen = seen.into_inner();
        assert!(!seen.is_empty());
        for pair in seen.windows(2) {
            assert!(pair[0].1 <= pair[1].1, "progress went backwards: {:?}", pair);
        }
        assert_eq!(seen.last(), Some(&(Stage::Done, 1.0)));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: SimilarityGraphConfig = serde_json::from_str(r#"{"threshold": 0.7}"#).unwrap();
        assert_eq!(config.threshold, 0.7);
        assert_eq!(config.max_edges, 10_000);
    }
}
