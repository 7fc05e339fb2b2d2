//! Properties of the similarity graph over seeded random embeddings

mod common;

use common::random_vectors;
use std::collections::HashSet;
use thoughtnet::{
    build_similarity_graph, NoProgress, SimilarityGraph, SimilarityGraphConfig, SimilarityMatrix,
};

fn labels(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("concept-{}", i)).collect()
}

fn build(n: usize, seed: u64, threshold: f32, max_edges: usize) -> SimilarityGraph {
    let embeddings = random_vectors(n, 8, seed);
    build_similarity_graph(
        &labels(n),
        &embeddings,
        &SimilarityGraphConfig::new(threshold, max_edges),
        &NoProgress,
    )
    .expect("Failed to build graph")
}

#[test]
fn every_concept_is_a_node() {
    for n in [2, 5, 40, 120] {
        let graph = build(n, n as u64, 0.3, 50);
        assert_eq!(graph.node_count(), n);
        for (i, node) in graph.nodes().iter().enumerate() {
            assert_eq!(node.index, i);
            assert_eq!(node.label, format!("concept-{}", i));
        }
    }
}

#[test]
fn edges_respect_cap_and_threshold() {
    for (seed, threshold, max_edges) in [(1, 0.0, 25), (2, 0.4, 10_000), (3, -0.5, 100), (4, 0.8, 3)] {
        let graph = build(60, seed, threshold, max_edges);
        assert!(graph.edge_count() <= max_edges);
        assert!(graph.edges().iter().all(|e| e.weight > threshold));
    }
}

#[test]
fn edge_count_is_min_of_cap_and_candidates() {
    let embeddings = random_vectors(50, 8, 7);
    let candidates = SimilarityMatrix::cosine(&embeddings)
        .unwrap()
        .pairs_above(0.2)
        .len();
    assert!(candidates > 0);

    for max_edges in [0, 1, candidates / 2, candidates, candidates + 10] {
        let graph = build_similarity_graph(
            &labels(50),
            &embeddings,
            &SimilarityGraphConfig::new(0.2, max_edges),
            &NoProgress,
        )
        .unwrap();
        assert_eq!(graph.edge_count(), max_edges.min(candidates));
    }
}

#[test]
fn weights_never_increase_in_insertion_order() {
    let graph = build(80, 11, 0.1, 500);
    let weights: Vec<f32> = graph.edges().iter().map(|e| e.weight).collect();
    assert!(weights.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn truncated_edges_are_the_strongest() {
    let full = build(70, 5, 0.0, usize::MAX);
    let capped = build(70, 5, 0.0, 40);
    let weakest_kept = capped.edges().last().map(|e| e.weight).unwrap();
    let kept: HashSet<(usize, usize)> = capped.edges().iter().map(|e| e.key()).collect();
    for e in full.edges() {
        if !kept.contains(&e.key()) {
            assert!(e.weight <= weakest_kept);
        }
    }
}

#[test]
fn graph_is_simple_and_undirected() {
    let graph = build(60, 9, 0.0, 1000);
    let mut seen = HashSet::new();
    for e in graph.edges() {
        assert!(e.source < e.target, "edge {:?} not canonical", e);
        assert!(seen.insert(e.key()), "duplicate edge {:?}", e);
        assert!(graph.neighbors(e.source).contains(&e.target));
        assert!(graph.neighbors(e.target).contains(&e.source));
    }
}

#[test]
fn construction_is_deterministic() {
    let a = build(90, 21, 0.25, 300);
    let b = build(90, 21, 0.25, 300);
    assert_eq!(a.edges(), b.edges());
}

#[test]
fn matrix_is_symmetric_with_unit_diagonal() {
    let embeddings = random_vectors(20, 8, 3);
    let matrix = SimilarityMatrix::cosine(&embeddings).unwrap();
    for i in 0..20 {
        assert!((matrix.get(i, i).unwrap() - 1.0).abs() < 1e-5);
        for j in 0..20 {
            assert_eq!(matrix.get(i, j), matrix.get(j, i));
        }
    }
}

#[test]
fn components_partition_the_nodes() {
    let graph = build(100, 13, 0.6, 10_000);
    let components = graph.connected_components();
    let total: usize = components.iter().map(Vec::len).sum();
    assert_eq!(total, 100);
    let largest = graph.largest_component();
    assert!(components.iter().all(|c| c.len() <= largest.len()));
}

#[test]
fn graph_roundtrips_through_json() {
    let graph = build(30, 17, 0.3, 60);
    let json = serde_json::to_string(&graph).unwrap();
    let restored: SimilarityGraph = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.node_count(), graph.node_count());
    assert_eq!(restored.edges(), graph.edges());
}
