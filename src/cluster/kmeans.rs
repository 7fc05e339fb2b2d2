//! k-means with k-means++ seeding
//!
//! 1. Pick the first centroid uniformly, then each next one with probability
//!    proportional to its squared distance from the nearest chosen centroid.
//! 2. Assign every vector to its nearest centroid.
//! 3. Move each centroid to the mean of its members.
//! 4. Stop when no centroid moves more than `tolerance`, or after
//!    `max_iterations`.

use super::{common_dimension, squared_distance, ClusterError, ClusterResult};
use crate::graph::{checkpoint_interval, NoProgress, ProgressObserver, ProgressUpdate, Stage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    pub num_clusters: usize,
    pub max_iterations: usize,
    /// Largest centroid movement still counted as converged
    pub tolerance: f32,
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            num_clusters: 10,
            max_iterations: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

impl KMeansConfig {
    /// Default settings with `k` clusters
    pub fn with_clusters(k: usize) -> Self {
        Self {
            num_clusters: k,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> ClusterResult<()> {
        if self.num_clusters == 0 {
            return Err(ClusterError::ZeroClusters);
        }
        if self.max_iterations == 0 {
            return Err(ClusterError::InvalidParameter(
                "max_iterations must be > 0".to_string(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(ClusterError::InvalidParameter(
                "tolerance must be a finite, non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Cluster ids per vector, plus how the fit went
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    /// `labels[i]` is the cluster of vector `i`, in `[0, k)`
    pub labels: Vec<usize>,
    pub centroids: Vec<Vec<f32>>,
    pub iterations: usize,
    pub converged: bool,
    /// Sum of squared distances from each vector to its centroid
    pub inertia: f32,
}

impl ClusterAssignment {
    pub fn num_clusters(&self) -> usize {
        self.centroids.len()
    }

    /// Member indices of each cluster
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.centroids.len()];
        for (i, &label) in self.labels.iter().enumerate() {
            members[label].push(i);
        }
        members
    }
}

#[derive(Debug, Clone, Default)]
pub struct KMeans {
    config: KMeansConfig,
}

impl KMeans {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    pub fn fit(&self, vectors: &[Vec<f32>]) -> ClusterResult<ClusterAssignment> {
        self.fit_with_progress(vectors, &NoProgress)
    }

    /// Cluster the vectors, reporting once per checkpointed iteration
    pub fn fit_with_progress(
        &self,
        vectors: &[Vec<f32>],
        progress: &dyn ProgressObserver,
    ) -> ClusterResult<ClusterAssignment> {
        let config = &self.config;
        config.validate()?;
        if vectors.is_empty() {
            return Err(ClusterError::EmptyInput);
        }
        let n = vectors.len();
        let k = config.num_clusters;
        if k > n {
            return Err(ClusterError::TooManyClusters { k, n });
        }
        let dim = common_dimension(vectors)?;

        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut centroids = kmeans_plus_plus(vectors, k, &mut rng);
        let mut labels = vec![0usize; n];
        let mut iterations = 0;
        let mut converged = false;
        let interval = checkpoint_interval(config.max_iterations);

        for iter in 0..config.max_iterations {
            iterations = iter + 1;
            assign(vectors, &centroids, &mut labels);
            let updated = recompute(vectors, &labels, &centroids, dim);

            let max_movement = centroids
                .iter()
                .zip(updated.iter())
                .map(|(old, new)| squared_distance(old, new).sqrt())
                .fold(0.0f32, f32::max);
            centroids = updated;

            if iter % interval == 0 {
                progress.on_progress(&ProgressUpdate::new(
                    Stage::Clustering,
                    iterations as f32 / config.max_iterations as f32,
                ));
            }

            if max_movement <= config.tolerance {
                converged = true;
                debug!(iterations, max_movement, "k-means converged");
                break;
            }
        }

        // Labels must agree with the final centroids
        assign(vectors, &centroids, &mut labels);
        let inertia = labels
            .iter()
            .zip(vectors)
            .map(|(&label, v)| squared_distance(v, &centroids[label]))
            .sum();

        progress.on_progress(&ProgressUpdate::new(Stage::Clustering, 1.0));
        info!(k, n, iterations, converged, inertia, "k-means finished");

        Ok(ClusterAssignment {
            labels,
            centroids,
            iterations,
            converged,
            inertia,
        })
    }
}

fn kmeans_plus_plus(vectors: &[Vec<f32>], k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let n = vectors.len();
    let mut chosen = vec![rng.gen_range(0..n)];
    let mut min_distances = vec![f32::MAX; n];

    while chosen.len() < k {
        if let Some(&last) = chosen.last() {
            for (i, v) in vectors.iter().enumerate() {
                min_distances[i] = min_distances[i].min(squared_distance(v, &vectors[last]));
            }
        }

        let total: f64 = min_distances.iter().map(|&d| d as f64).sum();
        let next = if total <= 0.0 {
            // Every vector sits on a centroid; take the first unchosen index
            (0..n).find(|i| !chosen.contains(i)).unwrap_or(0)
        } else {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0f64;
            let mut pick = n - 1;
            for (i, &d) in min_distances.iter().enumerate() {
                cumulative += d as f64;
                if cumulative > target {
                    pick = i;
                    break;
                }
            }
            pick
        };
        chosen.push(next);
    }

    chosen.into_iter().map(|i| vectors[i].clone()).collect()
}

fn assign(vectors: &[Vec<f32>], centroids: &[Vec<f32>], labels: &mut [usize]) {
    for (label, v) in labels.iter_mut().zip(vectors) {
        let mut best = 0;
        let mut best_dist = f32::MAX;
        for (j, c) in centroids.iter().enumerate() {
            let d = squared_distance(v, c);
            if d < best_dist {
                best_dist = d;
                best = j;
            }
        }
        *label = best;
    }
}

/// Mean of each cluster's members; an empty cluster keeps its old centroid
fn recompute(
    vectors: &[Vec<f32>],
    labels: &[usize],
    previous: &[Vec<f32>],
    dim: usize,
) -> Vec<Vec<f32>> {
    let mut sums = vec![vec![0.0f32; dim]; previous.len()];
    let mut counts = vec![0usize; previous.len()];
    for (v, &label) in vectors.iter().zip(labels) {
        counts[label] += 1;
        for (s, x) in sums[label].iter_mut().zip(v) {
            *s += x;
        }
    }
    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((mut sum, count), old)| {
            if count == 0 {
                return old.clone();
            }
            for s in &mut sum {
                *s /= count as f32;
            }
            sum
        })
        .collect()
}
