//! Exact t-SNE projection to two dimensions
//!
//! Affinities come from a per-point binary search on the Gaussian precision
//! so each conditional distribution has the requested perplexity. The
//! layout is then fitted by gradient descent with early exaggeration,
//! momentum and per-coordinate gains. Cost is O(N²) per iteration, which is
//! fine at dashboard sizes.

use super::{common_dimension, squared_distance, ClusterError, ClusterResult};
use crate::graph::{checkpoint_interval, NoProgress, ProgressObserver, ProgressUpdate, Stage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const EXAGGERATION_ITERATIONS: usize = 250;
const INITIAL_MOMENTUM: f64 = 0.5;
const FINAL_MOMENTUM: f64 = 0.8;
const MIN_GAIN: f64 = 0.01;
const BINARY_SEARCH_STEPS: usize = 50;
const ENTROPY_TOLERANCE: f64 = 1e-5;
const MIN_PROBABILITY: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TsneConfig {
    pub perplexity: f64,
    /// Gradient step; `None` picks `max(N / early_exaggeration / 4, 50)`
    pub learning_rate: Option<f64>,
    pub max_iterations: usize,
    pub early_exaggeration: f64,
    pub seed: u64,
}

impl Default for TsneConfig {
    fn default() -> Self {
        Self {
            perplexity: 10.0,
            learning_rate: None,
            max_iterations: 1000,
            early_exaggeration: 12.0,
            seed: 42,
        }
    }
}

impl TsneConfig {
    /// The step size used for `n` points
    pub fn learning_rate_for(&self, n: usize) -> f64 {
        self.learning_rate
            .unwrap_or_else(|| (n as f64 / self.early_exaggeration / 4.0).max(50.0))
    }
}

/// A projected point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default)]
pub struct Tsne {
    config: TsneConfig,
}

impl Tsne {
    pub fn new(config: TsneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TsneConfig {
        &self.config
    }

    pub fn project(&self, vectors: &[Vec<f32>]) -> ClusterResult<Vec<Point2>> {
        self.project_with_progress(vectors, &NoProgress)
    }

    /// Project every vector to a point; `result[i]` belongs to `vectors[i]`
    pub fn project_with_progress(
        &self,
        vectors: &[Vec<f32>],
        progress: &dyn ProgressObserver,
    ) -> ClusterResult<Vec<Point2>> {
        let config = &self.config;
        let n = vectors.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        if !(config.perplexity > 0.0) {
            return Err(ClusterError::InvalidParameter(
                "perplexity must be > 0".to_string(),
            ));
        }
        if config.perplexity >= n as f64 {
            return Err(ClusterError::PerplexityTooLarge {
                perplexity: config.perplexity,
                n,
            });
        }
        if config.max_iterations == 0 {
            return Err(ClusterError::InvalidParameter(
                "max_iterations must be > 0".to_string(),
            ));
        }
        common_dimension(vectors)?;

        let p = joint_probabilities(vectors, config.perplexity);
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut y: Vec<[f64; 2]> = (0..n)
            .map(|_| [1e-4_f64.sqrt() * gaussian(&mut rng), 1e-4_f64.sqrt() * gaussian(&mut rng)])
            .collect();
        let mut update = vec![[0.0f64; 2]; n];
        let mut gains = vec![[1.0f64; 2]; n];
        let mut grad = vec![[0.0f64; 2]; n];
        let mut num = vec![0.0f64; n * n];
        let interval = checkpoint_interval(config.max_iterations);
        let learning_rate = config.learning_rate_for(n);

        for iter in 0..config.max_iterations {
            let early = iter < EXAGGERATION_ITERATIONS;
            let exaggeration = if early { config.early_exaggeration } else { 1.0 };
            let momentum = if early { INITIAL_MOMENTUM } else { FINAL_MOMENTUM };

            // Student-t kernel between current positions
            let mut sum_num = 0.0;
            for i in 0..n {
                num[i * n + i] = 0.0;
                for j in (i + 1)..n {
                    let dx = y[i][0] - y[j][0];
                    let dy = y[i][1] - y[j][1];
                    let q = 1.0 / (1.0 + dx * dx + dy * dy);
                    num[i * n + j] = q;
                    num[j * n + i] = q;
                    sum_num += 2.0 * q;
                }
            }
            let sum_num = sum_num.max(MIN_PROBABILITY);

            for i in 0..n {
                let mut g = [0.0f64; 2];
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let q = (num[i * n + j] / sum_num).max(MIN_PROBABILITY);
                    let mult = (exaggeration * p[i * n + j] - q) * num[i * n + j];
                    g[0] += mult * (y[i][0] - y[j][0]);
                    g[1] += mult * (y[i][1] - y[j][1]);
                }
                grad[i] = [4.0 * g[0], 4.0 * g[1]];
            }

            for i in 0..n {
                for d in 0..2 {
                    let same_sign = (grad[i][d] > 0.0) == (update[i][d] > 0.0);
                    gains[i][d] = if same_sign {
                        gains[i][d] * 0.8
                    } else {
                        gains[i][d] + 0.2
                    }
                    .max(MIN_GAIN);
                    update[i][d] =
                        momentum * update[i][d] - learning_rate * gains[i][d] * grad[i][d];
                    y[i][d] += update[i][d];
                }
            }
            center(&mut y);

            if iter % interval == 0 {
                progress.on_progress(&ProgressUpdate::new(
                    Stage::Projecting,
                    (iter + 1) as f32 / config.max_iterations as f32,
                ));
            }
        }

        debug!(kl = kl_divergence(&p, &y), "t-SNE final cost");
        progress.on_progress(&ProgressUpdate::new(Stage::Projecting, 1.0));
        info!(n, iterations = config.max_iterations, "t-SNE projection finished");

        Ok(y.into_iter()
            .map(|[x, y]| Point2 {
                x: x as f32,
                y: y as f32,
            })
            .collect())
    }
}

/// Symmetrised joint probabilities `(P(j|i) + P(i|j)) / 2n`, row-major
fn joint_probabilities(vectors: &[Vec<f32>], perplexity: f64) -> Vec<f64> {
    let n = vectors.len();
    let mut distances = vec![0.0f64; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = squared_distance(&vectors[i], &vectors[j]) as f64;
            distances[i * n + j] = d;
            distances[j * n + i] = d;
        }
    }

    let target_entropy = perplexity.ln();
    let mut conditional = vec![0.0f64; n * n];
    for i in 0..n {
        let row = &distances[i * n..(i + 1) * n];
        let out = &mut conditional[i * n..(i + 1) * n];
        conditional_row(row, i, target_entropy, out);
    }

    let mut joint = vec![0.0f64; n * n];
    let scale = 2.0 * n as f64;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                joint[i * n + j] =
                    ((conditional[i * n + j] + conditional[j * n + i]) / scale).max(MIN_PROBABILITY);
            }
        }
    }
    joint
}

/// Gaussian conditional distribution of row `i` whose entropy matches `target_entropy`
fn conditional_row(distances: &[f64], i: usize, target_entropy: f64, out: &mut [f64]) {
    // Shift by the nearest neighbour so exp() does not underflow for far points
    let nearest = distances
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != i)
        .map(|(_, &d)| d)
        .fold(f64::INFINITY, f64::min);

    let mut beta = 1.0f64;
    let mut beta_min = f64::NEG_INFINITY;
    let mut beta_max = f64::INFINITY;

    for _ in 0..BINARY_SEARCH_STEPS {
        let mut sum = 0.0;
        let mut weighted = 0.0;
        for (j, &d) in distances.iter().enumerate() {
            if j == i {
                out[j] = 0.0;
                continue;
            }
            let shifted = d - nearest;
            let p = (-shifted * beta).exp();
            out[j] = p;
            sum += p;
            weighted += shifted * p;
        }
        let entropy = sum.ln() + beta * weighted / sum;
        for p in out.iter_mut() {
            *p /= sum;
        }

        let diff = entropy - target_entropy;
        if diff.abs() < ENTROPY_TOLERANCE {
            break;
        }
        if diff > 0.0 {
            beta_min = beta;
            beta = if beta_max.is_finite() {
                (beta + beta_max) / 2.0
            } else {
                beta * 2.0
            };
        } else {
            beta_max = beta;
            beta = if beta_min.is_finite() {
                (beta + beta_min) / 2.0
            } else {
                beta / 2.0
            };
        }
    }
}

/// Standard normal sample (Box-Muller)
fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn center(y: &mut [[f64; 2]]) {
    let n = y.len() as f64;
    let mean_x = y.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_y = y.iter().map(|p| p[1]).sum::<f64>() / n;
    for p in y.iter_mut() {
        p[0] -= mean_x;
        p[1] -= mean_y;
    }
}

fn kl_divergence(p: &[f64], y: &[[f64; 2]]) -> f64 {
    let n = y.len();
    let mut sum_num = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let dx = y[i][0] - y[j][0];
                let dy = y[i][1] - y[j][1];
                sum_num += 1.0 / (1.0 + dx * dx + dy * dy);
            }
        }
    }
    let mut kl = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                let dx = y[i][0] - y[j][0];
                let dy = y[i][1] - y[j][1];
                let q = (1.0 / (1.0 + dx * dx + dy * dy) / sum_num).max(MIN_PROBABILITY);
                let pij = p[i * n + j];
                kl += pij * (pij / q).ln();
            }
        }
    }
    kl
}
