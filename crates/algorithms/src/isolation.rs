//! Seeded isolation forest over a 1D value distribution
//!
//! Unsupervised outlier labeling for the flattened asymmetry map. The
//! scorer sees only the value distribution, never the image shape: spatial
//! adjacency plays no part. Scoring follows Liu, Ting and Zhou (2008):
//! an ensemble of randomly built binary partition trees, where points that
//! isolate in few splits score high.
//!
//! All randomness derives from a caller-supplied seed, so identical input
//! and seed always produce identical labels.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;
use sarchange_core::{Error, Result};

/// Euler-Mascheroni constant, for the average unsuccessful BST search depth.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Relative spread below which a distribution is treated as constant.
/// Splitting inside numerical noise isolates nothing meaningful, so a
/// near-constant distribution produces no anomalies at all.
const SPREAD_TOLERANCE: f64 = 1e-9;

/// Labels statistical outliers in a flat value vector.
///
/// The pipeline only depends on this trait, so tests can substitute a
/// deterministic stub for the stochastic forest.
pub trait AnomalyScorer {
    /// Fit on `values` and return one label per entry, `true` = anomalous.
    ///
    /// `contamination` is the expected anomalous fraction, strictly inside
    /// (0, 1). NaN entries are permitted; they must never be labeled
    /// anomalous. The returned vector has the same length as `values`.
    fn fit_and_label(&self, values: &[f64], contamination: f64) -> Result<Vec<bool>>;
}

/// Parameters of the isolation forest ensemble.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Subsample size per tree (capped at the number of finite values)
    pub max_samples: usize,
    /// Seed for subsampling and split selection
    pub seed: u64,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            seed: 0,
        }
    }
}

impl IsolationForest {
    /// Default ensemble with a specific seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

/// One node of an isolation tree over scalar values.
enum Node {
    Split {
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

/// Average path length of an unsuccessful search in a BST of `n` nodes.
/// Normalizes path lengths so scores are comparable across subsample sizes.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let nf = n as f64;
            2.0 * ((nf - 1.0).ln() + EULER_GAMMA) - 2.0 * (nf - 1.0) / nf
        }
    }
}

fn build_tree(values: &mut [f64], depth: usize, depth_limit: usize, rng: &mut StdRng) -> Node {
    if values.len() <= 1 || depth >= depth_limit {
        return Node::Leaf {
            size: values.len(),
        };
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values.iter() {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min < max) {
        // All duplicates: nothing left to isolate.
        return Node::Leaf {
            size: values.len(),
        };
    }

    let threshold = rng.random_range(min..max);

    // Partition in place: values below the threshold go left.
    let mut split = 0;
    for i in 0..values.len() {
        if values[i] < threshold {
            values.swap(i, split);
            split += 1;
        }
    }

    let (lower, upper) = values.split_at_mut(split);
    let left = build_tree(lower, depth + 1, depth_limit, rng);
    let right = build_tree(upper, depth + 1, depth_limit, rng);

    Node::Split {
        threshold,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn path_length(mut node: &Node, value: f64) -> f64 {
    let mut depth = 0.0;
    loop {
        match node {
            Node::Leaf { size } => return depth + average_path_length(*size),
            Node::Split {
                threshold,
                left,
                right,
            } => {
                node = if value < *threshold { &**left } else { &**right };
                depth += 1.0;
            }
        }
    }
}

impl IsolationForest {
    /// Anomaly score in [0, 1] for each finite value; higher = more isolated.
    fn score(&self, finite: &[f64], queries: &[f64]) -> Vec<f64> {
        let sample_size = self.max_samples.min(finite.len());
        let normalizer = average_path_length(sample_size);
        if sample_size < 2 || normalizer <= 0.0 {
            return vec![0.5; queries.len()];
        }

        let depth_limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let trees: Vec<Node> = (0..self.n_trees)
            .map(|_| {
                let mut subsample: Vec<f64> = if finite.len() > sample_size {
                    rand::seq::index::sample(&mut rng, finite.len(), sample_size)
                        .iter()
                        .map(|i| finite[i])
                        .collect()
                } else {
                    finite.to_vec()
                };
                // Each tree gets its own stream so scoring order never
                // depends on how trees interleave their draws.
                let mut tree_rng = StdRng::seed_from_u64(rng.next_u64());
                build_tree(&mut subsample, 0, depth_limit, &mut tree_rng)
            })
            .collect();

        let n_trees = trees.len() as f64;
        queries
            .par_iter()
            .map(|&v| {
                let mean_path: f64 =
                    trees.iter().map(|t| path_length(t, v)).sum::<f64>() / n_trees;
                2.0_f64.powf(-mean_path / normalizer)
            })
            .collect()
    }
}

impl AnomalyScorer for IsolationForest {
    fn fit_and_label(&self, values: &[f64], contamination: f64) -> Result<Vec<bool>> {
        if !(0.0 < contamination && contamination < 1.0) {
            return Err(Error::InvalidParameter {
                name: "contamination",
                value: contamination.to_string(),
                reason: "must lie strictly between 0 and 1".into(),
            });
        }
        if values.is_empty() {
            return Err(Error::EmptyInput("fit_and_label"));
        }
        if self.n_trees == 0 {
            return Err(Error::InvalidParameter {
                name: "n_trees",
                value: "0".into(),
                reason: "ensemble needs at least one tree".into(),
            });
        }

        // Non-finite entries never fit and are never anomalous: NaN marks a
        // missing pixel, +inf marks a cell where neither image had local
        // power (no evidence of change either way).
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();

        let mut labels = vec![false; values.len()];
        if finite.is_empty() {
            return Ok(labels);
        }

        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let scale = 1.0_f64.max(min.abs()).max(max.abs());
        if max - min <= SPREAD_TOLERANCE * scale {
            // Constant distribution: no outliers by definition.
            return Ok(labels);
        }

        let scores = self.score(&finite, &finite);

        let mut sorted = scores.clone();
        sorted.sort_by(f64::total_cmp);
        let threshold = quantile(&sorted, 1.0 - contamination);

        let mut finite_idx = 0;
        for (label, &v) in labels.iter_mut().zip(values.iter()) {
            if v.is_finite() {
                *label = scores[finite_idx] > threshold;
                finite_idx += 1;
            }
        }

        Ok(labels)
    }
}

/// Linear-interpolation quantile of an ascending-sorted slice, `q` in [0, 1].
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = pos - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}
