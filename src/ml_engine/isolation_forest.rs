//! Isolation Forest
//!
//! Seeded, parallel implementation of Liu et al.'s isolation forest.
//!
//! ## Key Features
//! - Each tree draws its own sub-sample with an RNG derived from `seed + tree`
//!   so the fitted forest is identical across calls and thread counts
//! - Trees are grown on the rayon pool
//! - Cancellation and deadline are checked before each tree is grown
//! - Scores follow the `score_samples` convention: `-2^(-E[h(x)] / c(psi))`,
//!   lower is more anomalous

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Why a fit stopped before all trees were grown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FitInterrupted {
    #[error("fit cancelled")]
    Cancelled,
    #[error("fit deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_samples: usize,
    pub seed: u64,
}

#[derive(Debug)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn path_length(&self, row: &[f64], depth: usize) -> f64 {
        match self {
            Node::Leaf { size } => depth as f64 + average_path_length(*size),
            Node::Split {
                feature,
                value,
                left,
                right,
            } => {
                if row[*feature] < *value {
                    left.path_length(row, depth + 1)
                } else {
                    right.path_length(row, depth + 1)
                }
            }
        }
    }
}

/// A fitted forest.
#[derive(Debug)]
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    /// Grow the forest over row-major `data`.
    ///
    /// All rows must have the same width; callers pass a dense, finite matrix.
    pub fn fit(
        data: &[Vec<f64>],
        params: ForestParams,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Result<Self, FitInterrupted> {
        let sample_size = params.max_samples.min(data.len()).max(1);
        let height_limit = (sample_size as f64).log2().ceil().max(1.0) as usize;

        let trees = (0..params.n_trees)
            .into_par_iter()
            .map(|t| {
                if cancel.is_cancelled() {
                    return Err(FitInterrupted::Cancelled);
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    return Err(FitInterrupted::DeadlineExceeded);
                }
                let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(t as u64));
                let rows = index::sample(&mut rng, data.len(), sample_size).into_vec();
                Ok(grow(data, rows, 0, height_limit, &mut rng))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { trees, sample_size })
    }

    /// Anomaly score per row, in [-1, 0). Lower is more anomalous.
    pub fn score_samples(&self, data: &[Vec<f64>]) -> Vec<f64> {
        let norm = average_path_length(self.sample_size).max(f64::MIN_POSITIVE);
        let n_trees = self.trees.len().max(1) as f64;
        data.par_iter()
            .map(|row| {
                let mean_depth =
                    self.trees.iter().map(|t| t.path_length(row, 0)).sum::<f64>() / n_trees;
                -(2f64.powf(-mean_depth / norm))
            })
            .collect()
    }
}

fn grow(
    data: &[Vec<f64>],
    rows: Vec<usize>,
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= height_limit || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    let width = data.first().map_or(0, Vec::len);
    let ranges: Vec<(usize, f64, f64)> = (0..width)
        .filter_map(|f| {
            let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                (lo.min(data[r][f]), hi.max(data[r][f]))
            });
            (lo < hi).then_some((f, lo, hi))
        })
        .collect();

    // Every feature constant on this node: duplicates can't be separated
    if ranges.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    let (feature, lo, hi) = ranges[rng.gen_range(0..ranges.len())];
    let value = rng.gen_range(lo..hi);
    let (left, right): (Vec<usize>, Vec<usize>) =
        rows.into_iter().partition(|&r| data[r][feature] < value);

    Node::Split {
        feature,
        value,
        left: Box::new(grow(data, left, depth + 1, height_limit, rng)),
        right: Box::new(grow(data, right, depth + 1, height_limit, rng)),
    }
}

/// c(n): average path length of an unsuccessful BST search over n points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ForestParams {
        ForestParams {
            n_trees: 50,
            max_samples: 64,
            seed: 7,
        }
    }

    fn cluster_with_outlier() -> Vec<Vec<f64>> {
        let mut data: Vec<Vec<f64>> = (0..100)
            .map(|i| vec![(i % 10) as f64 * 0.1, (i / 10) as f64 * 0.1])
            .collect();
        data.push(vec![25.0, -30.0]);
        data
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        let c256 = average_path_length(256);
        assert!((c256 - 10.2448).abs() < 1e-3, "got {c256}");
    }

    #[test]
    fn test_outlier_scores_lowest() {
        let data = cluster_with_outlier();
        let forest = IsolationForest::fit(&data, params(), &CancellationToken::new(), None).unwrap();
        let scores = forest.score_samples(&data);
        let (min_idx, _) = scores
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert_eq!(min_idx, 100);
        assert!(scores.iter().all(|s| (-1.0..0.0).contains(s)));
    }

    #[test]
    fn test_deterministic_for_seed() {
        let data = cluster_with_outlier();
        let token = CancellationToken::new();
        let a = IsolationForest::fit(&data, params(), &token, None).unwrap().score_samples(&data);
        let b = IsolationForest::fit(&data, params(), &token, None).unwrap().score_samples(&data);
        assert_eq!(a, b);
    }

    #[test]
    fn test_cancelled_fit() {
        let token = CancellationToken::new();
        token.cancel();
        let err = IsolationForest::fit(&cluster_with_outlier(), params(), &token, None).unwrap_err();
        assert_eq!(err, FitInterrupted::Cancelled);
    }

    #[test]
    fn test_expired_deadline() {
        let err = IsolationForest::fit(
            &cluster_with_outlier(),
            params(),
            &CancellationToken::new(),
            Some(Instant::now()),
        )
        .unwrap_err();
        assert_eq!(err, FitInterrupted::DeadlineExceeded);
    }
}
