//! SMOTE

use crate::error::{FraudError, Result};
use crate::synthetic::{class_counts, class_indices, ResampleResult, Sampler};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use tracing::{debug, info};

/// Ordered float for BinaryHeap-based partial sort; ties break on index
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(Ordering::Equal)
            .then(self.1.cmp(&other.1))
    }
}

/// SMOTE (Synthetic Minority Over-sampling Technique)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SMOTE {
    /// Number of nearest neighbors
    k_neighbors: usize,
    /// Random seed
    seed: u64,
    /// Target samples per class
    target_counts: Option<BTreeMap<i64, usize>>,
}

impl SMOTE {
    /// Create new SMOTE sampler with 5 neighbors and seed 42
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            seed: 42,
            target_counts: None,
        }
    }

    /// Set number of neighbors
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn k_neighbors(&self) -> usize {
        self.k_neighbors
    }

    fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(ai, bi)| (ai - bi).powi(2)).sum()
    }

    /// k nearest neighbors of `samples[i]` within `samples`, nearest first.
    /// Self is excluded by position, so duplicate rows still count as neighbors.
    fn nearest_neighbors(samples: &Array2<f64>, i: usize, k: usize) -> Vec<usize> {
        let point = samples.row(i);
        let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);

        for (j, other) in samples.axis_iter(Axis(0)).enumerate() {
            if j == i {
                continue;
            }
            let candidate = DistIdx(Self::squared_distance(point, other), j);
            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(worst) = heap.peek() {
                if candidate < *worst {
                    heap.pop();
                    heap.push(candidate);
                }
            }
        }

        heap.into_sorted_vec().into_iter().map(|DistIdx(_, j)| j).collect()
    }
}

impl Default for SMOTE {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for SMOTE {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(FraudError::Shape {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let counts = class_counts(y);
        if counts.len() < 2 {
            return Err(FraudError::DegenerateClasses(format!(
                "SMOTE needs at least 2 classes, found {}",
                counts.len()
            )));
        }

        let max_count = counts.values().copied().max().unwrap_or(0);
        for (&class, &count) in &counts {
            if count < max_count && count < 2 {
                return Err(FraudError::DegenerateClasses(format!(
                    "class {} has {} sample(s); at least 2 are needed to interpolate",
                    class, count
                )));
            }
        }

        self.target_counts = Some(counts.keys().map(|&class| (class, max_count)).collect());
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let targets = self
            .target_counts
            .as_ref()
            .ok_or(FraudError::ModelNotFitted)?;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let indices = class_indices(y);
        let n_features = x.ncols();

        let mut synthetic_x: Vec<f64> = Vec::new();
        let mut synthetic_y: Vec<i64> = Vec::new();
        let mut n_synthetic = BTreeMap::new();

        for (&class, &target_count) in targets {
            let class_idx = indices.get(&class).map(Vec::as_slice).unwrap_or(&[]);
            let n_to_generate = target_count.saturating_sub(class_idx.len());
            n_synthetic.insert(class, n_to_generate);

            if n_to_generate == 0 {
                continue;
            }
            if class_idx.len() < 2 {
                return Err(FraudError::DegenerateClasses(format!(
                    "class {} has {} sample(s); at least 2 are needed to interpolate",
                    class,
                    class_idx.len()
                )));
            }

            let class_samples = x.select(Axis(0), class_idx);
            let k = self.k_neighbors.min(class_samples.nrows() - 1);
            let neighbors: Vec<Vec<usize>> = (0..class_samples.nrows())
                .map(|i| Self::nearest_neighbors(&class_samples, i, k))
                .collect();

            debug!(class, k, n_to_generate, "Generating synthetic samples");

            synthetic_x.reserve(n_to_generate * n_features);
            for _ in 0..n_to_generate {
                let idx = rng.gen_range(0..class_samples.nrows());
                let nn = neighbors[idx][rng.gen_range(0..neighbors[idx].len())];
                let gap: f64 = rng.gen();

                let sample = class_samples.row(idx);
                let neighbor = class_samples.row(nn);
                synthetic_x.extend(
                    sample
                        .iter()
                        .zip(neighbor.iter())
                        .map(|(&p, &n)| p + gap * (n - p)),
                );
                synthetic_y.push(class);
            }
        }

        let n_new = synthetic_y.len();
        let synthetic = Array2::from_shape_vec((n_new, n_features), synthetic_x)?;
        let x_out = ndarray::concatenate(Axis(0), &[x.view(), synthetic.view()])?;
        let mut y_out = y.to_vec();
        y_out.extend(synthetic_y);

        info!(
            original = x.nrows(),
            synthetic = n_new,
            total = x_out.nrows(),
            "Resampled with SMOTE"
        );

        Ok(ResampleResult {
            x: x_out,
            y: Array1::from_vec(y_out),
            n_synthetic,
        })
    }
}
