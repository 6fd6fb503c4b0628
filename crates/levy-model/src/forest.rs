//! Random-forest regression.
//!
//! Bagged CART trees grown to purity on bootstrap samples, every feature
//! considered at every split. All randomness flows from a single seed, so
//! identical data and parameters yield an identical forest.

use levy_core::cancel::CancelFlag;
use levy_core::dataset::FeatureMatrix;
use levy_core::stats;
use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::Regressor;
use crate::error::ModelError;

/// Fixed forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub seed: u64,
    pub min_samples_split: usize,
    pub max_depth: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            seed: 42,
            min_samples_split: 2,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub params: ForestParams,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    /// Grow `params.n_estimators` trees. `cancel` is checked before each tree.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidInput` for empty or mismatched input and
    /// `ModelError::Cancelled` if cancellation was requested.
    pub fn fit(
        x: &FeatureMatrix,
        y: &[f64],
        params: ForestParams,
        cancel: &CancelFlag,
    ) -> Result<Self, ModelError> {
        if x.nrows() == 0 {
            return Err(ModelError::InvalidInput("no training rows".into()));
        }
        if x.nrows() != y.len() {
            return Err(ModelError::InvalidInput(format!(
                "{} feature rows but {} targets",
                x.nrows(),
                y.len()
            )));
        }
        if params.n_estimators == 0 {
            return Err(ModelError::InvalidInput("n_estimators must be positive".into()));
        }

        let n = x.nrows();
        let mut master = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);

        for t in 0..params.n_estimators {
            if cancel.is_cancelled() {
                tracing::info!(trees_built = t, "forest training cancelled");
                return Err(ModelError::Cancelled);
            }
            let mut rng = StdRng::seed_from_u64(master.random::<u64>());
            let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
            trees.push(RegressionTree::grow(x.values(), y, sample, &params));
        }

        Ok(Self { params, trees })
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForest {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / self.trees.len() as f64
    }
}

struct Pending {
    node: usize,
    samples: Vec<usize>,
    depth: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    sse: f64,
}

impl RegressionTree {
    fn grow(x: &Array2<f64>, y: &[f64], samples: Vec<usize>, params: &ForestParams) -> Self {
        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut stack = vec![Pending {
            node: 0,
            samples,
            depth: 0,
        }];

        while let Some(Pending {
            node,
            samples,
            depth,
        }) = stack.pop()
        {
            let targets: Vec<f64> = samples.iter().map(|&i| y[i]).collect();
            let leaf = Node::Leaf {
                value: stats::mean(&targets),
            };

            let depth_exhausted = params.max_depth.is_some_and(|max| depth >= max);
            let pure = targets.windows(2).all(|w| w[0] == w[1]);
            if samples.len() < params.min_samples_split || depth_exhausted || pure {
                nodes[node] = leaf;
                continue;
            }

            let Some(split) = best_split(x, y, &samples) else {
                nodes[node] = leaf;
                continue;
            };

            let (left, right): (Vec<usize>, Vec<usize>) = samples
                .into_iter()
                .partition(|&i| x[[i, split.feature]] <= split.threshold);

            let left_id = nodes.len();
            nodes.push(Node::Leaf { value: 0.0 });
            let right_id = nodes.len();
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[node] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: left_id,
                right: right_id,
            };

            stack.push(Pending {
                node: right_id,
                samples: right,
                depth: depth + 1,
            });
            stack.push(Pending {
                node: left_id,
                samples: left,
                depth: depth + 1,
            });
        }

        Self { nodes }
    }

    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row.get(*feature).copied().unwrap_or(0.0) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Exhaustive search for the split minimizing summed squared error.
/// Returns `None` when every feature is constant over `samples`.
fn best_split(x: &Array2<f64>, y: &[f64], samples: &[usize]) -> Option<BestSplit> {
    let n_features = x.ncols();
    let total = samples.len();
    let mut best: Option<BestSplit> = None;
    let mut order = samples.to_vec();

    for feature in 0..n_features {
        order.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let total_sum: f64 = order.iter().map(|&i| y[i]).sum();
        let total_sq: f64 = order.iter().map(|&i| y[i] * y[i]).sum();
        let mut left_sum = 0.0;
        let mut left_sq = 0.0;

        for pos in 1..total {
            let prev = order[pos - 1];
            left_sum += y[prev];
            left_sq += y[prev] * y[prev];

            let lo = x[[prev, feature]];
            let hi = x[[order[pos], feature]];
            if lo >= hi {
                continue;
            }

            let n_left = pos as f64;
            let n_right = (total - pos) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum * left_sum / n_left)
                + (right_sq - right_sum * right_sum / n_right);

            if best.as_ref().is_none_or(|b| sse < b.sse) {
                best = Some(BestSplit {
                    feature,
                    threshold: lo + (hi - lo) / 2.0,
                    sse,
                });
            }
        }
    }

    best
}
