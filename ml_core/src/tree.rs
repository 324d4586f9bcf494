use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::{MlError, Regressor, Result};

/// Variance below which a node is considered pure.
const PURITY_EPS: f64 = 1e-12;

/// A node of a fitted regression tree.
///
/// Nodes are stored in a flat arena and reference their children by index,
/// which keeps deep trees cheap to (de)serialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Leaf {
        value: f64,
        samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A CART regression tree using the squared error criterion.
///
/// Samples with `x[feature] <= threshold` go left. Leaves predict the mean of
/// their training targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    n_features: Option<usize>,
    nodes: Vec<Node>,
}

/// A node waiting to be grown.
struct Pending {
    node: usize,
    samples: Vec<usize>,
    depth: usize,
}

/// The best split found for a node.
struct Split {
    feature: usize,
    threshold: f64,
    score: f64,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeRegressor {
    /// Creates a new unfitted tree with unlimited depth.
    pub fn new() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            n_features: None,
            nodes: Vec::new(),
        }
    }

    /// Sets the maximum depth of the tree (the root has depth 0).
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the minimum samples needed to split a node (at least 2).
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Sets the minimum samples each leaf must keep (at least 1).
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Returns the fitted nodes; the root is the first one.
    #[cfg(test)]
    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the depth of the fitted tree, 0 for a single leaf.
    #[cfg(test)]
    fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = Vec::new();
        if !self.nodes.is_empty() {
            stack.push((0, 0));
        }

        while let Some((idx, depth)) = stack.pop() {
            max = max.max(depth);
            if let Node::Split { left, right, .. } = self.nodes[idx] {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }

        max
    }

    /// Fits the tree on a subset of the rows of `x`.
    ///
    /// Repeated indices are allowed, which is how bootstrap samples are fed.
    ///
    /// # Args
    /// * `x` - The full feature matrix.
    /// * `y` - The full target vector.
    /// * `samples` - The row indices to train on.
    ///
    /// # Errors
    /// Returns `MlError` if the shapes disagree or `samples` is empty.
    pub fn fit_samples(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        samples: Vec<usize>,
    ) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(MlError::ShapeMismatch {
                what: "targets",
                got: y.len(),
                expected: x.nrows(),
            });
        }
        if samples.is_empty() {
            return Err(MlError::InvalidInput("cannot fit a tree on zero samples"));
        }
        if x.ncols() == 0 {
            return Err(MlError::InvalidInput("cannot fit a tree on zero features"));
        }

        self.nodes.clear();
        self.nodes.push(Node::Leaf {
            value: 0.0,
            samples: 0,
        });

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
            let (sum, sum_sq) = sums(y, &samples);
            let n = samples.len() as f64;
            let value = sum / n;
            let variance = sum_sq / n - value * value;

            let can_split = samples.len() >= self.min_samples_split
                && samples.len() >= 2 * self.min_samples_leaf
                && self.max_depth.is_none_or(|max| depth < max)
                && variance > PURITY_EPS;

            let split = if can_split {
                self.best_split(x, y, &samples, sum)
            } else {
                None
            };

            let Some(Split {
                feature, threshold, ..
            }) = split
            else {
                self.nodes[node] = Node::Leaf {
                    value,
                    samples: samples.len(),
                };
                continue;
            };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
                .into_iter()
                .partition(|&i| x[[i, feature]] <= threshold);

            let left = self.push_placeholder();
            let right = self.push_placeholder();
            self.nodes[node] = Node::Split {
                feature,
                threshold,
                left,
                right,
            };

            stack.push(Pending {
                node: right,
                samples: right_samples,
                depth: depth + 1,
            });
            stack.push(Pending {
                node: left,
                samples: left_samples,
                depth: depth + 1,
            });
        }

        self.n_features = Some(x.ncols());
        Ok(())
    }

    /// Predicts the value of a single row.
    ///
    /// # Errors
    /// Returns `MlError::NotFitted` before a successful fit.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> Result<f64> {
        if self.nodes.is_empty() {
            return Err(MlError::NotFitted("decision tree"));
        }

        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value, .. } => return Ok(value),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    fn push_placeholder(&mut self) -> usize {
        self.nodes.push(Node::Leaf {
            value: 0.0,
            samples: 0,
        });
        self.nodes.len() - 1
    }

    /// Finds the split with the largest squared error reduction.
    ///
    /// Minimizing the children's squared error is equivalent to maximizing
    /// `sum_l² / n_l + sum_r² / n_r`, which only needs running sums.
    fn best_split(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        samples: &[usize],
        total: f64,
    ) -> Option<Split> {
        let n = samples.len();
        let parent_score = total * total / n as f64;
        let min_leaf = self.min_samples_leaf;
        let mut best: Option<Split> = None;
        let mut sorted = samples.to_vec();

        for feature in 0..x.ncols() {
            sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

            let mut left_sum = 0.0;
            for k in 1..n {
                left_sum += y[sorted[k - 1]];

                let lo = x[[sorted[k - 1], feature]];
                let hi = x[[sorted[k], feature]];
                if lo == hi || k < min_leaf || n - k < min_leaf {
                    continue;
                }

                let right_sum = total - left_sum;
                let score =
                    left_sum * left_sum / k as f64 + right_sum * right_sum / (n - k) as f64;

                if score <= parent_score + PURITY_EPS {
                    continue;
                }
                if best.as_ref().is_some_and(|b| score <= b.score) {
                    continue;
                }

                let mut threshold = lo + (hi - lo) / 2.0;
                if threshold >= hi {
                    threshold = lo;
                }

                best = Some(Split {
                    feature,
                    threshold,
                    score,
                });
            }
        }

        best
    }
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        let samples = (0..x.nrows()).collect();
        self.fit_samples(x, y, samples)
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let expected = self.n_features.ok_or(MlError::NotFitted("decision tree"))?;
        if x.ncols() != expected {
            return Err(MlError::ShapeMismatch {
                what: "tree features",
                got: x.ncols(),
                expected,
            });
        }

        x.rows().into_iter().map(|row| self.predict_row(row)).collect()
    }

    fn n_features_in(&self) -> Option<usize> {
        self.n_features
    }
}

/// Returns the sum and the sum of squares of `y` over `samples`.
fn sums(y: ArrayView1<f64>, samples: &[usize]) -> (f64, f64) {
    samples.iter().fold((0.0, 0.0), |(s, sq), &i| {
        let v = y[i];
        (s + v, sq + v * v)
    })
}
