//! Regression tree used as the weak learner inside the boosted ensemble

use serde::{Deserialize, Serialize};

/// Tree growth limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth of the tree
    pub max_depth: usize,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples in a leaf node
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Feature index for split (None for leaves)
    pub feature_idx: Option<usize>,
    /// Threshold for split
    pub threshold: Option<f64>,
    /// Mean target value of the samples in this node
    pub value: f64,
    /// Left child (feature value <= threshold)
    pub left: Option<Box<TreeNode>>,
    /// Right child
    pub right: Option<Box<TreeNode>>,
}

impl TreeNode {
    fn leaf(value: f64) -> Self {
        Self {
            feature_idx: None,
            threshold: None,
            value,
            left: None,
            right: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Depth-limited regression tree with variance-reduction splits.
///
/// Split search sorts each feature once per node and walks candidate
/// thresholds with prefix sums, so a node costs O(features * n log n).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    params: TreeParams,
    root: Option<TreeNode>,
    importances: Vec<f64>,
}

const MIN_GAIN: f64 = 1e-12;

impl RegressionTree {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            root: None,
            importances: Vec::new(),
        }
    }

    /// Fit the tree to `targets` over the rows selected by `indices`.
    pub fn fit(&mut self, x: &[Vec<f64>], targets: &[f64], indices: &[usize]) {
        if indices.is_empty() || x.is_empty() {
            self.root = None;
            return;
        }

        let n_features = x[0].len();
        self.importances = vec![0.0; n_features];
        self.root = Some(self.build_node(x, targets, indices.to_vec(), 0));
    }

    fn build_node(
        &mut self,
        x: &[Vec<f64>],
        targets: &[f64],
        indices: Vec<usize>,
        depth: usize,
    ) -> TreeNode {
        let n = indices.len();
        let sum: f64 = indices.iter().map(|&i| targets[i]).sum();
        let mean = sum / n as f64;
        let sse: f64 = indices.iter().map(|&i| (targets[i] - mean).powi(2)).sum();

        if depth >= self.params.max_depth || n < self.params.min_samples_split || sse < MIN_GAIN {
            return TreeNode::leaf(mean);
        }

        let Some((feature_idx, threshold, gain)) = self.best_split(x, targets, &indices, sse)
        else {
            return TreeNode::leaf(mean);
        };

        self.importances[feature_idx] += gain;

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| x[i][feature_idx] <= threshold);

        let left = self.build_node(x, targets, left_idx, depth + 1);
        let right = self.build_node(x, targets, right_idx, depth + 1);

        TreeNode {
            feature_idx: Some(feature_idx),
            threshold: Some(threshold),
            value: mean,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    /// Best (feature, threshold, gain) by sum-of-squared-error reduction, or
    /// None when no split beats the parent.
    fn best_split(
        &self,
        x: &[Vec<f64>],
        targets: &[f64],
        indices: &[usize],
        parent_sse: f64,
    ) -> Option<(usize, f64, f64)> {
        let n = indices.len();
        let n_features = x[0].len();
        let min_leaf = self.params.min_samples_leaf.max(1);

        let mut best: Option<(usize, f64, f64)> = None;

        for feature_idx in 0..n_features {
            let mut ordered: Vec<(f64, f64)> = indices
                .iter()
                .map(|&i| (x[i][feature_idx], targets[i]))
                .collect();
            ordered.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let total_sum: f64 = ordered.iter().map(|(_, t)| t).sum();
            let total_sq: f64 = ordered.iter().map(|(_, t)| t * t).sum();

            let mut left_sum = 0.0;
            let mut left_sq = 0.0;

            for k in 1..n {
                let (value, target) = ordered[k - 1];
                left_sum += target;
                left_sq += target * target;

                // no threshold separates equal feature values
                if value == ordered[k].0 {
                    continue;
                }
                if k < min_leaf || n - k < min_leaf {
                    continue;
                }

                let left_n = k as f64;
                let right_n = (n - k) as f64;
                let left_sse = left_sq - left_sum * left_sum / left_n;
                let right_sum = total_sum - left_sum;
                let right_sse = (total_sq - left_sq) - right_sum * right_sum / right_n;

                let gain = parent_sse - left_sse - right_sse;
                if gain > MIN_GAIN && best.map_or(true, |(_, _, g)| gain > g) {
                    let threshold = (value + ordered[k].0) / 2.0;
                    best = Some((feature_idx, threshold, gain));
                }
            }
        }

        best
    }

    /// Predict the target for a single feature row.
    pub fn predict_one(&self, row: &[f64]) -> f64 {
        let Some(root) = &self.root else {
            return 0.0;
        };

        let mut node = root;
        while !node.is_leaf() {
            let feature_idx = match node.feature_idx {
                Some(idx) => idx,
                None => break,
            };
            let threshold = node.threshold.unwrap_or(0.0);

            node = if row[feature_idx] <= threshold {
                match &node.left {
                    Some(child) => child,
                    None => break,
                }
            } else {
                match &node.right {
                    Some(child) => child,
                    None => break,
                }
            };
        }

        node.value
    }

    /// Accumulated split gains per feature, in column order. Unnormalized.
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn is_fitted(&self) -> bool {
        self.root.is_some()
    }
}
