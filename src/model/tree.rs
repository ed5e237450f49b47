//! Depth-limited regression trees
//!
//! Greedy variance-reduction CART used as the weak learner for boosting.
//! Leaf outputs are soft-thresholded by the L1 term so small residual means
//! shrink to zero.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Split-search parameters for one tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// L1 regularization applied to leaf outputs.
    pub alpha: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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

/// A fitted regression tree stored as a flat node arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Fit a tree to the given targets (the boosting residuals).
    pub fn fit(x: &Array2<f64>, targets: &[f64], params: &TreeParams) -> Self {
        let mut nodes = Vec::new();
        let indices: Vec<usize> = (0..x.nrows()).collect();
        build_node(x, targets, indices, 0, params, &mut nodes);
        RegressionTree { nodes }
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
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
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn build_node(
    x: &Array2<f64>,
    targets: &[f64],
    indices: Vec<usize>,
    depth: usize,
    params: &TreeParams,
    nodes: &mut Vec<Node>,
) -> usize {
    let mean = indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len().max(1) as f64;

    if depth >= params.max_depth || indices.len() < 2 * params.min_samples_leaf {
        return push_leaf(nodes, mean, params.alpha);
    }

    match best_split(x, targets, &indices, params.min_samples_leaf) {
        None => push_leaf(nodes, mean, params.alpha),
        Some((feature, threshold)) => {
            let (left_set, right_set): (Vec<usize>, Vec<usize>) = indices
                .into_iter()
                .partition(|&i| x[[i, feature]] <= threshold);

            let idx = nodes.len();
            nodes.push(Node::Leaf { value: 0.0 }); // placeholder until children exist
            let left = build_node(x, targets, left_set, depth + 1, params, nodes);
            let right = build_node(x, targets, right_set, depth + 1, params, nodes);
            nodes[idx] = Node::Split {
                feature,
                threshold,
                left,
                right,
            };
            idx
        }
    }
}

fn push_leaf(nodes: &mut Vec<Node>, mean: f64, alpha: f64) -> usize {
    let value = soft_threshold(mean, alpha);
    nodes.push(Node::Leaf { value });
    nodes.len() - 1
}

/// L1 shrinkage: pull the leaf mean toward zero by alpha.
fn soft_threshold(value: f64, alpha: f64) -> f64 {
    value.signum() * (value.abs() - alpha).max(0.0)
}

/// Find the (feature, threshold) with the largest sum-of-squares reduction,
/// honoring the minimum leaf size. Returns None when no split improves.
fn best_split(
    x: &Array2<f64>,
    targets: &[f64],
    indices: &[usize],
    min_samples_leaf: usize,
) -> Option<(usize, f64)> {
    let n = indices.len();
    let total_sum: f64 = indices.iter().map(|&i| targets[i]).sum();
    let baseline = total_sum * total_sum / n as f64;

    let mut best: Option<(usize, f64, f64)> = None; // (feature, threshold, gain)

    for feature in 0..x.ncols() {
        let mut pairs: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (x[[i, feature]], targets[i]))
            .collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_sum = 0.0;
        for (split, pair) in pairs.iter().enumerate().take(n.saturating_sub(1)) {
            left_sum += pair.1;
            let left_n = split + 1;
            let right_n = n - left_n;
            if left_n < min_samples_leaf || right_n < min_samples_leaf {
                continue;
            }
            // No threshold separates equal values.
            if pairs[split].0 == pairs[split + 1].0 {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let gain = left_sum * left_sum / left_n as f64
                + right_sum * right_sum / right_n as f64
                - baseline;
            if gain > 1e-12 && best.map(|(_, _, g)| gain > g).unwrap_or(true) {
                let threshold = (pairs[split].0 + pairs[split + 1].0) / 2.0;
                best = Some((feature, threshold, gain));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn params(max_depth: usize) -> TreeParams {
        TreeParams {
            max_depth,
            min_samples_leaf: 1,
            alpha: 0.0,
        }
    }

    #[test]
    fn test_single_split_separates_groups() {
        let x = array![[1.0], [2.0], [10.0], [11.0]];
        let y = [5.0, 5.0, 20.0, 20.0];
        let tree = RegressionTree::fit(&x, &y, &params(2));

        assert_eq!(tree.predict_row(x.row(0)), 5.0);
        assert_eq!(tree.predict_row(x.row(3)), 20.0);
    }

    #[test]
    fn test_constant_targets_give_single_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = [4.0, 4.0, 4.0];
        let tree = RegressionTree::fit(&x, &y, &params(3));
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_row(x.row(1)), 4.0);
    }

    #[test]
    fn test_depth_zero_is_mean_leaf() {
        let x = array![[1.0], [2.0]];
        let y = [2.0, 4.0];
        let tree = RegressionTree::fit(&x, &y, &params(0));
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_row(x.row(0)), 3.0);
    }

    #[test]
    fn test_soft_threshold_shrinks_leaves() {
        assert_eq!(soft_threshold(5.0, 1.0), 4.0);
        assert_eq!(soft_threshold(-5.0, 1.0), -4.0);
        assert_eq!(soft_threshold(0.5, 1.0), 0.0);
    }

    #[test]
    fn test_min_samples_leaf_blocks_tiny_splits() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [1.0, 1.0, 1.0, 10.0];
        let tree = RegressionTree::fit(
            &x,
            &y,
            &TreeParams {
                max_depth: 3,
                min_samples_leaf: 2,
                alpha: 0.0,
            },
        );
        // The outlier cannot be isolated; both leaves hold two samples.
        let p = tree.predict_row(x.row(3));
        assert!(p < 10.0);
    }
}
