//! CART regression tree used by both ensembles.
//!
//! Splits minimise the summed squared error of the two children. Candidate
//! thresholds are the midpoints between consecutive distinct feature values,
//! scanned in sorted order with running sums so each feature costs one sort.

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
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

/// Tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64 },
    /// Internal node; rows with `x[feature] <= threshold` go left
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// A fitted regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    root: TreeNode,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

struct Builder<'a> {
    x: &'a Array2<f64>,
    y: &'a [f64],
    params: TreeParams,
    importances: &'a mut [f64],
}

impl RegressionTree {
    /// Grow a tree on the rows of `x` listed in `rows` (repeats allowed).
    ///
    /// The squared-error reduction of every split is added to
    /// `importances[feature]`.
    pub fn fit(
        x: &Array2<f64>,
        y: &[f64],
        rows: &[usize],
        params: TreeParams,
        importances: &mut [f64],
    ) -> Self {
        let mut builder = Builder {
            x,
            y,
            params,
            importances,
        };
        Self {
            root: builder.grow(rows.to_vec(), 0),
        }
    }

    /// Predict a single row.
    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Depth of the deepest leaf (a lone leaf has depth 0).
    pub fn depth(&self) -> usize {
        fn walk(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }
}

impl Builder<'_> {
    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> TreeNode {
        let n = rows.len();
        let (sum, sum_sq) = rows.iter().fold((0.0, 0.0), |(s, sq), &i| {
            let v = self.y[i];
            (s + v, sq + v * v)
        });
        let value = if n == 0 { 0.0 } else { sum / n as f64 };
        let sse = sum_sq - sum * sum / n.max(1) as f64;

        if n < self.params.min_samples_split
            || n < 2 * self.params.min_samples_leaf
            || depth >= self.params.max_depth
            || sse <= 1e-12
        {
            return TreeNode::Leaf { value };
        }

        match self.best_split(&rows, sum) {
            Some(split) => {
                self.importances[split.feature] += split.gain;
                let left = Box::new(self.grow(split.left, depth + 1));
                let right = Box::new(self.grow(split.right, depth + 1));
                TreeNode::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left,
                    right,
                }
            }
            None => TreeNode::Leaf { value },
        }
    }

    fn best_split(&self, rows: &[usize], total: f64) -> Option<SplitCandidate> {
        let n = rows.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let mut best: Option<(usize, f64, f64)> = None;
        let mut sorted = rows.to_vec();

        for feature in 0..self.x.ncols() {
            sorted.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));

            let mut left_sum = 0.0;
            for pos in 1..n {
                left_sum += self.y[sorted[pos - 1]];
                let lo = self.x[[sorted[pos - 1], feature]];
                let hi = self.x[[sorted[pos], feature]];
                if lo == hi || pos < min_leaf || n - pos < min_leaf {
                    continue;
                }

                let right_sum = total - left_sum;
                // Minimising child SSE is maximising this score.
                let score = left_sum * left_sum / pos as f64
                    + right_sum * right_sum / (n - pos) as f64;
                if best.is_none_or(|(_, _, s)| score > s) {
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some((feature, threshold, score));
                }
            }
        }

        let (feature, threshold, score) = best?;
        let gain = score - total * total / n as f64;
        if gain <= 1e-12 {
            return None;
        }

        let (left, right): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&i| self.x[[i, feature]] <= threshold);
        Some(SplitCandidate {
            feature,
            threshold,
            gain,
            left,
            right,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn fit(x: &Array2<f64>, y: &[f64], params: TreeParams) -> (RegressionTree, Vec<f64>) {
        let rows: Vec<usize> = (0..y.len()).collect();
        let mut importances = vec![0.0; x.ncols()];
        let tree = RegressionTree::fit(x, y, &rows, params, &mut importances);
        (tree, importances)
    }

    #[test]
    fn test_step_function_is_learned_exactly() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = [0.0, 0.0, 0.0, 5.0, 5.0, 5.0];
        let (tree, importances) = fit(&x, &y, TreeParams::default());

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_row(x.row(0)), 0.0);
        assert_eq!(tree.predict_row(x.row(5)), 5.0);
        assert_eq!(tree.predict_row(array![6.4].view()), 0.0);
        assert_eq!(tree.predict_row(array![6.6].view()), 5.0);
        // Parent SSE: 6 * 2.5^2 = 37.5, children are pure.
        assert!((importances[0] - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_uninformative_feature_gets_no_importance() {
        let x = array![[1.0, 7.0], [2.0, 7.0], [3.0, 7.0], [4.0, 7.0]];
        let y = [1.0, 1.0, 3.0, 3.0];
        let (_, importances) = fit(&x, &y, TreeParams::default());
        assert!(importances[0] > 0.0);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_depth_limit() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let params = TreeParams {
            max_depth: 2,
            ..TreeParams::default()
        };
        let (tree, _) = fit(&x, &y, params);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_min_samples_split_stops_growth() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = [1.0, 2.0, 3.0, 4.0];
        let params = TreeParams {
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 1,
        };
        let (tree, _) = fit(&x, &y, params);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict_row(x.row(0)), 2.5);
    }

    #[test]
    fn test_constant_target_is_a_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = [4.0, 4.0, 4.0];
        let (tree, importances) = fit(&x, &y, TreeParams::default());
        assert_eq!(tree.depth(), 0);
        assert_eq!(importances, vec![0.0]);
    }
}
