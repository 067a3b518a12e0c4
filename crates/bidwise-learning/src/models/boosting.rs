//! Least-squares gradient boosting.

use super::tree::{RegressionTree, TreeParams};
use super::{Regressor, check_fit_input, normalize};
use crate::error::{Result, RoiError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Gradient-boosted regression trees with squared-error loss.
///
/// Boosting starts from the target mean. Each round fits a tree to the
/// current residuals on every row and adds `learning_rate` times its output.
/// Fitting is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    initial_prediction: f64,
    trees: Vec<RegressionTree>,
    importances: Vec<f64>,
}

impl GradientBoostingRegressor {
    pub fn new(n_estimators: usize, max_depth: usize, learning_rate: f64) -> Self {
        Self {
            n_estimators,
            max_depth,
            learning_rate,
            initial_prediction: 0.0,
            trees: Vec::new(),
            importances: Vec::new(),
        }
    }

    /// Number of boosting rounds fitted.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for GradientBoostingRegressor {
    fn name(&self) -> &'static str {
        "gradient_boosting"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let n_samples = x.nrows();
        let rows: Vec<usize> = (0..n_samples).collect();
        let params = TreeParams {
            max_depth: self.max_depth,
            min_samples_split: 2,
            min_samples_leaf: 1,
        };

        let initial_prediction = y.mean().unwrap_or(0.0);
        let mut predictions = vec![initial_prediction; n_samples];
        let mut importances = vec![0.0; x.ncols()];
        let mut trees = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            let residuals: Vec<f64> = y
                .iter()
                .zip(&predictions)
                .map(|(yi, pi)| yi - pi)
                .collect();

            let tree = RegressionTree::fit(x, &residuals, &rows, params, &mut importances);
            for (pred, row) in predictions.iter_mut().zip(x.rows()) {
                *pred += self.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);
        }
        normalize(&mut importances);

        self.initial_prediction = initial_prediction;
        self.trees = trees;
        self.importances = importances;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(RoiError::NotTrained);
        }
        Ok(x.rows()
            .into_iter()
            .map(|row| {
                self.trees
                    .iter()
                    .fold(self.initial_prediction, |acc, tree| {
                        acc + self.learning_rate * tree.predict_row(row)
                    })
            })
            .collect())
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(self.importances.clone())
    }
}
