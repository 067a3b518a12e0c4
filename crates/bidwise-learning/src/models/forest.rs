//! Random forest regressor.

use super::tree::{RegressionTree, TreeParams};
use super::{Regressor, check_fit_input, normalize};
use crate::error::{Result, RoiError};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Bagged regression trees.
///
/// Every tree is grown on a bootstrap sample of the rows and considers all
/// features at each split. Tree `t` draws its sample from a ChaCha8 stream
/// seeded with `seed + t`, so a fit is reproducible for a given seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
    trees: Vec<RegressionTree>,
    importances: Vec<f64>,
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize, max_depth: usize, min_samples_split: usize, seed: u64) -> Self {
        Self {
            n_estimators,
            max_depth,
            min_samples_split,
            seed,
            trees: Vec::new(),
            importances: Vec::new(),
        }
    }

    /// Number of fitted trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForestRegressor {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let n_samples = x.nrows();
        let n_features = x.ncols();
        let targets = y.to_vec();
        let params = TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: 1,
        };

        let mut importances = vec![0.0; n_features];
        let mut trees = Vec::with_capacity(self.n_estimators);
        for tree_idx in 0..self.n_estimators {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(tree_idx as u64));
            let sample: Vec<usize> = (0..n_samples)
                .map(|_| rng.gen_range(0..n_samples))
                .collect();

            let mut tree_importances = vec![0.0; n_features];
            trees.push(RegressionTree::fit(
                x,
                &targets,
                &sample,
                params,
                &mut tree_importances,
            ));
            normalize(&mut tree_importances);
            for (total, tree) in importances.iter_mut().zip(&tree_importances) {
                *total += tree;
            }
        }
        normalize(&mut importances);

        self.trees = trees;
        self.importances = importances;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(RoiError::NotTrained);
        }
        let n_trees = self.trees.len() as f64;
        Ok(x.rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(self.importances.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn step_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| if j == 0 { i as f64 } else { 1.0 });
        let y = Array1::from_shape_fn(40, |i| if i < 20 { 1.0 } else { 3.0 });
        (x, y)
    }

    #[test]
    fn test_fit_and_predict() {
        let (x, y) = step_data();
        let mut forest = RandomForestRegressor::new(10, 4, 2, 42);
        forest.fit(&x, &y).unwrap();

        assert_eq!(forest.n_trees(), 10);
        let preds = forest.predict(&x).unwrap();
        assert!(preds[0] < 1.5);
        assert!(preds[39] > 2.5);
    }

    #[test]
    fn test_same_seed_same_model() {
        let (x, y) = step_data();
        let mut a = RandomForestRegressor::new(5, 4, 2, 7);
        let mut b = RandomForestRegressor::new(5, 4, 2, 7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_importances_sum_to_one_on_informative_feature() {
        let (x, y) = step_data();
        let mut forest = RandomForestRegressor::new(5, 4, 2, 42);
        forest.fit(&x, &y).unwrap();
        let importances = forest.feature_importances().unwrap();
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(importances[1], 0.0);
    }

    #[test]
    fn test_predict_before_fit() {
        let forest = RandomForestRegressor::new(5, 4, 2, 42);
        let err = forest.predict(&Array2::zeros((1, 2))).unwrap_err();
        assert!(err.is_not_trained());
    }
}
