//! Regression model families.
//!
//! Every family implements [`Regressor`], the capability interface the
//! predictor selects over. [`RegressionModel`] is the closed, serializable
//! sum of the families and is what a model bundle stores.
//!
//! | Family | Type | Importances |
//! |--------|------|-------------|
//! | `random_forest` | [`RandomForestRegressor`] | mean normalised impurity decrease |
//! | `gradient_boosting` | [`GradientBoostingRegressor`] | normalised impurity decrease |
//! | `ridge` | [`RidgeRegressor`] | none |

mod boosting;
mod forest;
mod linear;
pub mod tree;

pub use boosting::GradientBoostingRegressor;
pub use forest::RandomForestRegressor;
pub use linear::RidgeRegressor;

use crate::config::ModelSpec;
use crate::error::{Result, RoiError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A regression model that can be fitted and queried.
pub trait Regressor {
    /// Model family name.
    fn name(&self) -> &'static str;

    /// Fit on the rows of `x` against `y`, replacing any earlier fit.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// One prediction per row of `x`, in row order.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Per-feature importance scores in column order, or `None` if the
    /// family has no such notion.
    fn feature_importances(&self) -> Option<Vec<f64>>;
}

/// Any of the supported model families.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum RegressionModel {
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
    Ridge(RidgeRegressor),
}

impl RegressionModel {
    /// Unfitted model for `spec`. `seed` drives any sampling the family does.
    pub fn from_spec(spec: &ModelSpec, seed: u64) -> Self {
        match *spec {
            ModelSpec::RandomForest {
                n_estimators,
                max_depth,
                min_samples_split,
            } => RegressionModel::RandomForest(RandomForestRegressor::new(
                n_estimators,
                max_depth,
                min_samples_split,
                seed,
            )),
            ModelSpec::GradientBoosting {
                n_estimators,
                max_depth,
                learning_rate,
            } => RegressionModel::GradientBoosting(GradientBoostingRegressor::new(
                n_estimators,
                max_depth,
                learning_rate,
            )),
            ModelSpec::Ridge { alpha } => RegressionModel::Ridge(RidgeRegressor::new(alpha)),
        }
    }

    fn inner(&self) -> &dyn Regressor {
        match self {
            RegressionModel::RandomForest(m) => m,
            RegressionModel::GradientBoosting(m) => m,
            RegressionModel::Ridge(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Regressor {
        match self {
            RegressionModel::RandomForest(m) => m,
            RegressionModel::GradientBoosting(m) => m,
            RegressionModel::Ridge(m) => m,
        }
    }
}

impl Regressor for RegressionModel {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.inner().predict(x)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.inner().feature_importances()
    }
}

static_assertions::assert_impl_all!(RegressionModel: Send, Sync);

/// Reject empty inputs, mismatched lengths and non-finite values.
pub(crate) fn check_fit_input(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 {
        return Err(RoiError::InvalidData("cannot fit on zero rows".to_string()));
    }
    if x.nrows() != y.len() {
        return Err(RoiError::InvalidData(format!(
            "feature rows ({}) and targets ({}) differ in length",
            x.nrows(),
            y.len()
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(RoiError::InvalidData(
            "features and targets must be finite".to_string(),
        ));
    }
    Ok(())
}

/// Scale `values` to sum to 1; all-zero input is left alone.
pub(crate) fn normalize(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        for v in values.iter_mut() {
            *v /= total;
        }
    }
}
