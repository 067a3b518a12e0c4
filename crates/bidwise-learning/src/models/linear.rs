//! Ridge regression.

use super::{Regressor, check_fit_input};
use crate::error::{Result, RoiError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Linear model with an L2 penalty on the coefficients.
///
/// Solved in closed form on centred data, so the intercept is not penalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeRegressor {
    pub alpha: f64,
    intercept: f64,
    coefficients: Vec<f64>,
    fitted: bool,
}

impl RidgeRegressor {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            intercept: 0.0,
            coefficients: Vec::new(),
            fitted: false,
        }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for RidgeRegressor {
    fn name(&self) -> &'static str {
        "ridge"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_fit_input(x, y)?;
        let p = x.ncols();
        let x_mean = x
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(p));
        let y_mean = y.mean().unwrap_or(0.0);

        let xc = x - &x_mean;
        let yc = y - y_mean;

        let mut gram = xc.t().dot(&xc);
        for j in 0..p {
            gram[[j, j]] += self.alpha;
        }
        let rhs = xc.t().dot(&yc);
        let coefficients = solve(gram, rhs)?;

        self.intercept = y_mean - x_mean.dot(&coefficients);
        self.coefficients = coefficients.to_vec();
        self.fitted = true;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.fitted {
            return Err(RoiError::NotTrained);
        }
        if x.ncols() != self.coefficients.len() {
            return Err(RoiError::InvalidData(format!(
                "expected {} features, got {}",
                self.coefficients.len(),
                x.ncols()
            )));
        }
        let coefficients = Array1::from_vec(self.coefficients.clone());
        Ok(x.dot(&coefficients) + self.intercept)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// Solve `a · w = b` by Gaussian elimination with partial pivoting.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);
        if a[[pivot, col]].abs() < 1e-12 {
            return Err(RoiError::TrainingFailed(
                "ridge system is singular".to_string(),
            ));
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut w = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[[row, k]] * w[k]).sum();
        w[row] = (b[row] - tail) / a[[row, row]];
    }
    Ok(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_recovers_linear_relation_with_small_alpha() {
        let x = Array2::from_shape_fn((20, 2), |(i, j)| if j == 0 { i as f64 } else { (i % 3) as f64 });
        let y = x.column(0).mapv(|v| 2.0 * v) + &x.column(1).mapv(|v| -v) + 1.0;

        let mut model = RidgeRegressor::new(1e-8);
        model.fit(&x, &y).unwrap();

        assert!((model.coefficients()[0] - 2.0).abs() < 1e-5);
        assert!((model.coefficients()[1] + 1.0).abs() < 1e-5);
        assert!((model.intercept() - 1.0).abs() < 1e-5);
        assert!(model.feature_importances().is_none());
    }

    #[test]
    fn test_penalty_shrinks_coefficients() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![0.0, 1.0, 2.0, 3.0];
        let mut loose = RidgeRegressor::new(1e-6);
        let mut tight = RidgeRegressor::new(100.0);
        loose.fit(&x, &y).unwrap();
        tight.fit(&x, &y).unwrap();
        assert!(tight.coefficients()[0].abs() < loose.coefficients()[0].abs());
    }

    #[test]
    fn test_solve_with_pivoting() {
        let a = array![[0.0, 1.0], [2.0, 0.0]];
        let b = array![3.0, 4.0];
        let w = solve(a, b).unwrap();
        assert!((w[0] - 2.0).abs() < 1e-12);
        assert!((w[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_width_mismatch_on_predict() {
        let mut model = RidgeRegressor::new(1.0);
        model.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]).unwrap();
        let err = model.predict(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, RoiError::InvalidData(_)));
    }
}
