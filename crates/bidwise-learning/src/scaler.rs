//! Feature standardisation.

use crate::error::{Result, RoiError};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Z-score scaler: `(x - mean) / std` per column.
///
/// Uses the population standard deviation. A constant column gets a scale
/// of 1, so it maps to zeros instead of NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    /// Fit on the columns of `x`.
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(RoiError::InvalidData(
                "cannot fit a scaler on zero rows".to_string(),
            ));
        }
        let mut means = Vec::with_capacity(x.ncols());
        let mut scales = Vec::with_capacity(x.ncols());
        for column in x.axis_iter(Axis(1)) {
            let mean = column.sum() / column.len() as f64;
            let variance =
                column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / column.len() as f64;
            let std = variance.sqrt();
            means.push(mean);
            scales.push(if std > 0.0 && std.is_finite() { std } else { 1.0 });
        }
        Ok(Self { means, scales })
    }

    /// Number of columns the scaler was fitted on.
    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(RoiError::InvalidData(format!(
                "scaler expects {} features, got {}",
                self.n_features(),
                x.ncols()
            )));
        }
        let mut scaled = x.clone();
        for (j, mut column) in scaled.axis_iter_mut(Axis(1)).enumerate() {
            let (mean, scale) = (self.means[j], self.scales[j]);
            column.mapv_inplace(|v| (v - mean) / scale);
        }
        Ok(scaled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_standardizes_columns() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        let scaled = scaler.transform(&x).unwrap();
        assert_eq!(scaled, array![[-1.0, 0.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_transform_uses_fitted_statistics() {
        let scaler = StandardScaler::fit(&array![[0.0], [2.0]]).unwrap();
        let scaled = scaler.transform(&array![[4.0]]).unwrap();
        assert_eq!(scaled, array![[3.0]]);
    }

    #[test]
    fn test_width_mismatch() {
        let scaler = StandardScaler::fit(&array![[0.0], [2.0]]).unwrap();
        assert!(scaler.transform(&array![[1.0, 2.0]]).is_err());
    }
}
