//! Row partitioning and cross-validated model selection.

use crate::config::ModelSpec;
use crate::error::{Result, RoiError};
use crate::metrics::r2_score;
use crate::models::{RegressionModel, Regressor};
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Train and test row indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n_samples` with `seed` and hold out `ceil(test_size * n)` rows.
///
/// # Errors
///
/// [`RoiError::InvalidData`] if either partition would be empty.
pub fn train_test_split(n_samples: usize, test_size: f64, seed: u64) -> Result<Split> {
    let n_test = (test_size * n_samples as f64).ceil() as usize;
    if n_test == 0 || n_test >= n_samples {
        return Err(RoiError::InvalidData(format!(
            "cannot hold out {n_test} of {n_samples} rows for testing"
        )));
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok(Split {
        train,
        test: indices,
    })
}

/// Contiguous, unshuffled k-fold partitions. The first `n % k` folds get one
/// extra row.
pub fn k_fold(n_samples: usize, n_splits: usize) -> Result<Vec<Split>> {
    if n_splits < 2 {
        return Err(RoiError::InvalidConfig(
            "n_splits must be at least 2".to_string(),
        ));
    }
    if n_samples < n_splits {
        return Err(RoiError::InvalidData(format!(
            "n_samples ({n_samples}) must be >= n_splits ({n_splits})"
        )));
    }

    let base = n_samples / n_splits;
    let remainder = n_samples % n_splits;
    let mut splits = Vec::with_capacity(n_splits);
    let mut start = 0;
    for fold in 0..n_splits {
        let size = if fold < remainder { base + 1 } else { base };
        let end = start + size;
        splits.push(Split {
            train: (0..start).chain(end..n_samples).collect(),
            test: (start..end).collect(),
        });
        start = end;
    }
    Ok(splits)
}

/// Per-fold R² scores of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvResults {
    pub scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
}

impl CvResults {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n = scores.len().max(1) as f64;
        let mean_score = scores.iter().sum::<f64>() / n;
        let variance = scores
            .iter()
            .map(|s| (s - mean_score).powi(2))
            .sum::<f64>()
            / n;
        Self {
            scores,
            mean_score,
            std_score: variance.sqrt(),
        }
    }
}

/// Fit a fresh `spec` model on each fold's training rows and score it on
/// the fold's held-out rows.
pub fn cross_validate(
    spec: &ModelSpec,
    seed: u64,
    x: &Array2<f64>,
    y: &Array1<f64>,
    n_splits: usize,
) -> Result<CvResults> {
    let scores = k_fold(x.nrows(), n_splits)?
        .into_iter()
        .map(|fold| {
            let mut model = RegressionModel::from_spec(spec, seed);
            model.fit(&x.select(Axis(0), &fold.train), &y.select(Axis(0), &fold.train))?;
            let predicted = model.predict(&x.select(Axis(0), &fold.test))?;
            Ok(r2_score(&y.select(Axis(0), &fold.test), &predicted))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(CvResults::from_scores(scores))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes_and_coverage() {
        let split = train_test_split(11, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 8);

        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..11).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_reproducible() {
        assert_eq!(
            train_test_split(50, 0.2, 42).unwrap(),
            train_test_split(50, 0.2, 42).unwrap()
        );
        assert_ne!(
            train_test_split(50, 0.2, 42).unwrap(),
            train_test_split(50, 0.2, 43).unwrap()
        );
    }

    #[test]
    fn test_split_rejects_tiny_inputs() {
        assert!(train_test_split(1, 0.2, 42).is_err());
        assert!(train_test_split(0, 0.2, 42).is_err());
    }

    #[test]
    fn test_k_fold_sizes() {
        let folds = k_fold(12, 5).unwrap();
        let sizes: Vec<usize> = folds.iter().map(|f| f.test.len()).collect();
        assert_eq!(sizes, vec![3, 3, 2, 2, 2]);
        assert_eq!(folds[0].test, vec![0, 1, 2]);
        assert_eq!(folds[1].train.len(), 9);
        assert!(k_fold(3, 5).is_err());
    }

    #[test]
    fn test_cv_results_summary() {
        let results = CvResults::from_scores(vec![0.5, 0.7]);
        assert!((results.mean_score - 0.6).abs() < 1e-12);
        assert!((results.std_score - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_cross_validate_linear_data() {
        let x = Array2::from_shape_fn((25, 1), |(i, _)| i as f64);
        let y = x.column(0).mapv(|v| 3.0 * v + 1.0);
        let results = cross_validate(&ModelSpec::ridge(1e-6), 0, &x, &y, 5).unwrap();
        assert_eq!(results.scores.len(), 5);
        assert!(results.mean_score > 0.99);
    }
}
