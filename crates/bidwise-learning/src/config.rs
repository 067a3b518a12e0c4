//! Configuration types for ROI model training.
//!
//! This module provides [`PredictorConfig`] and its builder, as well as
//! [`ModelSpec`], the description of one candidate model family with fixed
//! hyperparameters.
//!
//! # Example
//!
//! ```
//! use bidwise_learning::{ModelSpec, PredictorConfig};
//!
//! let config = PredictorConfig::builder()
//!     .cv_folds(5)
//!     .test_size(0.2)
//!     .candidates(vec![
//!         ModelSpec::random_forest(50, 8, 5),
//!         ModelSpec::gradient_boosting(50, 4, 0.1),
//!     ])
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::RoiError;
use bidwise_processing::FeatureConfig;
use serde::{Deserialize, Serialize};

/// A candidate regression model family and its hyperparameters.
///
/// Candidates are cross-validated in the order they are listed; on equal
/// scores the earlier candidate wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ModelSpec {
    /// Bagged regression trees.
    RandomForest {
        n_estimators: usize,
        max_depth: usize,
        min_samples_split: usize,
    },

    /// Least-squares gradient boosting over shallow regression trees.
    GradientBoosting {
        n_estimators: usize,
        max_depth: usize,
        learning_rate: f64,
    },

    /// L2-regularised linear regression. Exposes no feature importances.
    Ridge { alpha: f64 },
}

impl ModelSpec {
    /// Random forest candidate.
    #[must_use]
    pub fn random_forest(n_estimators: usize, max_depth: usize, min_samples_split: usize) -> Self {
        ModelSpec::RandomForest {
            n_estimators,
            max_depth,
            min_samples_split,
        }
    }

    /// Gradient boosting candidate.
    #[must_use]
    pub fn gradient_boosting(n_estimators: usize, max_depth: usize, learning_rate: f64) -> Self {
        ModelSpec::GradientBoosting {
            n_estimators,
            max_depth,
            learning_rate,
        }
    }

    /// Ridge regression candidate.
    #[must_use]
    pub fn ridge(alpha: f64) -> Self {
        ModelSpec::Ridge { alpha }
    }

    /// Model family name, as reported in scores and errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use bidwise_learning::ModelSpec;
    ///
    /// assert_eq!(ModelSpec::ridge(1.0).name(), "ridge");
    /// ```
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ModelSpec::RandomForest { .. } => "random_forest",
            ModelSpec::GradientBoosting { .. } => "gradient_boosting",
            ModelSpec::Ridge { .. } => "ridge",
        }
    }

    fn validate(&self) -> Result<(), RoiError> {
        let invalid = |reason: &str| {
            Err(RoiError::InvalidConfig(format!("{}: {reason}", self.name())))
        };
        match *self {
            ModelSpec::RandomForest {
                n_estimators,
                max_depth,
                min_samples_split,
            } => {
                if n_estimators == 0 {
                    return invalid("n_estimators must be at least 1");
                }
                if max_depth == 0 {
                    return invalid("max_depth must be at least 1");
                }
                if min_samples_split < 2 {
                    return invalid("min_samples_split must be at least 2");
                }
            }
            ModelSpec::GradientBoosting {
                n_estimators,
                max_depth,
                learning_rate,
            } => {
                if n_estimators == 0 {
                    return invalid("n_estimators must be at least 1");
                }
                if max_depth == 0 {
                    return invalid("max_depth must be at least 1");
                }
                if !(learning_rate > 0.0 && learning_rate.is_finite()) {
                    return invalid("learning_rate must be positive");
                }
            }
            ModelSpec::Ridge { alpha } => {
                if !(alpha > 0.0 && alpha.is_finite()) {
                    return invalid("alpha must be positive");
                }
            }
        }
        Ok(())
    }
}

/// The default candidate list: a random forest and a gradient-boosted ensemble.
#[must_use]
pub fn default_candidates() -> Vec<ModelSpec> {
    vec![
        ModelSpec::random_forest(100, 10, 5),
        ModelSpec::gradient_boosting(100, 6, 0.1),
    ]
}

/// Configuration for [`RoiPredictor`](crate::RoiPredictor).
///
/// Use [`PredictorConfig::builder()`] to construct a configuration with the builder pattern.
///
/// # Validation
///
/// The builder validates the following constraints on [`build()`](PredictorConfigBuilder::build):
/// - `test_size` must be in range `(0.0, 1.0)` (exclusive)
/// - `cv_folds` must be at least 2
/// - `candidates` must not be empty and every candidate must have valid hyperparameters
/// - the feature configuration must be valid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Feature derivation settings, including the target column.
    pub features: FeatureConfig,

    /// Fraction of rows held out for the final evaluation (default: 0.2).
    pub test_size: f64,

    /// Number of cross-validation folds used for model selection (default: 5).
    pub cv_folds: usize,

    /// Seed for the train/test split and for every stochastic model (default: 42).
    ///
    /// Set to the same value for reproducible training results.
    pub random_seed: u64,

    /// Candidate models, in selection order.
    pub candidates: Vec<ModelSpec>,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            features: FeatureConfig::default(),
            test_size: 0.2,
            cv_folds: 5,
            random_seed: 42,
            candidates: default_candidates(),
        }
    }
}

impl PredictorConfig {
    /// Create a new builder for `PredictorConfig`.
    #[must_use]
    pub fn builder() -> PredictorConfigBuilder {
        PredictorConfigBuilder::default()
    }

    /// Name of the training target column.
    #[must_use]
    pub fn target_column(&self) -> &str {
        &self.features.target_column
    }

    /// Check every constraint listed on [`PredictorConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RoiError::InvalidConfig`] naming the first violated constraint.
    pub fn validate(&self) -> Result<(), RoiError> {
        self.features
            .validate()
            .map_err(|e| RoiError::InvalidConfig(e.to_string()))?;

        if self.test_size <= 0.0 || self.test_size >= 1.0 {
            return Err(RoiError::InvalidConfig(
                "test_size must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }

        if self.cv_folds < 2 {
            return Err(RoiError::InvalidConfig(
                "cv_folds must be at least 2".to_string(),
            ));
        }

        if self.candidates.is_empty() {
            return Err(RoiError::InvalidConfig(
                "at least one candidate model is required".to_string(),
            ));
        }

        self.candidates.iter().try_for_each(ModelSpec::validate)
    }
}

/// Builder for [`PredictorConfig`].
///
/// Created via [`PredictorConfig::builder()`]. All setters return `self` to allow
/// method chaining.
#[derive(Debug, Clone, Default)]
pub struct PredictorConfigBuilder {
    config: PredictorConfig,
}

impl PredictorConfigBuilder {
    /// Set the feature configuration.
    #[must_use]
    pub fn features(mut self, features: FeatureConfig) -> Self {
        self.config.features = features;
        self
    }

    /// Set the target column name (default: "roi").
    #[must_use]
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.config.features.target_column = column.into();
        self
    }

    /// Set the test size fraction (default: 0.2).
    #[must_use]
    pub fn test_size(mut self, size: f64) -> Self {
        self.config.test_size = size;
        self
    }

    /// Set the number of cross-validation folds (default: 5).
    #[must_use]
    pub fn cv_folds(mut self, folds: usize) -> Self {
        self.config.cv_folds = folds;
        self
    }

    /// Set the random seed for reproducibility (default: 42).
    #[must_use]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Replace the candidate list.
    #[must_use]
    pub fn candidates(mut self, candidates: Vec<ModelSpec>) -> Self {
        self.config.candidates = candidates;
        self
    }

    /// Append one candidate to the current list.
    #[must_use]
    pub fn candidate(mut self, candidate: ModelSpec) -> Self {
        self.config.candidates.push(candidate);
        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns [`RoiError::InvalidConfig`] if any constraint listed on
    /// [`PredictorConfig`] is violated.
    pub fn build(self) -> Result<PredictorConfig, RoiError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PredictorConfig::default();
        assert_eq!(config.target_column(), "roi");
        assert_eq!(config.cv_folds, 5);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.random_seed, 42);
        assert_eq!(
            config.candidates,
            vec![
                ModelSpec::random_forest(100, 10, 5),
                ModelSpec::gradient_boosting(100, 6, 0.1),
            ]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = PredictorConfig::builder()
            .target_column("revenue_ratio")
            .cv_folds(3)
            .random_seed(7)
            .candidate(ModelSpec::ridge(1.0))
            .build()
            .unwrap();

        assert_eq!(config.target_column(), "revenue_ratio");
        assert_eq!(config.cv_folds, 3);
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.candidates.len(), 3);
        assert_eq!(config.candidates[2].name(), "ridge");
    }

    #[test]
    fn test_invalid_test_size() {
        for size in [0.0, 1.0, -0.1, 1.5] {
            let result = PredictorConfig::builder().test_size(size).build();
            assert!(result.unwrap_err().to_string().contains("test_size"));
        }
    }

    #[test]
    fn test_invalid_cv_folds() {
        let result = PredictorConfig::builder().cv_folds(1).build();
        assert!(result.unwrap_err().to_string().contains("cv_folds"));
    }

    #[test]
    fn test_invalid_candidates() {
        let result = PredictorConfig::builder().candidates(vec![]).build();
        assert!(result.unwrap_err().to_string().contains("candidate"));

        let result = PredictorConfig::builder()
            .candidates(vec![ModelSpec::random_forest(0, 10, 5)])
            .build();
        assert!(result.unwrap_err().to_string().contains("n_estimators"));

        let result = PredictorConfig::builder()
            .candidates(vec![ModelSpec::gradient_boosting(10, 3, 0.0)])
            .build();
        assert!(result.unwrap_err().to_string().contains("learning_rate"));

        let result = PredictorConfig::builder()
            .candidates(vec![ModelSpec::random_forest(10, 0, 5)])
            .build();
        assert!(result.unwrap_err().to_string().contains("max_depth"));
    }

    #[test]
    fn test_invalid_feature_config() {
        let result = PredictorConfig::builder().target_column("").build();
        assert!(matches!(result.unwrap_err(), RoiError::InvalidConfig(_)));
    }

    #[test]
    fn test_model_spec_serialization() {
        let spec = ModelSpec::gradient_boosting(10, 3, 0.1);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["family"], "gradient_boosting");
        let parsed: ModelSpec = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, spec);
    }
}
