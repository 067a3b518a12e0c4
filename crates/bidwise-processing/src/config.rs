//! Configuration for feature preparation.
//!
//! [`FeatureConfig`] fixes which columns are derived and how unseen categories
//! and missing values are treated. It is serialized into persisted model
//! bundles so that a reloaded model rebuilds features exactly as it did when
//! it was trained.

use serde::{Deserialize, Serialize};

/// Default name of the training target column.
pub const DEFAULT_TARGET_COLUMN: &str = "roi";

/// Default trailing windows (in periods) for rolling averages.
pub const DEFAULT_ROLLING_WINDOWS: [usize; 3] = [7, 14, 30];

/// Default categorical columns that are label-encoded.
pub const DEFAULT_CATEGORICAL_COLUMNS: [&str; 3] =
    ["campaign_type", "campaign_status", "day_of_week"];

/// What to do with a categorical value the fitted encoder has never seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UnknownCategoryPolicy {
    /// Fail with [`ProcessingError::UnseenCategory`](crate::ProcessingError::UnseenCategory).
    #[default]
    Error,
    /// Map the value to a reserved code equal to the number of known classes.
    Reserved,
}

/// Where the fill values for missing feature values come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImputationStrategy {
    /// Reuse the medians recorded when the model was trained. Columns without
    /// a recorded median fall back to the batch median.
    #[default]
    TrainingMedians,
    /// Recompute medians from every batch, including prediction batches.
    BatchMedians,
}

/// Configuration for [`prepare_features`](crate::prepare_features).
///
/// # Example
///
/// ```rust,ignore
/// use bidwise_processing::{FeatureConfig, UnknownCategoryPolicy};
///
/// let config = FeatureConfig::builder()
///     .target_column("roi")
///     .rolling_windows(vec![7, 28])
///     .unknown_category_policy(UnknownCategoryPolicy::Reserved)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Name of the target column. It is never part of the feature table.
    /// Default: "roi"
    pub target_column: String,

    /// Trailing windows for the per-campaign rolling averages.
    /// Default: [7, 14, 30]
    pub rolling_windows: Vec<usize>,

    /// Columns that are string-cast and label-encoded, in output order.
    /// Default: campaign_type, campaign_status, day_of_week
    pub categorical_columns: Vec<String>,

    /// Policy for categorical values unseen at fit time.
    /// Default: Error
    pub unknown_category_policy: UnknownCategoryPolicy,

    /// Source of the fill values for missing feature values.
    /// Default: TrainingMedians
    pub imputation: ImputationStrategy,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            target_column: DEFAULT_TARGET_COLUMN.to_string(),
            rolling_windows: DEFAULT_ROLLING_WINDOWS.to_vec(),
            categorical_columns: DEFAULT_CATEGORICAL_COLUMNS
                .iter()
                .map(|c| c.to_string())
                .collect(),
            unknown_category_policy: UnknownCategoryPolicy::default(),
            imputation: ImputationStrategy::default(),
        }
    }
}

impl FeatureConfig {
    /// Create a new configuration builder.
    pub fn builder() -> FeatureConfigBuilder {
        FeatureConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.target_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyTargetColumn);
        }

        if self.rolling_windows.is_empty() {
            return Err(ConfigValidationError::NoRollingWindows);
        }

        if let Some(&window) = self.rolling_windows.iter().find(|&&w| w == 0) {
            return Err(ConfigValidationError::InvalidWindow(window));
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("target_column must not be empty")]
    EmptyTargetColumn,

    #[error("rolling_windows must contain at least one window")]
    NoRollingWindows,

    #[error("Invalid rolling window: {0} (must be at least 1)")]
    InvalidWindow(usize),
}

/// Builder for [`FeatureConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct FeatureConfigBuilder {
    target_column: Option<String>,
    rolling_windows: Option<Vec<usize>>,
    categorical_columns: Option<Vec<String>>,
    unknown_category_policy: Option<UnknownCategoryPolicy>,
    imputation: Option<ImputationStrategy>,
}

impl FeatureConfigBuilder {
    /// Set the target column name (default: "roi").
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Set the rolling-average windows (default: 7, 14, 30).
    pub fn rolling_windows(mut self, windows: Vec<usize>) -> Self {
        self.rolling_windows = Some(windows);
        self
    }

    /// Set the categorical columns to encode.
    pub fn categorical_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Set the unseen-category policy.
    pub fn unknown_category_policy(mut self, policy: UnknownCategoryPolicy) -> Self {
        self.unknown_category_policy = Some(policy);
        self
    }

    /// Set the imputation strategy.
    pub fn imputation(mut self, strategy: ImputationStrategy) -> Self {
        self.imputation = Some(strategy);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `FeatureConfig` or an error if validation fails.
    pub fn build(self) -> Result<FeatureConfig, ConfigValidationError> {
        let defaults = FeatureConfig::default();
        let config = FeatureConfig {
            target_column: self.target_column.unwrap_or(defaults.target_column),
            rolling_windows: self.rolling_windows.unwrap_or(defaults.rolling_windows),
            categorical_columns: self
                .categorical_columns
                .unwrap_or(defaults.categorical_columns),
            unknown_category_policy: self.unknown_category_policy.unwrap_or_default(),
            imputation: self.imputation.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
