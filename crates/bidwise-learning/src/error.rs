//! Error types for the bidwise-learning crate.
//!
//! This module defines [`RoiError`], the error type used throughout the crate.
//! All public API functions return `Result<T, RoiError>`.
//!
//! # Error Handling
//!
//! Errors are designed to be:
//! - **Descriptive**: each variant names the precondition that failed
//! - **Typed**: callers can match on the variant instead of parsing messages
//!
//! # Example
//!
//! ```no_run
//! use bidwise_learning::{RoiError, RoiPredictor};
//! use polars::prelude::DataFrame;
//!
//! fn score(predictor: &RoiPredictor, records: &DataFrame) -> Result<Vec<f64>, RoiError> {
//!     match predictor.predict(records) {
//!         Err(e) if e.is_not_trained() => Ok(Vec::new()),
//!         other => other,
//!     }
//! }
//! ```

use bidwise_processing::ProcessingError;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for bidwise-learning operations.
///
/// This enum covers all error conditions that can occur during:
/// - Predictor configuration and validation
/// - Feature preparation (wrapped [`ProcessingError`]s)
/// - Model training, selection and evaluation
/// - Prediction and bid optimization
/// - Model bundle persistence
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RoiError {
    /// The predictor has not been trained or loaded yet.
    ///
    /// Returned by every operation that needs a fitted model. No work is
    /// attempted before the check.
    #[error("Model is not trained: call train() or load_model() first")]
    NotTrained,

    /// Invalid configuration provided to the predictor or optimizer.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data provided for training or prediction.
    ///
    /// Common causes:
    /// - Too few rows for the requested split and fold count
    /// - A target value that is missing or not finite
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The target column was not found in the training records.
    #[error("Target column '{0}' not found")]
    TargetNotFound(String),

    /// Training failed.
    ///
    /// Raised when no candidate model could be fitted.
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// The selected model family does not expose per-feature importances.
    #[error("Feature importance is not available for model '{model}'")]
    ImportanceUnavailable {
        /// Name of the fitted model family.
        model: String,
    },

    /// The specified model file was not found.
    #[error("Model not found: {path}")]
    ModelNotFound {
        /// The path that was not found.
        path: String,
    },

    /// A model bundle was read but is not usable.
    #[error("Corrupt model bundle: {0}")]
    CorruptModel(String),

    /// Feature preparation failed.
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Bundle (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during file operations.
    ///
    /// This wraps standard I/O errors that occur during model save/load operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RoiError {
    /// Returns `true` for [`RoiError::NotTrained`].
    #[must_use]
    pub fn is_not_trained(&self) -> bool {
        matches!(self, RoiError::NotTrained)
    }

    /// Stable machine-readable code for the error kind.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            RoiError::NotTrained => "NOT_TRAINED",
            RoiError::InvalidConfig(_) => "INVALID_CONFIG",
            RoiError::InvalidData(_) => "INVALID_DATA",
            RoiError::TargetNotFound(_) => "TARGET_NOT_FOUND",
            RoiError::TrainingFailed(_) => "TRAINING_FAILED",
            RoiError::ImportanceUnavailable { .. } => "IMPORTANCE_UNAVAILABLE",
            RoiError::ModelNotFound { .. } => "MODEL_NOT_FOUND",
            RoiError::CorruptModel(_) => "CORRUPT_MODEL",
            RoiError::Processing(e) => e.error_code(),
            RoiError::Polars(_) => "POLARS_ERROR",
            RoiError::Serialization(_) => "SERIALIZATION_ERROR",
            RoiError::Io(_) => "IO_ERROR",
        }
    }
}

impl Serialize for RoiError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("RoiError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for bidwise-learning operations.
pub type Result<T> = std::result::Result<T, RoiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_trained_helper() {
        assert!(RoiError::NotTrained.is_not_trained());
        assert!(!RoiError::InvalidData("x".into()).is_not_trained());
    }

    #[test]
    fn test_processing_errors_keep_their_code() {
        let err: RoiError = ProcessingError::ColumnNotFound("impressions".into()).into();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
        assert!(err.to_string().contains("impressions"));
    }

    #[test]
    fn test_serialization() {
        let err = RoiError::ImportanceUnavailable {
            model: "ridge".into(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "IMPORTANCE_UNAVAILABLE");
        assert!(json["message"].as_str().unwrap().contains("ridge"));
    }
}
