//! Error types for feature preparation.
//!
//! Every failure in this crate surfaces as a [`ProcessingError`]. Variants name
//! the failing column or value so callers can report the broken precondition
//! without re-inspecting the input.
//!
//! Errors are serializable as `{code, message}` so they can be handed to a
//! front end or written into a JSON report unchanged.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for feature preparation.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// A required column was not found in the records.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A column is present but its contents cannot be used.
    #[error("Invalid data in column '{column}': {reason}")]
    InvalidData { column: String, reason: String },

    /// A categorical value was not seen when the encoder was fitted.
    #[error("Unseen category '{value}' in column '{column}'")]
    UnseenCategory { column: String, value: String },

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ProcessingError>,
    },
}

impl ProcessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ProcessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for [`ProcessingError::InvalidData`].
    pub fn invalid_data(column: impl Into<String>, reason: impl Into<String>) -> Self {
        ProcessingError::InvalidData {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for the error kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::InvalidData { .. } => "INVALID_DATA",
            Self::UnseenCategory { .. } => "UNSEEN_CATEGORY",
            Self::Polars(_) => "POLARS_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is a schema problem (missing or mistyped column).
    pub fn is_schema_error(&self) -> bool {
        match self {
            Self::ColumnNotFound(_) | Self::InvalidData { .. } => true,
            Self::WithContext { source, .. } => source.is_schema_error(),
            _ => false,
        }
    }
}

impl Serialize for ProcessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ProcessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ProcessingError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            ProcessingError::ColumnNotFound("clicks".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(
            ProcessingError::UnseenCategory {
                column: "campaign_type".to_string(),
                value: "video".to_string(),
            }
            .error_code(),
            "UNSEEN_CATEGORY"
        );
    }

    #[test]
    fn test_messages_name_the_column() {
        let err = ProcessingError::ColumnNotFound("impressions".to_string());
        assert!(err.to_string().contains("impressions"));

        let err = ProcessingError::invalid_data("cost", "expected a numeric column");
        assert!(err.to_string().contains("cost"));
        assert!(err.to_string().contains("numeric"));
    }

    #[test]
    fn test_error_serialization() {
        let error = ProcessingError::ColumnNotFound("date".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("date"));
    }

    #[test]
    fn test_with_context() {
        let error =
            ProcessingError::ColumnNotFound("date".to_string()).with_context("While validating");
        assert!(error.to_string().contains("While validating"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
        assert!(error.is_schema_error());
    }

    #[test]
    fn test_unseen_category_is_not_schema_error() {
        let error = ProcessingError::UnseenCategory {
            column: "campaign_status".to_string(),
            value: "archived".to_string(),
        };
        assert!(!error.is_schema_error());
    }
}
