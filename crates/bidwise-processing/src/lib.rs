//! Feature Engineering for Campaign Performance Records
//!
//! Turns raw advertising performance records into the numeric feature table
//! consumed by the ROI models in `bidwise-learning`. Built on Polars.
//!
//! # Overview
//!
//! - **Schema Validation**: required fields are checked up front and the first
//!   missing or mistyped one is named in the error
//! - **Temporal Features**: hour, weekday, month and weekend flag from `date`
//! - **Ratio Features**: CTR, CPC and conversion rate with zero-denominator guards
//! - **Rolling Averages**: per-campaign trailing means over configurable windows
//! - **Label Encoding**: fit-once encoders owned by the caller
//! - **Median Imputation**: per-batch or training-time medians
//! - **Column Reconciliation**: align a batch with a recorded feature list
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bidwise_processing::{EncoderState, FeatureConfig, prepare_features, reconcile_columns};
//! use polars::prelude::*;
//!
//! let records = CsvReadOptions::default()
//!     .with_has_header(true)
//!     .try_into_reader_with_file_path(Some("history.csv".into()))?
//!     .finish()?;
//!
//! let config = FeatureConfig::default();
//! let mut encoders = EncoderState::new();
//!
//! // First pass fits the encoders and records the medians.
//! let training = prepare_features(&records, &mut encoders, &config, None)?;
//! let columns = training.column_names();
//!
//! // Later batches reuse both, then get aligned with the training columns.
//! let batch = prepare_features(&new_records, &mut encoders, &config, Some(&training.medians))?;
//! let aligned = reconcile_columns(&batch.frame, &columns)?;
//! ```
//!
//! # Unseen Categories
//!
//! By default a categorical value the encoder never saw is an error
//! ([`ProcessingError::UnseenCategory`]). Set
//! [`UnknownCategoryPolicy::Reserved`] to map such values to a reserved code
//! instead.

pub mod config;
pub mod encoding;
pub mod error;
pub mod features;
pub mod imputation;
pub mod reconcile;
pub mod rolling;
pub mod schema;
pub mod temporal;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    ConfigValidationError, FeatureConfig, FeatureConfigBuilder, ImputationStrategy,
    UnknownCategoryPolicy,
};
pub use encoding::{EncoderState, LabelEncoder};
pub use error::{ProcessingError, Result as ProcessingResult, ResultExt};
pub use features::{PreparedFeatures, encoded_column_name, prepare_features};
pub use imputation::Medians;
pub use reconcile::reconcile_columns;
pub use schema::{REQUIRED_COLUMNS, validate_records};
