//! bidwise-learning: ROI prediction and bid optimization for ad campaigns.
//!
//! This crate trains regression models that estimate the return on investment
//! of advertising campaigns from historical performance records, and uses them
//! to suggest bid changes and flag underperforming keywords. Feature
//! engineering lives in `bidwise-processing`; everything here works on the
//! numeric feature table it produces.
//!
//! # Features
//!
//! - **Model Selection**: cross-validated choice between tree ensembles
//!   (random forest, gradient boosting) and an optional ridge baseline
//! - **Reproducible Training**: every random choice is driven by one seed
//! - **Column Reconciliation**: prediction batches are aligned with the
//!   training columns, so a missing feature never fails a prediction
//! - **Persistence**: a single JSON bundle, written atomically, that
//!   reloads to bit-identical predictions
//! - **Bid Optimization**: local search over relative bid changes
//! - **Progress Reporting**: training progress callbacks
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bidwise_learning::{CampaignOptimizer, PredictorConfig, RoiPredictor};
//!
//! let config = PredictorConfig::builder()
//!     .target_column("roi")
//!     .build()?;
//!
//! let mut predictor = RoiPredictor::with_config(config)?
//!     .on_progress(|u| println!("{:.0}% - {}", u.progress * 100.0, u.message));
//!
//! let metrics = predictor.train(&history)?;
//! println!("test R²: {:.3}", metrics.r2_score);
//!
//! let optimizer = CampaignOptimizer::new(&predictor);
//! let recommendations = optimizer.optimize_bids(&keywords, 1.5, 0.2)?;
//! let flagged = optimizer.identify_underperforming_keywords(&keywords, 1.0)?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                          RoiPredictor                             │
//! │                                                                   │
//! │  records ──► prepare_features ──► reconcile ──► scaler ──► model  │
//! │              (bidwise-processing)                                 │
//! │                                                                   │
//! │  train: split ──► k-fold CV per candidate ──► refit winner        │
//! └───────────────────────────┬───────────────────────────────────────┘
//!                             │ &RoiPredictor
//!                             ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                       CampaignOptimizer                           │
//! │  optimize_bids ── identify_underperforming_keywords               │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, RoiError>`](Result). The most
//! common variants are:
//!
//! - [`RoiError::NotTrained`] - the predictor has no fitted model yet
//! - [`RoiError::TargetNotFound`] - the training target column is missing
//! - [`RoiError::Processing`] - a required input column is missing or malformed
//! - [`RoiError::ImportanceUnavailable`] - the selected model has no importances
//!
//! See [`RoiError`] for the complete list.
//!
//! # Model Persistence
//!
//! ```rust,ignore
//! predictor.save_model("roi_model.json")?;
//!
//! let mut restored = RoiPredictor::new();
//! restored.load_model("roi_model.json")?;
//! ```
//!
//! # Modules
//!
//! - [`models`] - the regression model families and the [`Regressor`] interface
//! - [`metrics`] - regression metrics
//! - [`selection`] - train/test splitting and cross-validation

mod bundle;
mod config;
mod error;
pub mod metrics;
pub mod models;
mod optimizer;
mod predictor;
mod progress;
mod scaler;
pub mod selection;
mod types;

// Re-export public API
//
// Configuration types
pub use config::{ModelSpec, PredictorConfig, PredictorConfigBuilder, default_candidates};
// Error types
pub use error::{Result, RoiError};
// Model types
pub use bundle::{BUNDLE_FORMAT_VERSION, ModelBundle};
pub use models::{RegressionModel, Regressor};
pub use scaler::StandardScaler;
// Predictor and optimizer
pub use optimizer::{CampaignOptimizer, DEFAULT_BID_STEP, DEFAULT_CONFIDENCE, keyword_action};
pub use predictor::RoiPredictor;
// Progress reporting types
pub use progress::{ParseTrainingStageError, ProgressCallback, ProgressUpdate, TrainingStage};
// Result types
pub use types::{
    BidRecommendation, CandidateScore, KeywordAction, TrainingMetrics, UnderperformingKeyword,
};

// Feature configuration is part of `PredictorConfig`
pub use bidwise_processing::{FeatureConfig, ImputationStrategy, UnknownCategoryPolicy};
