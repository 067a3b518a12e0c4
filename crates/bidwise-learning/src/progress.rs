//! Progress reporting types for ROI model training.
//!
//! This module defines types for tracking and reporting progress during
//! [`RoiPredictor::train()`](crate::RoiPredictor::train), including
//! [`TrainingStage`], [`ProgressUpdate`], and the [`ProgressCallback`] type alias.
//!
//! # Overview
//!
//! Progress reporting allows you to monitor training as it runs:
//! - Track which stage of training is currently executing
//! - Get overall progress (0.0 to 1.0)
//! - See which candidate model is being cross-validated
//! - Track how many candidates have been evaluated
//!
//! # Example
//!
//! ```
//! use bidwise_learning::{ProgressUpdate, RoiPredictor};
//!
//! let predictor = RoiPredictor::new().on_progress(|update: ProgressUpdate| {
//!     println!(
//!         "[{}] {:.0}% - {}",
//!         update.stage,
//!         update.progress * 100.0,
//!         update.message
//!     );
//!     if let Some((done, total)) = update.models_completed {
//!         println!("  Candidates: {}/{}", done, total);
//!     }
//! });
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The current stage of training.
///
/// Training progresses through these stages in order:
///
/// 1. [`Initializing`](Self::Initializing) - Validating configuration and input
/// 2. [`Preprocessing`](Self::Preprocessing) - Deriving features, splitting and scaling
/// 3. [`ModelSelection`](Self::ModelSelection) - Cross-validating candidate models
/// 4. [`Training`](Self::Training) - Refitting the winner on the training partition
/// 5. [`Evaluation`](Self::Evaluation) - Scoring on the held-out partition
/// 6. [`Complete`](Self::Complete) - Training finished successfully
///
/// This enum is marked `#[non_exhaustive]` to allow adding new stages in future versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum TrainingStage {
    #[default]
    Initializing,
    Preprocessing,
    ModelSelection,
    Training,
    Evaluation,
    /// Terminal state. The predictor is trained.
    Complete,
}

impl TrainingStage {
    /// Returns the snake_case name of the stage.
    ///
    /// # Examples
    ///
    /// ```
    /// use bidwise_learning::TrainingStage;
    ///
    /// assert_eq!(TrainingStage::Training.as_str(), "training");
    /// assert_eq!(TrainingStage::ModelSelection.as_str(), "model_selection");
    /// ```
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingStage::Initializing => "initializing",
            TrainingStage::Preprocessing => "preprocessing",
            TrainingStage::ModelSelection => "model_selection",
            TrainingStage::Training => "training",
            TrainingStage::Evaluation => "evaluation",
            TrainingStage::Complete => "complete",
        }
    }

    /// Returns `true` for [`Complete`](Self::Complete).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TrainingStage::Complete)
    }
}

impl fmt::Display for TrainingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for parsing a [`TrainingStage`] from a string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTrainingStageError {
    invalid_value: String,
}

impl ParseTrainingStageError {
    /// Returns the invalid value that caused the parse error.
    #[must_use]
    pub fn invalid_value(&self) -> &str {
        &self.invalid_value
    }
}

impl fmt::Display for ParseTrainingStageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid training stage: '{}'. Valid values are: initializing, preprocessing, \
             model_selection, training, evaluation, complete",
            self.invalid_value
        )
    }
}

impl std::error::Error for ParseTrainingStageError {}

impl FromStr for TrainingStage {
    type Err = ParseTrainingStageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initializing" => Ok(TrainingStage::Initializing),
            "preprocessing" => Ok(TrainingStage::Preprocessing),
            "model_selection" => Ok(TrainingStage::ModelSelection),
            "training" => Ok(TrainingStage::Training),
            "evaluation" => Ok(TrainingStage::Evaluation),
            "complete" => Ok(TrainingStage::Complete),
            _ => Err(ParseTrainingStageError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

/// A progress update sent during training.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressUpdate {
    /// The current training stage.
    pub stage: TrainingStage,

    /// Overall progress from 0.0 to 1.0, non-decreasing within one run.
    pub progress: f64,

    /// Human-readable status message.
    pub message: String,

    /// Candidate currently being cross-validated or refitted, if any.
    pub current_model: Option<String>,

    /// Candidates evaluated so far and in total: `(completed, total)`.
    ///
    /// Only populated during [`ModelSelection`](TrainingStage::ModelSelection).
    pub models_completed: Option<(usize, usize)>,
}

/// Type alias for a progress callback function.
///
/// Callbacks must be `Send + Sync` so a predictor carrying one can be moved
/// to a worker thread.
///
/// # Note
///
/// The callback runs on the training thread and should return quickly.
pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);
