//! The ROI predictor.
//!
//! [`RoiPredictor`] owns the whole fitted state needed to turn performance
//! records into ROI estimates: label encoders, training medians, the feature
//! scaler, the selected regression model and the canonical feature columns.
//!
//! # Lifecycle
//!
//! 1. Create with [`RoiPredictor::new()`] or [`RoiPredictor::with_config()`]
//! 2. Call [`train()`](RoiPredictor::train), or [`load_model()`](RoiPredictor::load_model)
//! 3. Call [`predict()`](RoiPredictor::predict) or hand the predictor to a
//!    [`CampaignOptimizer`](crate::CampaignOptimizer)
//!
//! # Example
//!
//! ```rust,ignore
//! use bidwise_learning::{PredictorConfig, RoiPredictor};
//!
//! let config = PredictorConfig::builder().cv_folds(5).build()?;
//! let mut predictor = RoiPredictor::with_config(config)?
//!     .on_progress(|u| println!("[{}] {:.0}%", u.stage, u.progress * 100.0));
//!
//! let metrics = predictor.train(&history)?;
//! println!("R² = {:.3}, CV = {:.3}", metrics.r2_score, metrics.cv_score);
//!
//! predictor.save_model("roi_model.json")?;
//! let estimates = predictor.predict(&todays_records)?;
//! ```
//!
//! # Thread Safety
//!
//! `RoiPredictor` is `Send + Sync`. [`predict()`](RoiPredictor::predict) takes
//! `&self` and never mutates the predictor, so concurrent predictions are fine.
//! Training and loading take `&mut self`.

use crate::bundle::{BUNDLE_FORMAT_VERSION, ModelBundle};
use crate::config::{ModelSpec, PredictorConfig};
use crate::error::{Result, RoiError};
use crate::metrics::{mean_absolute_error, r2_score, root_mean_squared_error};
use crate::models::{RegressionModel, Regressor};
use crate::progress::{ProgressCallback, ProgressUpdate, TrainingStage};
use crate::scaler::StandardScaler;
use crate::selection::{cross_validate, train_test_split};
use crate::types::{CandidateScore, TrainingMetrics};
use bidwise_processing::utils::numeric_values;
use bidwise_processing::{EncoderState, Medians, prepare_features, reconcile_columns};
use ndarray::{Array1, Array2, Axis};
use polars::prelude::DataFrame;
use std::path::Path;
use std::sync::Arc;

/// Fitted state produced by training or loading.
#[derive(Debug, Clone)]
struct FittedState {
    model: RegressionModel,
    scaler: StandardScaler,
    feature_columns: Vec<String>,
    candidate_scores: Vec<CandidateScore>,
}

/// Predicts ROI from campaign performance records.
///
/// See the [module documentation](self) for the lifecycle.
pub struct RoiPredictor {
    config: PredictorConfig,
    progress_callback: Option<ProgressCallback>,
    encoders: EncoderState,
    medians: Medians,
    fitted: Option<FittedState>,
}

impl std::fmt::Debug for RoiPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoiPredictor")
            .field("config", &self.config)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .field("encoders", &self.encoders)
            .field("is_trained", &self.is_trained())
            .field("model", &self.model_name())
            .finish()
    }
}

impl Default for RoiPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl RoiPredictor {
    /// Untrained predictor with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: PredictorConfig::default(),
            progress_callback: None,
            encoders: EncoderState::new(),
            medians: Medians::new(),
            fitted: None,
        }
    }

    /// Untrained predictor with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RoiError::InvalidConfig`] if `config` fails validation.
    pub fn with_config(config: PredictorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Set a callback that receives [`ProgressUpdate`]s during training.
    #[must_use]
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Set a shared progress callback.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    #[must_use]
    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Returns `true` once [`train()`](Self::train) or
    /// [`load_model()`](Self::load_model) has succeeded.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }

    /// Canonical feature columns, in model input order.
    #[must_use]
    pub fn feature_columns(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|f| f.feature_columns.as_slice())
    }

    /// Name of the selected model family.
    #[must_use]
    pub fn model_name(&self) -> Option<&'static str> {
        self.fitted.as_ref().map(|f| f.model.name())
    }

    /// Cross-validation summary of every candidate from the last training run.
    ///
    /// Empty until the predictor is trained or loaded.
    #[must_use]
    pub fn candidate_scores(&self) -> &[CandidateScore] {
        self.fitted
            .as_ref()
            .map_or(&[], |f| f.candidate_scores.as_slice())
    }

    // =========================================================================
    // Feature preparation
    // =========================================================================

    /// Derive the numeric feature table for `records`.
    ///
    /// Categorical columns without an encoder get one fitted on this batch;
    /// existing encoders are reused as-is. Once trained, missing values are
    /// filled according to the configured imputation strategy.
    pub fn prepare_features(&mut self, records: &DataFrame) -> Result<DataFrame> {
        let training_medians = self.fitted.as_ref().map(|_| &self.medians);
        let prepared = prepare_features(
            records,
            &mut self.encoders,
            &self.config.features,
            training_medians,
        )?;
        Ok(prepared.frame)
    }

    // =========================================================================
    // Training
    // =========================================================================

    /// Train on historical records and return held-out metrics.
    ///
    /// Encoders are refitted from scratch on `records`. The predictor's
    /// fitted state is only replaced if training succeeds.
    ///
    /// # Errors
    ///
    /// - [`TargetNotFound`](RoiError::TargetNotFound): the target column is absent
    /// - [`InvalidData`](RoiError::InvalidData): a target value is missing or not
    ///   finite, or there are too few rows for the split and fold count
    /// - [`Processing`](RoiError::Processing): feature preparation failed
    /// - [`TrainingFailed`](RoiError::TrainingFailed): no candidate could be cross-validated
    pub fn train(&mut self, records: &DataFrame) -> Result<TrainingMetrics> {
        let config = &self.config;
        self.report(TrainingStage::Initializing, 0.0, "Validating training data");
        config.validate()?;

        let target_name = config.target_column();
        if records.column(target_name).is_err() {
            return Err(RoiError::TargetNotFound(target_name.to_string()));
        }
        let y = target_values(records, target_name)?;

        self.report(TrainingStage::Preprocessing, 0.1, "Deriving features");
        let mut encoders = EncoderState::new();
        let prepared = prepare_features(records, &mut encoders, &config.features, None)?;
        let feature_columns = prepared.column_names();
        let x = feature_matrix(&prepared.frame)?;

        let split = train_test_split(x.nrows(), config.test_size, config.random_seed)?;
        if split.train.len() < config.cv_folds {
            return Err(RoiError::InvalidData(format!(
                "{} training rows cannot be split into {} folds",
                split.train.len(),
                config.cv_folds
            )));
        }
        let y_train = y.select(Axis(0), &split.train);
        let y_test = y.select(Axis(0), &split.test);

        let scaler = StandardScaler::fit(&x.select(Axis(0), &split.train))?;
        let x_train = scaler.transform(&x.select(Axis(0), &split.train))?;
        let x_test = scaler.transform(&x.select(Axis(0), &split.test))?;
        tracing::info!(
            rows = x.nrows(),
            features = feature_columns.len(),
            training_samples = split.train.len(),
            test_samples = split.test.len(),
            "prepared training data"
        );

        let (winner, cv_score, candidate_scores) = self.select_candidate(&x_train, &y_train)?;

        self.report_model(
            TrainingStage::Training,
            0.8,
            "Refitting selected model",
            winner.name(),
            None,
        );
        let mut model = RegressionModel::from_spec(&winner, self.config.random_seed);
        model.fit(&x_train, &y_train)?;

        self.report(TrainingStage::Evaluation, 0.9, "Evaluating on held-out rows");
        let predicted = model.predict(&x_test)?;
        let metrics = TrainingMetrics {
            r2_score: r2_score(&y_test, &predicted),
            mae: mean_absolute_error(&y_test, &predicted),
            rmse: root_mean_squared_error(&y_test, &predicted),
            cv_score,
            training_samples: split.train.len(),
            test_samples: split.test.len(),
        };

        tracing::info!(
            model = model.name(),
            r2 = metrics.r2_score,
            mae = metrics.mae,
            rmse = metrics.rmse,
            cv_score = metrics.cv_score,
            "training complete"
        );

        self.encoders = encoders;
        self.medians = prepared.medians;
        self.fitted = Some(FittedState {
            model,
            scaler,
            feature_columns,
            candidate_scores,
        });

        self.report(TrainingStage::Complete, 1.0, "Training complete");
        Ok(metrics)
    }

    /// Cross-validate every candidate and pick the highest mean score. The
    /// first candidate wins ties.
    fn select_candidate(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(ModelSpec, f64, Vec<CandidateScore>)> {
        let config = &self.config;
        let total = config.candidates.len();
        let mut scores = Vec::with_capacity(total);
        let mut best: Option<(usize, f64)> = None;
        let mut last_error = None;

        for (i, spec) in config.candidates.iter().enumerate() {
            self.report_model(
                TrainingStage::ModelSelection,
                0.2 + 0.6 * i as f64 / total as f64,
                &format!("Cross-validating {}", spec.name()),
                spec.name(),
                Some((i, total)),
            );

            match cross_validate(spec, config.random_seed, x, y, config.cv_folds) {
                Ok(cv) => {
                    tracing::debug!(
                        candidate = spec.name(),
                        mean = cv.mean_score,
                        std = cv.std_score,
                        "cross-validated candidate"
                    );
                    if best.is_none_or(|(_, score)| cv.mean_score > score) {
                        best = Some((scores.len(), cv.mean_score));
                    }
                    scores.push((spec.clone(), cv.mean_score, cv.std_score));
                }
                Err(e) => {
                    tracing::warn!(candidate = spec.name(), error = %e, "candidate failed");
                    last_error = Some(e);
                }
            }
        }

        let Some((best_index, best_score)) = best else {
            let reason = last_error.map_or_else(|| "no candidates".to_string(), |e| e.to_string());
            return Err(RoiError::TrainingFailed(format!(
                "no candidate model could be cross-validated: {reason}"
            )));
        };

        let summaries = scores
            .iter()
            .enumerate()
            .map(|(i, (spec, mean_score, std_score))| CandidateScore {
                name: spec.name().to_string(),
                mean_score: *mean_score,
                std_score: *std_score,
                selected: i == best_index,
            })
            .collect();

        let winner = scores[best_index].0.clone();
        tracing::info!(model = winner.name(), cv_score = best_score, "selected model");
        Ok((winner, best_score, summaries))
    }

    // =========================================================================
    // Inference
    // =========================================================================

    /// Predict ROI for every row of `records`, in row order.
    ///
    /// The batch is aligned with the training columns: missing feature columns
    /// are zero-filled and unknown ones dropped. The predictor is not modified;
    /// categorical columns without a trained encoder are encoded with a
    /// throwaway encoder fitted on this batch.
    ///
    /// # Errors
    ///
    /// Returns [`RoiError::NotTrained`] before any work if the predictor is untrained.
    pub fn predict(&self, records: &DataFrame) -> Result<Vec<f64>> {
        let fitted = self.fitted.as_ref().ok_or(RoiError::NotTrained)?;

        let mut encoders = self.encoders.clone();
        let prepared = prepare_features(
            records,
            &mut encoders,
            &self.config.features,
            Some(&self.medians),
        )?;
        let aligned = reconcile_columns(&prepared.frame, &fitted.feature_columns)?;
        let x = fitted.scaler.transform(&feature_matrix(&aligned)?)?;
        Ok(fitted.model.predict(&x)?.to_vec())
    }

    /// Feature names paired with the model's importance scores, most
    /// important first.
    ///
    /// # Errors
    ///
    /// - [`RoiError::NotTrained`] if the predictor is untrained
    /// - [`RoiError::ImportanceUnavailable`] if the selected model family has
    ///   no per-feature importances
    pub fn get_feature_importance(&self) -> Result<Vec<(String, f64)>> {
        let fitted = self.fitted.as_ref().ok_or(RoiError::NotTrained)?;
        let importances =
            fitted
                .model
                .feature_importances()
                .ok_or_else(|| RoiError::ImportanceUnavailable {
                    model: fitted.model.name().to_string(),
                })?;

        let mut ranked: Vec<(String, f64)> = fitted
            .feature_columns
            .iter()
            .cloned()
            .zip(importances)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ranked)
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Write the fitted state to `path` as a single bundle.
    ///
    /// # Errors
    ///
    /// Returns [`RoiError::NotTrained`] without touching `path` if the
    /// predictor is untrained.
    pub fn save_model(&self, path: impl AsRef<Path>) -> Result<()> {
        let fitted = self.fitted.as_ref().ok_or(RoiError::NotTrained)?;
        let bundle = ModelBundle {
            format_version: BUNDLE_FORMAT_VERSION,
            model: fitted.model.clone(),
            scaler: fitted.scaler.clone(),
            encoders: self.encoders.clone(),
            medians: self.medians.clone(),
            feature_columns: fitted.feature_columns.clone(),
            feature_config: self.config.features.clone(),
            candidate_scores: fitted.candidate_scores.clone(),
            is_trained: true,
        };
        bundle.save(path)
    }

    /// Replace the fitted state with the bundle stored at `path`.
    ///
    /// The bundle's feature configuration replaces the current one. On any
    /// error the predictor is left exactly as it was.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let bundle = ModelBundle::load(path)?;

        self.config.features = bundle.feature_config;
        self.encoders = bundle.encoders;
        self.medians = bundle.medians;
        self.fitted = Some(FittedState {
            model: bundle.model,
            scaler: bundle.scaler,
            feature_columns: bundle.feature_columns,
            candidate_scores: bundle.candidate_scores,
        });
        Ok(())
    }

    // =========================================================================
    // Progress
    // =========================================================================

    fn report(&self, stage: TrainingStage, progress: f64, message: &str) {
        if let Some(callback) = &self.progress_callback {
            callback(ProgressUpdate {
                stage,
                progress,
                message: message.to_string(),
                ..ProgressUpdate::default()
            });
        }
    }

    fn report_model(
        &self,
        stage: TrainingStage,
        progress: f64,
        message: &str,
        model: &str,
        models_completed: Option<(usize, usize)>,
    ) {
        if let Some(callback) = &self.progress_callback {
            callback(ProgressUpdate {
                stage,
                progress,
                message: message.to_string(),
                current_model: Some(model.to_string()),
                models_completed,
            });
        }
    }
}

static_assertions::assert_impl_all!(RoiPredictor: Send, Sync);

/// Target values as a vector, rejecting missing and non-finite entries.
fn target_values(records: &DataFrame, target: &str) -> Result<Array1<f64>> {
    numeric_values(records, target)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(RoiError::InvalidData(format!(
                "target '{target}' is missing or not finite at row {row}"
            ))),
        })
        .collect()
}

/// Row-major matrix of a fully numeric, null-free feature table.
fn feature_matrix(frame: &DataFrame) -> Result<Array2<f64>> {
    let mut x = Array2::zeros((frame.height(), frame.width()));
    for (j, name) in frame.get_column_names().iter().enumerate() {
        for (i, value) in numeric_values(frame, name.as_str())?.into_iter().enumerate() {
            x[[i, j]] = value.ok_or_else(|| {
                RoiError::InvalidData(format!("feature '{name}' has a missing value at row {i}"))
            })?;
        }
    }
    Ok(x)
}
