//! Model bundle persistence.
//!
//! A [`ModelBundle`] is everything a trained [`RoiPredictor`](crate::RoiPredictor)
//! needs to predict: the fitted model, the scaler, the label encoders, the
//! training medians and the ordered feature columns. It is stored as a single
//! JSON document. Floats are written with round-trip precision, so a reloaded
//! bundle predicts bit-identically.
//!
//! # Atomicity
//!
//! [`save()`](ModelBundle::save) writes to a temporary file next to the
//! destination and renames it into place, so readers never observe a partial
//! bundle. [`load()`](ModelBundle::load) validates the whole document before
//! returning it.

use crate::error::{Result, RoiError};
use crate::models::{RegressionModel, Regressor};
use crate::scaler::StandardScaler;
use crate::types::CandidateScore;
use bidwise_processing::{EncoderState, FeatureConfig, Medians};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Version written into every bundle. Bundles with another version are rejected.
pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// The complete fitted state of a trained predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub format_version: u32,
    pub model: RegressionModel,
    pub scaler: StandardScaler,
    pub encoders: EncoderState,
    /// Fill values recorded on the training batch.
    pub medians: Medians,
    /// Canonical feature columns, in model input order.
    pub feature_columns: Vec<String>,
    pub feature_config: FeatureConfig,
    /// Cross-validation results of every candidate considered in training.
    pub candidate_scores: Vec<CandidateScore>,
    pub is_trained: bool,
}

impl ModelBundle {
    /// Loads and validates a bundle from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`RoiError::ModelNotFound`] if `path` does not exist
    /// - [`RoiError::Io`] if the file cannot be read
    /// - [`RoiError::CorruptModel`] if the content is not a usable bundle
    #[must_use = "returns the loaded bundle; use it or handle the error"]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RoiError::ModelNotFound {
                path: path.display().to_string(),
            });
        }

        let bytes = std::fs::read(path)?;
        let bundle = Self::from_bytes(&bytes)?;
        tracing::info!(
            path = %path.display(),
            model = bundle.model_name(),
            features = bundle.feature_columns.len(),
            "loaded model bundle"
        );
        Ok(bundle)
    }

    /// Writes the bundle to `path`, replacing any existing file atomically.
    ///
    /// The parent directory must exist.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(&bytes)?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|e| e.error)?;

        tracing::info!(
            path = %path.display(),
            model = self.model_name(),
            bytes = bytes.len(),
            "saved model bundle"
        );
        Ok(())
    }

    /// Serializes the bundle to JSON bytes.
    #[must_use = "returns serialized bundle bytes; use them or handle the error"]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Deserializes and validates a bundle produced by [`to_bytes()`](Self::to_bytes).
    #[must_use = "returns the loaded bundle; use it or handle the error"]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bundle: Self =
            serde_json::from_slice(bytes).map_err(|e| RoiError::CorruptModel(e.to_string()))?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Name of the stored model family.
    #[must_use]
    pub fn model_name(&self) -> &'static str {
        self.model.name()
    }

    fn validate(&self) -> Result<()> {
        if self.format_version != BUNDLE_FORMAT_VERSION {
            return Err(RoiError::CorruptModel(format!(
                "unsupported format version {} (expected {BUNDLE_FORMAT_VERSION})",
                self.format_version
            )));
        }
        if !self.is_trained {
            return Err(RoiError::CorruptModel(
                "bundle is not marked as trained".to_string(),
            ));
        }
        if self.feature_columns.is_empty() {
            return Err(RoiError::CorruptModel(
                "bundle has no feature columns".to_string(),
            ));
        }
        if self.scaler.n_features() != self.feature_columns.len() {
            return Err(RoiError::CorruptModel(format!(
                "scaler has {} features but the bundle lists {} columns",
                self.scaler.n_features(),
                self.feature_columns.len()
            )));
        }
        self.feature_config
            .validate()
            .map_err(|e| RoiError::CorruptModel(e.to_string()))
    }
}
