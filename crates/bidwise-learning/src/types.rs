//! Common types used throughout the bidwise-learning crate.
//!
//! This module defines the records returned by training and by the optimizer.
//!
//! # Overview
//!
//! - [`TrainingMetrics`]: result of [`RoiPredictor::train()`](crate::RoiPredictor::train)
//! - [`CandidateScore`]: cross-validation summary of one candidate model
//! - [`BidRecommendation`]: one row of [`CampaignOptimizer::optimize_bids()`](crate::CampaignOptimizer::optimize_bids)
//! - [`UnderperformingKeyword`]: one row of
//!   [`CampaignOptimizer::identify_underperforming_keywords()`](crate::CampaignOptimizer::identify_underperforming_keywords)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Evaluation of a freshly trained predictor.
///
/// Serializes with the fixed keys `r2_score`, `mae`, `rmse`, `cv_score`,
/// `training_samples` and `test_samples`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// R² on the held-out test partition.
    pub r2_score: f64,

    /// Mean absolute error on the test partition.
    pub mae: f64,

    /// Root-mean-squared error on the test partition.
    pub rmse: f64,

    /// Mean cross-validated R² of the selected candidate.
    pub cv_score: f64,

    /// Rows in the training partition.
    pub training_samples: usize,

    /// Rows in the test partition.
    pub test_samples: usize,
}

/// Cross-validation summary of one candidate model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Model family name (e.g., "random_forest").
    pub name: String,

    /// Mean R² across folds.
    pub mean_score: f64,

    /// Standard deviation of R² across folds.
    pub std_score: f64,

    /// Whether this candidate was selected.
    pub selected: bool,
}

/// Suggested bid change for one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidRecommendation {
    pub campaign_id: String,
    pub keyword_id: Option<String>,
    pub current_bid: f64,
    pub recommended_bid: f64,
    /// Relative change, e.g. `0.1` for a 10% raise.
    pub bid_change: f64,
    /// Predicted ROI at the current bid.
    pub current_roi: f64,
    /// Predicted ROI at the recommended bid.
    pub predicted_roi: f64,
    pub roi_improvement: f64,
    /// Fixed placeholder set on the optimizer. Not a calibrated probability.
    pub confidence: f64,
}

/// Action suggested for an underperforming keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordAction {
    /// Stop spending on the keyword.
    Pause,
    /// Keep the keyword but bid less.
    ReduceBid,
}

impl KeywordAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordAction::Pause => "pause",
            KeywordAction::ReduceBid => "reduce_bid",
        }
    }
}

impl fmt::Display for KeywordAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row whose predicted ROI is below the threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderperformingKeyword {
    pub keyword_id: Option<String>,
    pub keyword_text: Option<String>,
    pub campaign_id: String,
    /// Predicted ROI.
    pub current_roi: f64,
    pub cost: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub recommendation: KeywordAction,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_metrics_keys() {
        let metrics = TrainingMetrics {
            r2_score: 0.5,
            mae: 0.1,
            rmse: 0.2,
            cv_score: 0.4,
            training_samples: 80,
            test_samples: 20,
        };
        let json = serde_json::to_value(&metrics).unwrap();
        let mut keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["cv_score", "mae", "r2_score", "rmse", "test_samples", "training_samples"]
        );
    }

    #[test]
    fn test_keyword_action_serialization() {
        assert_eq!(
            serde_json::to_string(&KeywordAction::ReduceBid).unwrap(),
            "\"reduce_bid\""
        );
        assert_eq!(KeywordAction::Pause.to_string(), "pause");
    }
}
