//! Bid optimization on top of a trained [`RoiPredictor`].
//!
//! [`CampaignOptimizer`] borrows a predictor and never modifies it. It offers
//! two analyses:
//!
//! - [`optimize_bids()`](CampaignOptimizer::optimize_bids): a brute-force local
//!   search over relative bid changes, one single-row prediction per candidate
//! - [`identify_underperforming_keywords()`](CampaignOptimizer::identify_underperforming_keywords):
//!   rows whose predicted ROI falls below a threshold
//!
//! # Example
//!
//! ```rust,ignore
//! use bidwise_learning::{CampaignOptimizer, RoiPredictor};
//!
//! let mut predictor = RoiPredictor::new();
//! predictor.load_model("roi_model.json")?;
//!
//! let optimizer = CampaignOptimizer::new(&predictor);
//! for rec in optimizer.optimize_bids(&keywords, 1.5, 0.2)? {
//!     println!("{}: {:.2} -> {:.2}", rec.campaign_id, rec.current_bid, rec.recommended_bid);
//! }
//! ```

use crate::error::{Result, RoiError};
use crate::predictor::RoiPredictor;
use crate::types::{BidRecommendation, KeywordAction, UnderperformingKeyword};
use bidwise_processing::schema::{
    CAMPAIGN_ID, CLICKS, CONVERSIONS, COST, CURRENT_BID, KEYWORD_ID, KEYWORD_TEXT,
};
use bidwise_processing::utils::{numeric_values, string_values};
use polars::prelude::{Column, DataFrame};

/// Default relative bid step of the search grid.
pub const DEFAULT_BID_STEP: f64 = 0.05;

/// Default confidence attached to every recommendation.
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

/// Predicted ROI below which an underperforming keyword should be paused.
pub const PAUSE_ROI: f64 = 0.5;

/// Slack for deciding whether `max_bid_change` lies on the step grid.
const GRID_TOLERANCE: f64 = 1e-9;

/// Bid search and keyword triage for a trained predictor.
#[derive(Debug, Clone, Copy)]
pub struct CampaignOptimizer<'a> {
    predictor: &'a RoiPredictor,
    bid_step: f64,
    confidence: f64,
}

impl<'a> CampaignOptimizer<'a> {
    #[must_use]
    pub fn new(predictor: &'a RoiPredictor) -> Self {
        Self {
            predictor,
            bid_step: DEFAULT_BID_STEP,
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    /// Set the relative bid step of the search grid (default: 0.05).
    #[must_use]
    pub fn bid_step(mut self, step: f64) -> Self {
        self.bid_step = step;
        self
    }

    /// Set the confidence reported on recommendations (default: 0.8).
    ///
    /// This is a fixed label copied onto every recommendation, not a
    /// calibrated probability.
    #[must_use]
    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Recommend bid changes that raise predicted ROI to at least `target_roi`.
    ///
    /// Each row is handled independently. Its baseline is the batch prediction
    /// for the unmodified row. Relative changes on the grid
    /// `k * bid_step` within `[-max_bid_change, max_bid_change]`, plus both
    /// endpoints, are tried one at a time on a single-row copy with
    /// `current_bid` scaled by `1 + change`. The unchanged bid is tried first,
    /// so it wins ties. The best candidate must strictly beat the baseline and
    /// reach `target_roi`; a row is only recommended when that candidate
    /// actually changes the bid.
    ///
    /// Rows with a missing or non-positive `current_bid` are skipped. The
    /// result is sorted by `roi_improvement`, largest first.
    ///
    /// # Errors
    ///
    /// - [`RoiError::NotTrained`] if the predictor is untrained
    /// - [`RoiError::InvalidConfig`] for a non-finite target, a `max_bid_change`
    ///   outside `[0, 1)`, or an invalid bid step
    /// - [`RoiError::Processing`] if `current_bid` or another required column is missing
    pub fn optimize_bids(
        &self,
        records: &DataFrame,
        target_roi: f64,
        max_bid_change: f64,
    ) -> Result<Vec<BidRecommendation>> {
        if !self.predictor.is_trained() {
            return Err(RoiError::NotTrained);
        }
        if !target_roi.is_finite() {
            return Err(RoiError::InvalidConfig(
                "target_roi must be finite".to_string(),
            ));
        }
        let changes = bid_changes(max_bid_change, self.bid_step)?;

        let bids = numeric_values(records, CURRENT_BID)?;
        let campaigns = string_values(records, CAMPAIGN_ID)?;
        let keywords = optional_strings(records, KEYWORD_ID)?;
        let baseline = self.predictor.predict(records)?;

        let mut recommendations = Vec::new();
        for (row, current_roi) in baseline.into_iter().enumerate() {
            let current_bid = match bids[row] {
                Some(bid) if bid > 0.0 => bid,
                other => {
                    tracing::warn!(row, bid = ?other, "skipping row without a positive current bid");
                    continue;
                }
            };

            let mut best: Option<(f64, f64)> = None;
            let mut best_roi = current_roi;
            for &change in &changes {
                let new_bid = current_bid * (1.0 + change);
                let mut candidate = records.slice(row as i64, 1);
                candidate.with_column(Column::new(CURRENT_BID.into(), [new_bid]))?;
                let predicted = self.predictor.predict(&candidate)?[0];

                if predicted > best_roi && predicted >= target_roi {
                    best_roi = predicted;
                    best = Some((change, new_bid));
                }
            }

            // Keeping the bid scored best.
            let Some((change, recommended_bid)) = best.filter(|&(change, _)| change != 0.0)
            else {
                continue;
            };
            tracing::debug!(
                row,
                current_bid,
                recommended_bid,
                current_roi,
                predicted_roi = best_roi,
                "found better bid"
            );
            recommendations.push(BidRecommendation {
                campaign_id: campaigns[row].clone().unwrap_or_default(),
                keyword_id: keywords[row].clone(),
                current_bid,
                recommended_bid,
                bid_change: change,
                current_roi,
                predicted_roi: best_roi,
                roi_improvement: best_roi - current_roi,
                confidence: self.confidence,
            });
        }

        rank_by_improvement(&mut recommendations);
        tracing::info!(
            rows = records.height(),
            recommendations = recommendations.len(),
            "bid optimization complete"
        );
        Ok(recommendations)
    }

    /// Flag rows whose predicted ROI is below `roi_threshold`.
    ///
    /// A flagged row gets [`KeywordAction::Pause`] if its predicted ROI is
    /// below 0.5 and [`KeywordAction::ReduceBid`] otherwise. The result is
    /// sorted by cost, most expensive first.
    pub fn identify_underperforming_keywords(
        &self,
        records: &DataFrame,
        roi_threshold: f64,
    ) -> Result<Vec<UnderperformingKeyword>> {
        if !self.predictor.is_trained() {
            return Err(RoiError::NotTrained);
        }
        let predictions = self.predictor.predict(records)?;

        let campaigns = string_values(records, CAMPAIGN_ID)?;
        let keyword_ids = optional_strings(records, KEYWORD_ID)?;
        let keyword_texts = optional_strings(records, KEYWORD_TEXT)?;
        let cost = numeric_values(records, COST)?;
        let clicks = numeric_values(records, CLICKS)?;
        let conversions = numeric_values(records, CONVERSIONS)?;

        let mut flagged: Vec<UnderperformingKeyword> = predictions
            .into_iter()
            .enumerate()
            .filter_map(|(row, roi)| {
                keyword_action(roi, roi_threshold).map(|recommendation| UnderperformingKeyword {
                    keyword_id: keyword_ids[row].clone(),
                    keyword_text: keyword_texts[row].clone(),
                    campaign_id: campaigns[row].clone().unwrap_or_default(),
                    current_roi: roi,
                    cost: cost[row].unwrap_or(0.0),
                    clicks: clicks[row].unwrap_or(0.0),
                    conversions: conversions[row].unwrap_or(0.0),
                    recommendation,
                })
            })
            .collect();

        flagged.sort_by(|a, b| b.cost.total_cmp(&a.cost));
        tracing::info!(
            rows = records.height(),
            flagged = flagged.len(),
            threshold = roi_threshold,
            "underperforming keyword scan complete"
        );
        Ok(flagged)
    }
}

/// Action for a row with predicted ROI `roi`, or `None` if it meets the threshold.
#[must_use]
pub fn keyword_action(roi: f64, roi_threshold: f64) -> Option<KeywordAction> {
    if roi >= roi_threshold {
        None
    } else if roi < PAUSE_ROI {
        Some(KeywordAction::Pause)
    } else {
        Some(KeywordAction::ReduceBid)
    }
}

/// Relative bid changes to try: the zero change first, then the rest ascending.
fn bid_changes(max_bid_change: f64, step: f64) -> Result<Vec<f64>> {
    if !(0.0..1.0).contains(&max_bid_change) {
        return Err(RoiError::InvalidConfig(format!(
            "max_bid_change must be in [0, 1), got {max_bid_change}"
        )));
    }
    if !(step > 0.0 && step.is_finite()) {
        return Err(RoiError::InvalidConfig(format!(
            "bid step must be positive, got {step}"
        )));
    }

    let steps = (max_bid_change / step + GRID_TOLERANCE).floor() as i64;
    let mut changes = vec![0.0];
    changes.extend((-steps..=steps).filter(|&k| k != 0).map(|k| k as f64 * step));
    if max_bid_change - steps as f64 * step > GRID_TOLERANCE {
        changes.insert(1, -max_bid_change);
        changes.push(max_bid_change);
    }
    Ok(changes)
}

fn rank_by_improvement(recommendations: &mut [BidRecommendation]) {
    recommendations.sort_by(|a, b| b.roi_improvement.total_cmp(&a.roi_improvement));
}

/// String values of an optional column; all `None` when it is absent.
fn optional_strings(records: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    if records.column(name).is_err() {
        return Ok(vec![None; records.height()]);
    }
    Ok(string_values(records, name)?)
}
