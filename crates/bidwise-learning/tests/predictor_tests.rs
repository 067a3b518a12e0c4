//! Integration tests for ROI predictor training, inference and persistence.
//!
//! These tests train small ensembles on synthetic campaign histories, so they
//! stay fast in debug builds.

use bidwise_learning::{
    ModelSpec, PredictorConfig, ProgressUpdate, RoiError, RoiPredictor, TrainingStage,
    UnknownCategoryPolicy,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

// ============================================================================
// Helper Functions
// ============================================================================

const CAMPAIGNS: [&str; 3] = ["alpha", "beta", "gamma"];
const TYPES: [&str; 3] = ["search", "display", "video"];

/// `days` daily rows for each of three campaigns, interleaved by day.
///
/// ROI depends on the campaign type and the bid, so both carry signal.
fn campaign_history(days: usize) -> DataFrame {
    let mut date = Vec::new();
    let mut campaign_id = Vec::new();
    let mut clicks = Vec::new();
    let mut impressions = Vec::new();
    let mut cost = Vec::new();
    let mut conversions = Vec::new();
    let mut current_bid = Vec::new();
    let mut campaign_type = Vec::new();
    let mut campaign_status = Vec::new();
    let mut roi = Vec::new();

    for day in 0..days {
        for c in 0..CAMPAIGNS.len() {
            let k = (day * 7 + c * 13) % 17;
            let bid = 0.5 + 0.1 * ((day + c) % 10) as f64;
            date.push(format!("2024-{:02}-{:02}", day / 28 % 12 + 1, day % 28 + 1));
            campaign_id.push(CAMPAIGNS[c].to_string());
            clicks.push((k * 3 + 1) as i64);
            impressions.push((100 + k * 40) as i64);
            cost.push(1.5 * k as f64 + c as f64);
            conversions.push((k % 4) as i64);
            current_bid.push(bid);
            campaign_type.push(TYPES[c].to_string());
            campaign_status.push(if day % 9 == 0 { "paused" } else { "active" }.to_string());
            roi.push(0.4 * c as f64 + bid);
        }
    }

    df! {
        "date" => date,
        "campaign_id" => campaign_id,
        "clicks" => clicks,
        "impressions" => impressions,
        "cost" => cost,
        "conversions" => conversions,
        "current_bid" => current_bid,
        "campaign_type" => campaign_type,
        "campaign_status" => campaign_status,
        "roi" => roi,
    }
    .unwrap()
}

fn small_config() -> PredictorConfig {
    PredictorConfig::builder()
        .cv_folds(3)
        .candidates(vec![
            ModelSpec::random_forest(10, 6, 2),
            ModelSpec::gradient_boosting(30, 3, 0.1),
        ])
        .build()
        .unwrap()
}

fn trained_predictor(config: PredictorConfig) -> RoiPredictor {
    let mut predictor = RoiPredictor::with_config(config).unwrap();
    predictor.train(&campaign_history(30)).unwrap();
    predictor
}

// ============================================================================
// Training
// ============================================================================

#[test]
fn test_training_is_deterministic() {
    let records = campaign_history(30);

    let mut first = RoiPredictor::with_config(small_config()).unwrap();
    let mut second = RoiPredictor::with_config(small_config()).unwrap();
    let first_metrics = first.train(&records).unwrap();
    let second_metrics = second.train(&records).unwrap();

    assert_eq!(first_metrics, second_metrics);
    assert_eq!(first.candidate_scores(), second.candidate_scores());
    assert_eq!(
        first.predict(&records).unwrap(),
        second.predict(&records).unwrap()
    );
}

#[test]
fn test_training_metrics() {
    let mut predictor = RoiPredictor::with_config(small_config()).unwrap();
    let metrics = predictor.train(&campaign_history(30)).unwrap();

    assert_eq!(metrics.training_samples + metrics.test_samples, 90);
    assert_eq!(metrics.test_samples, 18);
    assert!(metrics.mae >= 0.0);
    assert!(metrics.rmse >= metrics.mae);
    assert!(metrics.r2_score.is_finite());

    let selected: Vec<_> = predictor
        .candidate_scores()
        .iter()
        .filter(|c| c.selected)
        .collect();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].mean_score, metrics.cv_score);
    assert_eq!(Some(selected[0].name.as_str()), predictor.model_name());
}

#[test]
fn test_progress_reports_every_stage() {
    let updates: Arc<Mutex<Vec<ProgressUpdate>>> = Arc::default();
    let sink = Arc::clone(&updates);
    let mut predictor = RoiPredictor::with_config(small_config())
        .unwrap()
        .on_progress(move |update| sink.lock().unwrap().push(update));

    predictor.train(&campaign_history(30)).unwrap();

    let updates = updates.lock().unwrap();
    assert!(updates.windows(2).all(|w| w[0].progress <= w[1].progress));
    assert_eq!(updates.first().unwrap().stage, TrainingStage::Initializing);
    assert_eq!(updates.last().unwrap().stage, TrainingStage::Complete);
    assert_eq!(updates.last().unwrap().progress, 1.0);

    let selection: Vec<_> = updates
        .iter()
        .filter(|u| u.stage == TrainingStage::ModelSelection)
        .collect();
    assert_eq!(selection.len(), 2);
    assert_eq!(selection[0].current_model.as_deref(), Some("random_forest"));
    assert_eq!(selection[1].models_completed, Some((1, 2)));
}

#[test]
fn test_failed_training_keeps_previous_model() {
    let mut predictor = trained_predictor(small_config());
    let before = predictor.predict(&campaign_history(5)).unwrap();

    let err = predictor
        .train(&campaign_history(30).drop("roi").unwrap())
        .unwrap_err();
    assert!(matches!(err, RoiError::TargetNotFound(_)));

    assert!(predictor.is_trained());
    assert_eq!(predictor.predict(&campaign_history(5)).unwrap(), before);
}

// ============================================================================
// Inference
// ============================================================================

#[test]
fn test_predict_reconciles_missing_columns() {
    let predictor = trained_predictor(small_config());
    let records = campaign_history(4)
        .drop("current_bid")
        .unwrap()
        .drop("campaign_status")
        .unwrap();

    let predictions = predictor.predict(&records).unwrap();
    assert_eq!(predictions.len(), records.height());
    assert!(predictions.iter().all(|p| p.is_finite()));
}

#[test]
fn test_predict_ignores_extra_columns() {
    let predictor = trained_predictor(small_config());
    let records = campaign_history(4);
    let mut extended = records.clone();
    extended
        .with_column(Column::new("quality_score".into(), vec![7.0; records.height()]))
        .unwrap();

    assert_eq!(
        predictor.predict(&extended).unwrap(),
        predictor.predict(&records).unwrap()
    );
}

#[test]
fn test_predict_preserves_row_order() {
    let predictor = trained_predictor(small_config());
    let records = campaign_history(10);
    let predictions = predictor.predict(&records).unwrap();

    // Group rows by campaign, keeping each campaign's own order so the
    // rolling features of every row are unchanged.
    let order: Vec<usize> = (0..CAMPAIGNS.len())
        .flat_map(|c| (0..10).map(move |day| day * CAMPAIGNS.len() + c))
        .collect();
    let idx = IdxCa::from_vec(
        "idx".into(),
        order.iter().map(|&i| i as IdxSize).collect(),
    );
    let regrouped = records.take(&idx).unwrap();

    let expected: Vec<f64> = order.iter().map(|&i| predictions[i]).collect();
    assert_eq!(predictor.predict(&regrouped).unwrap(), expected);
}

#[test]
fn test_predict_does_not_mutate_predictor() {
    let predictor = trained_predictor(small_config());
    let records = campaign_history(6);
    let first = predictor.predict(&records).unwrap();
    let second = predictor.predict(&records).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unseen_category_policy() {
    let mut records = campaign_history(3);
    let types = vec!["shopping"; records.height()];
    records
        .with_column(Column::new("campaign_type".into(), types))
        .unwrap();

    let strict = trained_predictor(small_config());
    let err = strict.predict(&records).unwrap_err();
    assert_eq!(err.error_code(), "UNSEEN_CATEGORY");

    let mut config = small_config();
    config.features.unknown_category_policy = UnknownCategoryPolicy::Reserved;
    let lenient = trained_predictor(config);
    assert_eq!(lenient.predict(&records).unwrap().len(), records.height());
}

// ============================================================================
// Feature Importance
// ============================================================================

#[test]
fn test_feature_importance_ranking() {
    let predictor = trained_predictor(small_config());
    let ranked = predictor.get_feature_importance().unwrap();

    assert_eq!(ranked.len(), predictor.feature_columns().unwrap().len());
    assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
    let total: f64 = ranked.iter().map(|(_, score)| score).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_feature_importance_unavailable_for_ridge() {
    let config = PredictorConfig::builder()
        .cv_folds(3)
        .candidates(vec![ModelSpec::ridge(1.0)])
        .build()
        .unwrap();
    let predictor = trained_predictor(config);

    assert_eq!(predictor.model_name(), Some("ridge"));
    let err = predictor.get_feature_importance().unwrap_err();
    assert!(matches!(err, RoiError::ImportanceUnavailable { ref model } if model == "ridge"));
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_save_and_load_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roi_model.json");
    let predictor = trained_predictor(small_config());
    predictor.save_model(&path).unwrap();

    let mut restored = RoiPredictor::new();
    restored.load_model(&path).unwrap();

    let sample = campaign_history(8);
    assert!(restored.is_trained());
    assert_eq!(restored.feature_columns(), predictor.feature_columns());
    assert_eq!(restored.candidate_scores(), predictor.candidate_scores());
    assert_eq!(
        restored.predict(&sample).unwrap(),
        predictor.predict(&sample).unwrap()
    );
}

#[test]
fn test_load_restores_feature_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short_windows.json");

    let mut config = small_config();
    config.features.rolling_windows = vec![3];
    let predictor = trained_predictor(config);
    predictor.save_model(&path).unwrap();

    let mut restored = RoiPredictor::new();
    restored.load_model(&path).unwrap();
    assert_eq!(restored.config().features.rolling_windows, vec![3]);

    let sample = campaign_history(5);
    assert_eq!(
        restored.predict(&sample).unwrap(),
        predictor.predict(&sample).unwrap()
    );
}

#[test]
fn test_load_missing_file() {
    let mut predictor = RoiPredictor::new();
    let err = predictor
        .load_model("/nonexistent/path/roi_model.json")
        .unwrap_err();
    assert!(matches!(err, RoiError::ModelNotFound { .. }));
    assert!(!predictor.is_trained());
}

#[test]
fn test_failed_load_leaves_predictor_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, b"{\"format_version\": 1}").unwrap();

    let mut predictor = trained_predictor(small_config());
    let sample = campaign_history(4);
    let before = predictor.predict(&sample).unwrap();

    let err = predictor.load_model(&path).unwrap_err();
    assert_eq!(err.error_code(), "CORRUPT_MODEL");
    assert_eq!(predictor.predict(&sample).unwrap(), before);
}

#[test]
fn test_untrained_predictor_rejects_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("never_written.json");
    let predictor = RoiPredictor::new();

    assert!(predictor.predict(&campaign_history(2)).unwrap_err().is_not_trained());
    assert!(predictor.get_feature_importance().unwrap_err().is_not_trained());
    assert!(predictor.save_model(&path).unwrap_err().is_not_trained());
    assert!(!path.exists());
}
