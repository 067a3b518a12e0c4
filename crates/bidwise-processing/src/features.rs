//! Feature preparation for performance records.
//!
//! [`prepare_features`] turns a table of performance records into a purely
//! numeric feature table. The steps run in a fixed order:
//!
//! 1. **Temporal**: hour, weekday (0 = Monday), month and a weekend flag from `date`.
//! 2. **Ratios**: click-through rate, cost per click and conversion rate. A zero
//!    denominator is replaced by 1 so no ratio is ever infinite or NaN.
//! 3. **Rolling averages**: trailing means of cost, clicks and CTR per
//!    `campaign_id`, one set per configured window.
//! 4. **Encoding**: categorical columns become `{column}_encoded` codes using
//!    the caller's [`EncoderState`].
//! 5. **Imputation**: remaining gaps are filled with column medians.
//!
//! Numeric input columns other than the target are passed through ahead of
//! the derived columns. Everything else is dropped.
//!
//! The function holds no state of its own. Encoders are owned by the caller
//! and passed in by reference, so independent predictors never share them.

use crate::config::FeatureConfig;
use crate::encoding::{EncoderState, NULL_CATEGORY};
use crate::error::Result;
use crate::imputation::{Medians, impute_median};
use crate::rolling::rolling_mean_by_group;
use crate::schema::{CAMPAIGN_ID, CLICKS, CONVERSIONS, COST, DATE, IMPRESSIONS, validate_records};
use crate::temporal::temporal_features;
use crate::utils::{float_column, is_numeric_dtype, numeric_values, string_values};
use polars::prelude::*;
use std::collections::HashSet;

pub const HOUR: &str = "hour";
pub const DAY_OF_WEEK: &str = "day_of_week";
pub const MONTH: &str = "month";
pub const IS_WEEKEND: &str = "is_weekend";
pub const CTR: &str = "ctr";
pub const CPC: &str = "cpc";
pub const CONVERSION_RATE: &str = "conversion_rate";

/// Output of [`prepare_features`].
#[derive(Debug, Clone)]
pub struct PreparedFeatures {
    /// Numeric feature table, one `Float64` column per feature, rows in input order.
    pub frame: DataFrame,
    /// Fill value used for every column of `frame`.
    pub medians: Medians,
}

impl PreparedFeatures {
    /// Feature column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Name of the encoded counterpart of a categorical column.
pub fn encoded_column_name(column: &str) -> String {
    format!("{column}_encoded")
}

/// Names of the rolling-average columns for one window.
pub fn rolling_column_names(window: usize) -> [String; 3] {
    [
        format!("avg_cost_{window}d"),
        format!("avg_clicks_{window}d"),
        format!("avg_ctr_{window}d"),
    ]
}

/// `numerator / denominator`, with a zero denominator treated as 1.
pub fn guarded_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (numerator, denominator) = (numerator?, denominator?);
    let denominator = if denominator == 0.0 { 1.0 } else { denominator };
    Some(numerator / denominator)
}

fn ratio_column(numerators: &[Option<f64>], denominators: &[Option<f64>]) -> Vec<Option<f64>> {
    numerators
        .iter()
        .zip(denominators)
        .map(|(&n, &d)| guarded_ratio(n, d))
        .collect()
}

/// Derive the numeric feature table for `records`.
///
/// Categorical columns without a fitted encoder in `encoders` get one fitted
/// on this batch; columns that already have one are encoded with it unchanged.
/// `training_medians` supplies fill values when the config asks for
/// [`ImputationStrategy::TrainingMedians`](crate::ImputationStrategy::TrainingMedians).
///
/// # Errors
///
/// - [`ProcessingError::ColumnNotFound`](crate::ProcessingError::ColumnNotFound)
///   naming the first missing required field
/// - [`ProcessingError::InvalidData`](crate::ProcessingError::InvalidData) for a
///   non-numeric required field or an unparseable date
/// - [`ProcessingError::UnseenCategory`](crate::ProcessingError::UnseenCategory)
///   under [`UnknownCategoryPolicy::Error`](crate::UnknownCategoryPolicy::Error)
pub fn prepare_features(
    records: &DataFrame,
    encoders: &mut EncoderState,
    config: &FeatureConfig,
    training_medians: Option<&Medians>,
) -> Result<PreparedFeatures> {
    validate_records(records)?;

    let temporal = temporal_features(records, DATE)?;
    let clicks = numeric_values(records, CLICKS)?;
    let impressions = numeric_values(records, IMPRESSIONS)?;
    let cost = numeric_values(records, COST)?;
    let conversions = numeric_values(records, CONVERSIONS)?;

    let ctr = ratio_column(&clicks, &impressions);
    let cpc = ratio_column(&cost, &clicks);
    let conversion_rate = ratio_column(&conversions, &clicks);

    let campaigns = string_values(records, CAMPAIGN_ID)?;
    let mut rolling = Vec::with_capacity(config.rolling_windows.len() * 3);
    for &window in &config.rolling_windows {
        let [cost_name, clicks_name, ctr_name] = rolling_column_names(window);
        rolling.push((cost_name, rolling_mean_by_group(&campaigns, &cost, window)));
        rolling.push((clicks_name, rolling_mean_by_group(&campaigns, &clicks, window)));
        rolling.push((ctr_name, rolling_mean_by_group(&campaigns, &ctr, window)));
    }

    let mut derived: Vec<(String, Vec<Option<f64>>)> = vec![
        (HOUR.to_string(), temporal.hour),
        (DAY_OF_WEEK.to_string(), temporal.day_of_week),
        (MONTH.to_string(), temporal.month),
        (IS_WEEKEND.to_string(), temporal.is_weekend),
        (CTR.to_string(), ctr),
        (CPC.to_string(), cpc),
        (CONVERSION_RATE.to_string(), conversion_rate),
    ];
    derived.extend(rolling);

    let mut encoded = Vec::with_capacity(config.categorical_columns.len());
    for column in &config.categorical_columns {
        let categories: Vec<String> =
            if let Some((_, values)) = derived.iter().find(|(name, _)| name == column) {
                values
                    .iter()
                    .map(|v| match v {
                        Some(v) => format!("{}", *v as i64),
                        None => NULL_CATEGORY.to_string(),
                    })
                    .collect()
            } else if records.column(column).is_ok() {
                string_values(records, column)?
                    .into_iter()
                    .map(|v| v.unwrap_or_else(|| NULL_CATEGORY.to_string()))
                    .collect()
            } else {
                continue;
            };

        let codes = encoders.encode(column, &categories, config.unknown_category_policy)?;
        encoded.push((
            encoded_column_name(column),
            codes.into_iter().map(Some).collect::<Vec<_>>(),
        ));
    }

    let reserved: HashSet<&str> = derived
        .iter()
        .chain(&encoded)
        .map(|(name, _)| name.as_str())
        .chain(config.categorical_columns.iter().map(String::as_str))
        .chain([config.target_column.as_str()])
        .collect();

    let mut passthrough = Vec::new();
    for column in records.get_columns() {
        let name = column.name().as_str();
        if reserved.contains(name) || !is_numeric_dtype(column.dtype()) {
            continue;
        }
        passthrough.push((name.to_string(), numeric_values(records, name)?));
    }

    let mut medians = Medians::new();
    let mut columns = Vec::with_capacity(passthrough.len() + derived.len() + encoded.len());
    for (name, values) in passthrough.into_iter().chain(derived).chain(encoded) {
        let (column, fill) =
            impute_median(float_column(&name, values), config.imputation, training_medians)?;
        medians.insert(name, fill);
        columns.push(column);
    }

    let frame = DataFrame::new(columns)?;
    tracing::debug!(
        rows = frame.height(),
        features = frame.width(),
        "prepared feature table"
    );

    Ok(PreparedFeatures { frame, medians })
}
