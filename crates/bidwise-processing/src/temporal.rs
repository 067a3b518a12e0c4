//! Calendar features derived from the `date` column.

use crate::error::{ProcessingError, Result};
use crate::utils::{is_datetime_dtype, series};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use polars::prelude::*;

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Per-row calendar features. `day_of_week` runs 0 (Monday) to 6 (Sunday).
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalFeatures {
    pub hour: Vec<Option<f64>>,
    pub day_of_week: Vec<Option<f64>>,
    pub month: Vec<Option<f64>>,
    pub is_weekend: Vec<Option<f64>>,
}

/// Parse a timestamp in any of the accepted layouts. Date-only values land at midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Timestamps of `date_column`. Date and Datetime columns are read directly,
/// anything else is string-cast and parsed.
fn timestamps(records: &DataFrame, date_column: &str) -> Result<Vec<Option<NaiveDateTime>>> {
    let series = series(records, date_column)?;

    if is_datetime_dtype(series.dtype()) {
        let millis = series
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
            .cast(&DataType::Int64)?;
        return Ok(millis
            .i64()?
            .into_iter()
            .map(|ms| ms.and_then(DateTime::from_timestamp_millis).map(|ts| ts.naive_utc()))
            .collect());
    }

    let casted = series.cast(&DataType::String)?;
    casted
        .str()?
        .into_iter()
        .map(|raw| match raw {
            Some(raw) => parse_timestamp(raw).map(Some).ok_or_else(|| {
                ProcessingError::invalid_data(
                    date_column,
                    format!("cannot parse '{raw}' as a date"),
                )
            }),
            None => Ok(None),
        })
        .collect()
}

/// Derive hour, weekday, month and the weekend flag from `date_column`.
///
/// A null date yields null features, except `is_weekend`, which is 0.
pub fn temporal_features(records: &DataFrame, date_column: &str) -> Result<TemporalFeatures> {
    let dates = timestamps(records, date_column)?;
    let n = dates.len();
    let mut features = TemporalFeatures {
        hour: Vec::with_capacity(n),
        day_of_week: Vec::with_capacity(n),
        month: Vec::with_capacity(n),
        is_weekend: Vec::with_capacity(n),
    };

    for ts in dates {
        let weekday = ts.map(|ts| ts.weekday().num_days_from_monday() as f64);
        features.hour.push(ts.map(|ts| ts.hour() as f64));
        features.day_of_week.push(weekday);
        features.month.push(ts.map(|ts| ts.month() as f64));
        features
            .is_weekend
            .push(Some(if matches!(weekday, Some(d) if d >= 5.0) { 1.0 } else { 0.0 }));
    }

    Ok(features)
}
