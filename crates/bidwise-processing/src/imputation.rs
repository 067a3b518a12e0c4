//! Median imputation of missing feature values.

use crate::config::ImputationStrategy;
use crate::error::Result;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Per-column fill values, keyed by feature column name.
pub type Medians = BTreeMap<String, f64>;

/// Fill the nulls of a `Float64` feature column and return it with the fill
/// value used.
///
/// With [`ImputationStrategy::TrainingMedians`] a recorded median for the
/// column wins; otherwise the median of the present values is used. A column
/// with no present values at all is filled with 0.
pub fn impute_median(
    column: Column,
    strategy: ImputationStrategy,
    recorded: Option<&Medians>,
) -> Result<(Column, f64)> {
    let series = column.as_materialized_series();
    let fill = match (strategy, recorded.and_then(|m| m.get(series.name().as_str()))) {
        (ImputationStrategy::TrainingMedians, Some(&recorded)) => recorded,
        _ => series.median().unwrap_or(0.0),
    };

    let missing = series.null_count();
    if missing == 0 {
        return Ok((column, fill));
    }

    let filled = series.f64()?.fill_null_with_values(fill)?;
    tracing::trace!(column = %series.name(), missing, fill, "imputed missing values");
    Ok((filled.into_series().into(), fill))
}
