//! Shared utilities for feature preparation.
//!
//! Helpers for checking Polars dtypes and for pulling columns out of a
//! [`DataFrame`] as plain Rust vectors, which is how every feature step works.

use crate::error::{ProcessingError, Result};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a calendar date or timestamp.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

// =============================================================================
// Column Extraction
// =============================================================================

/// Borrow a column as a materialized [`Series`], naming it in the error if absent.
pub fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|column| column.as_materialized_series())
        .map_err(|_| ProcessingError::ColumnNotFound(name.to_string()))
}

/// Read a numeric column as `f64` values. NaN is treated as missing.
///
/// Fails with [`ProcessingError::InvalidData`] if the column is not numeric.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = series(df, name)?;
    if !is_numeric_dtype(series.dtype()) {
        return Err(ProcessingError::invalid_data(
            name,
            format!("expected a numeric column, found {}", series.dtype()),
        ));
    }
    float_values(series)
}

/// Cast any numeric series to `f64` values. NaN is treated as missing.
pub fn float_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let casted = series.cast(&DataType::Float64)?;
    let values = casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect();
    Ok(values)
}

/// Read any column as strings (values are string-cast; nulls stay `None`).
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = series(df, name)?;
    let casted = series.cast(&DataType::String)?;
    let values = casted
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

/// Build a `Float64` column from optional values.
pub fn float_column(name: &str, values: Vec<Option<f64>>) -> Column {
    Column::new(name.into(), values)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_is_datetime_dtype() {
        assert!(is_datetime_dtype(&DataType::Date));
        assert!(is_datetime_dtype(&DataType::Datetime(
            TimeUnit::Milliseconds,
            None
        )));
        assert!(!is_datetime_dtype(&DataType::String));
        assert!(!is_datetime_dtype(&DataType::Time));
    }

    #[test]
    fn test_numeric_values_rejects_strings() {
        let df = df! { "clicks" => &["a", "b"] }.unwrap();
        let err = numeric_values(&df, "clicks").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATA");
        assert!(err.to_string().contains("clicks"));
    }

    #[test]
    fn test_numeric_values_missing_column() {
        let df = df! { "clicks" => &[1i64, 2] }.unwrap();
        let err = numeric_values(&df, "cost").unwrap_err();
        assert!(matches!(err, ProcessingError::ColumnNotFound(ref c) if c == "cost"));
    }

    #[test]
    fn test_numeric_values_treats_nan_as_missing() {
        let df = df! { "cost" => &[Some(1.0), Some(f64::NAN), None] }.unwrap();
        let values = numeric_values(&df, "cost").unwrap();
        assert_eq!(values, vec![Some(1.0), None, None]);
    }

    #[test]
    fn test_string_values_casts_integers() {
        let df = df! { "campaign_id" => &[Some(10i64), None] }.unwrap();
        let values = string_values(&df, "campaign_id").unwrap();
        assert_eq!(values, vec![Some("10".to_string()), None]);
    }
}
