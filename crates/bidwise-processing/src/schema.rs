//! Column names of performance records and validation of their presence.
//!
//! A performance record is one row per campaign (or keyword) per time bucket.
//! Only the fields in [`REQUIRED_COLUMNS`] are mandatory; everything else is
//! optional and contributes features only when present.

use crate::error::{ProcessingError, Result};
use crate::utils::{is_numeric_dtype, series};
use polars::prelude::DataFrame;

pub const DATE: &str = "date";
pub const CAMPAIGN_ID: &str = "campaign_id";
pub const CLICKS: &str = "clicks";
pub const IMPRESSIONS: &str = "impressions";
pub const COST: &str = "cost";
pub const CONVERSIONS: &str = "conversions";

pub const KEYWORD_ID: &str = "keyword_id";
pub const KEYWORD_TEXT: &str = "keyword_text";
pub const CAMPAIGN_TYPE: &str = "campaign_type";
pub const CAMPAIGN_STATUS: &str = "campaign_status";
pub const CURRENT_BID: &str = "current_bid";

/// Fields every performance record must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = [DATE, CAMPAIGN_ID, CLICKS, IMPRESSIONS, COST, CONVERSIONS];

/// Required fields that must have a numeric dtype.
pub const REQUIRED_NUMERIC_COLUMNS: [&str; 4] = [CLICKS, IMPRESSIONS, COST, CONVERSIONS];

/// Fail fast on the first missing required column, or on a required numeric
/// column with a non-numeric dtype.
pub fn validate_records(records: &DataFrame) -> Result<()> {
    require_columns(records, &REQUIRED_COLUMNS)?;

    for name in REQUIRED_NUMERIC_COLUMNS {
        let dtype = series(records, name)?.dtype();
        if !is_numeric_dtype(dtype) {
            return Err(ProcessingError::invalid_data(
                name,
                format!("expected a numeric column, found {dtype}"),
            ));
        }
    }

    Ok(())
}

/// Fail with [`ProcessingError::ColumnNotFound`] naming the first absent column.
pub fn require_columns(records: &DataFrame, columns: &[&str]) -> Result<()> {
    match columns
        .iter()
        .find(|name| records.column(name).is_err())
    {
        Some(missing) => Err(ProcessingError::ColumnNotFound(missing.to_string())),
        None => Ok(()),
    }
}
