//! Alignment of a feature table with a recorded column list.

use crate::error::{ProcessingError, Result, ResultExt};
use polars::prelude::*;

/// Return a frame with exactly `columns`, in that order.
///
/// Columns missing from `features` are synthesized as zeros, columns not in
/// `columns` are dropped. Every output column is `Float64`.
pub fn reconcile_columns(features: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    let height = features.height();
    let mut missing = Vec::new();

    let aligned = columns
        .iter()
        .map(|name| match features.column(name) {
            Ok(column) => column
                .cast(&DataType::Float64)
                .context(format!("casting feature '{name}'")),
            Err(_) => {
                missing.push(name.as_str());
                Ok(Column::new(name.as_str().into(), vec![0.0f64; height]))
            }
        })
        .collect::<Result<Vec<_>>>()?;

    if !missing.is_empty() {
        tracing::debug!(?missing, "zero-filling feature columns absent from batch");
    }
    let dropped = (features.width() + missing.len()).saturating_sub(columns.len());
    if dropped > 0 {
        tracing::debug!(dropped, "dropping feature columns unknown to the model");
    }

    DataFrame::new(aligned).map_err(ProcessingError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_reorders_fills_and_drops() {
        let features = df! {
            "b" => &[2.0, 20.0],
            "extra" => &[9.0, 9.0],
            "a" => &[1i64, 10],
        }
        .unwrap();

        let aligned = reconcile_columns(&features, &names(&["a", "b", "c"])).unwrap();

        let column_names: Vec<String> = aligned
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(column_names, names(&["a", "b", "c"]));
        assert_eq!(aligned.column("a").unwrap().dtype(), &DataType::Float64);
        let c: Vec<Option<f64>> = aligned.column("c").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(c, vec![Some(0.0), Some(0.0)]);
        assert_eq!(aligned.height(), 2);
    }

    #[test]
    fn test_empty_column_list_yields_empty_frame() {
        let features = df! { "a" => &[1.0] }.unwrap();
        let aligned = reconcile_columns(&features, &[]).unwrap();
        assert_eq!(aligned.width(), 0);
    }
}
