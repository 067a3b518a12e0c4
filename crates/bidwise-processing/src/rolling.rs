//! Per-campaign trailing averages.
//!
//! Rows are grouped by a string key and walked in input order, so each result
//! lands on the row it was computed for. A window that is not yet full, or
//! that holds a missing value, yields `None`.

use std::collections::{HashMap, VecDeque};

/// Trailing mean of the last `window` values within each group, current row included.
pub fn rolling_mean_by_group(
    keys: &[Option<String>],
    values: &[Option<f64>],
    window: usize,
) -> Vec<Option<f64>> {
    debug_assert_eq!(keys.len(), values.len());
    let mut buffers: HashMap<Option<&str>, VecDeque<Option<f64>>> = HashMap::new();

    keys.iter()
        .zip(values)
        .map(|(key, &value)| {
            let buffer = buffers
                .entry(key.as_deref())
                .or_insert_with(|| VecDeque::with_capacity(window + 1));
            buffer.push_back(value);
            if buffer.len() > window {
                buffer.pop_front();
            }
            if buffer.len() < window {
                return None;
            }
            buffer
                .iter()
                .copied()
                .sum::<Option<f64>>()
                .map(|total| total / window as f64)
        })
        .collect()
}
