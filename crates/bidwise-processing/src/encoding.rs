//! Label encoding for categorical columns.
//!
//! A [`LabelEncoder`] maps each category to its index in the sorted set of
//! categories it was fitted on. [`EncoderState`] holds one encoder per column;
//! an encoder is fitted the first time its column is seen and reused unchanged
//! afterwards.

use crate::config::UnknownCategoryPolicy;
use crate::error::{ProcessingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Category used for null values.
pub const NULL_CATEGORY: &str = "null";

/// Fitted mapping from category strings to integer codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Fit on the distinct values of `values`.
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let classes: BTreeSet<&str> = values.into_iter().collect();
        Self {
            classes: classes.into_iter().map(str::to_string).collect(),
        }
    }

    /// Known categories in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Code for a single value, if known.
    pub fn code(&self, value: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .ok()
    }

    /// Encode `values`. `column` only names the column in errors.
    pub fn transform<'a, I>(
        &self,
        column: &str,
        values: I,
        policy: UnknownCategoryPolicy,
    ) -> Result<Vec<f64>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        values
            .into_iter()
            .map(|value| match (self.code(value), policy) {
                (Some(code), _) => Ok(code as f64),
                (None, UnknownCategoryPolicy::Reserved) => Ok(self.classes.len() as f64),
                (None, UnknownCategoryPolicy::Error) => Err(ProcessingError::UnseenCategory {
                    column: column.to_string(),
                    value: value.to_string(),
                }),
            })
            .collect()
    }
}

/// One fitted [`LabelEncoder`] per categorical column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderState {
    encoders: BTreeMap<String, LabelEncoder>,
}

impl EncoderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    /// Columns with a fitted encoder, in sorted order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    /// Drop every fitted encoder.
    pub fn clear(&mut self) {
        self.encoders.clear();
    }

    /// Encode `values` for `column`, fitting a new encoder on them if the
    /// column has none yet. Existing encoders are never refitted.
    pub fn encode(
        &mut self,
        column: &str,
        values: &[String],
        policy: UnknownCategoryPolicy,
    ) -> Result<Vec<f64>> {
        let encoder = self.encoders.entry(column.to_string()).or_insert_with(|| {
            tracing::debug!(column, "fitting label encoder");
            LabelEncoder::fit(values.iter().map(String::as_str))
        });
        encoder.transform(column, values.iter().map(String::as_str), policy)
    }
}

static_assertions::assert_impl_all!(EncoderState: Send, Sync);
