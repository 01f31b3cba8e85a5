//! Boolean signal columns aligned to a date axis.
//!
//! Signals are the external data rules read from: each column holds one
//! precomputed boolean per bar, produced by whatever indicator pipeline sits
//! upstream.

use crate::domain::error::StrategyError;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalSeries {
    dates: Vec<NaiveDate>,
    columns: BTreeMap<String, Vec<bool>>,
}

impl SignalSeries {
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            columns: BTreeMap::new(),
        }
    }

    /// Add or replace a column. Its length must match the date axis.
    pub fn insert_column(&mut self, name: &str, values: Vec<bool>) -> Result<(), StrategyError> {
        if values.len() != self.dates.len() {
            return Err(StrategyError::DataLoad {
                reason: format!(
                    "column '{}' has {} values, expected {}",
                    name,
                    values.len(),
                    self.dates.len()
                ),
            });
        }
        self.columns.insert(name.to_string(), values);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn date(&self, index: usize) -> Option<NaiveDate> {
        self.dates.get(index).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[bool]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Value of `name` at `index`; `None` for unknown columns or out-of-range bars.
    pub fn get(&self, name: &str, index: usize) -> Option<bool> {
        self.columns.get(name).and_then(|c| c.get(index).copied())
    }
}
