//! Filter evaluator: conjunction of categorical and numeric-range predicates.
//!
//! Semantics:
//!   - AND across fields, OR within a field's selected values.
//!   - An empty selection, or one containing the select-all sentinel,
//!     places no constraint on that field.
//!   - Numeric ranges are inclusive on both bounds. `lo > hi` is an error;
//!     bounds are never swapped.
//!   - A record missing the constrained value does not match.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    record::{CategoricalField, CustomerRecord, NumericField},
    segment::BinScheme,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Selecting this value means "every value of this field".
pub const SELECT_ALL: &str = "All";

/// Accepted spellings of the select-all entry, compared case-insensitively.
const SELECT_ALL_ALIASES: &[&str] = &["all", "tout", "*"];

fn is_select_all(value: &str) -> bool {
    let v = value.trim().to_ascii_lowercase();
    SELECT_ALL_ALIASES.contains(&v.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericRange {
    pub lo: f64,
    pub hi: f64,
}

impl NumericRange {
    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lo && value <= self.hi
    }

    fn validate(&self, field: NumericField) -> AnalyticsResult<()> {
        if self.lo.is_nan() || self.hi.is_nan() {
            return Err(AnalyticsError::InvalidFilter {
                field: field.name().into(),
                reason: "range bound is NaN".into(),
            });
        }
        if self.lo > self.hi {
            return Err(AnalyticsError::InvalidFilter {
                field: field.name().into(),
                reason: format!("lower bound {} exceeds upper bound {}", self.lo, self.hi),
            });
        }
        Ok(())
    }
}

/// Keep records whose binned label (e.g. an age bracket) is selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BracketSelection {
    pub bins:   BinScheme,
    pub labels: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub categorical: BTreeMap<CategoricalField, BTreeSet<String>>,
    #[serde(default)]
    pub ranges:      BTreeMap<NumericField, NumericRange>,
    #[serde(default)]
    pub brackets:    BTreeMap<NumericField, BracketSelection>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict `field` to any of `values`. Repeated calls on the same
    /// field widen the selection.
    pub fn select<I, S>(mut self, field: CategoricalField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical
            .entry(field)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn range(mut self, field: NumericField, lo: f64, hi: f64) -> Self {
        self.ranges.insert(field, NumericRange::new(lo, hi));
        self
    }

    pub fn brackets<I, S>(mut self, field: NumericField, bins: BinScheme, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.brackets.insert(
            field,
            BracketSelection {
                bins,
                labels: labels.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    /// True when no field carries an effective constraint.
    pub fn is_unconstrained(&self) -> bool {
        self.ranges.is_empty()
            && self.categorical.values().all(|v| selection_is_open(v))
            && self.brackets.values().all(|b| selection_is_open(&b.labels))
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        for (field, range) in &self.ranges {
            range.validate(*field)?;
        }
        for (field, selection) in &self.brackets {
            selection.bins.validate().map_err(|e| AnalyticsError::InvalidFilter {
                field: field.name().into(),
                reason: e.to_string(),
            })?;
            if let Some(unknown) = selection
                .labels
                .iter()
                .find(|l| !is_select_all(l) && !selection.bins.labels().contains(*l))
            {
                return Err(AnalyticsError::InvalidFilter {
                    field: field.name().into(),
                    reason: format!("bracket '{unknown}' is not a label of the bin scheme"),
                });
            }
        }
        Ok(())
    }

    /// Does `record` satisfy every effective constraint? Assumes `validate` passed.
    pub fn matches(&self, record: &CustomerRecord) -> bool {
        let categorical_ok = self.categorical.iter().all(|(field, selected)| {
            if selection_is_open(selected) {
                return true;
            }
            field
                .value(record)
                .is_some_and(|v| selected.contains(v))
        });
        if !categorical_ok {
            return false;
        }

        let ranges_ok = self.ranges.iter().all(|(field, range)| {
            field.value(record).is_some_and(|v| range.contains(v))
        });
        if !ranges_ok {
            return false;
        }

        self.brackets.iter().all(|(field, selection)| {
            if selection_is_open(&selection.labels) {
                return true;
            }
            field
                .value(record)
                .and_then(|v| selection.bins.label_for(v))
                .is_some_and(|label| selection.labels.contains(label))
        })
    }
}

fn selection_is_open(selected: &BTreeSet<String>) -> bool {
    selected.is_empty() || selected.iter().any(|v| is_select_all(v))
}

/// Return the records satisfying all of `criteria`, in input order.
pub fn apply_filters(
    records: &[CustomerRecord],
    criteria: &FilterCriteria,
) -> AnalyticsResult<Vec<CustomerRecord>> {
    criteria.validate()?;

    if criteria.is_unconstrained() {
        return Ok(records.to_vec());
    }

    let kept: Vec<CustomerRecord> = records
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect();

    log::debug!("filter: kept {} of {} records", kept.len(), records.len());
    if kept.is_empty() && !records.is_empty() {
        log::warn!("filter: selection matched no records");
    }

    Ok(kept)
}
