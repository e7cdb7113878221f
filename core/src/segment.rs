//! Segmenter: partitions a record collection into named buckets.
//!
//! Every input record lands in exactly one bucket or in the unclassified
//! count, so `Σ bucket.len() + unclassified == records.len()` always holds.
//! Bucket order is deterministic: categorical labels sort ascending,
//! distinct values sort numerically, bins keep their scheme order.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    record::{CategoricalField, CustomerRecord, NumericField},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ── Bin schemes ──────────────────────────────────────────────────────────────

/// Which end of each half-open bin is inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Closed {
    /// `[lo, hi)`, with the last bin also holding its upper edge.
    #[default]
    Left,
    /// `(lo, hi]`. The lowest edge itself falls outside every bin.
    Right,
}

/// Ordered half-open bins between consecutive edges, closed on the side
/// given by `closed`. The last edge may be `+∞` for an open top bin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinScheme {
    edges:  Vec<f64>,
    labels: Vec<String>,
    #[serde(default)]
    closed: Closed,
}

impl BinScheme {
    pub fn new<S: Into<String>>(edges: Vec<f64>, labels: Vec<S>) -> AnalyticsResult<Self> {
        let scheme = Self {
            edges,
            labels: labels.into_iter().map(Into::into).collect(),
            closed: Closed::Left,
        };
        scheme.validate()?;
        Ok(scheme)
    }

    /// Same edges and labels, closed on the other side.
    pub fn closed(mut self, closed: Closed) -> Self {
        self.closed = closed;
        self
    }

    /// Seven-year age brackets over edges 0, 25, 32, … 74, 100, closed on
    /// the right: 25 is in "18-25", 74 in "67-74".
    pub fn age_brackets() -> Self {
        Self {
            edges: vec![0.0, 25.0, 32.0, 39.0, 46.0, 53.0, 60.0, 67.0, 74.0, 100.0],
            labels: [
                "18-25", "25-32", "32-39", "39-46", "46-53", "53-60", "60-67", "67-74", "74-81",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            closed: Closed::Right,
        }
    }

    /// Yearly tenure buckets over `tenure_months`. The last bucket is open-ended.
    pub fn tenure_years(max_years: u32) -> AnalyticsResult<Self> {
        if max_years == 0 {
            return Err(AnalyticsError::InvalidBinSpec {
                reason: "tenure scheme needs at least one year".into(),
            });
        }
        let mut edges: Vec<f64> = (0..max_years).map(|y| (y * 12) as f64).collect();
        edges.push(f64::INFINITY);
        let labels: Vec<String> = (1..=max_years)
            .map(|y| {
                if y == max_years {
                    format!("Year {y}+")
                } else {
                    format!("Year {y}")
                }
            })
            .collect();
        Self::new(edges, labels)
    }

    /// `n` quantile bins over the observed values of `field`, labelled `Q1..Qk`.
    ///
    /// Edges that coincide (heavily tied data) collapse, so `k ≤ n`. With no
    /// spread at all the scheme degrades to a single bin holding every value.
    pub fn quantiles(
        records: &[CustomerRecord],
        field: NumericField,
        n: usize,
    ) -> AnalyticsResult<Self> {
        if n == 0 {
            return Err(AnalyticsError::InvalidBinSpec {
                reason: "quantile count must be at least 1".into(),
            });
        }

        let mut values: Vec<f64> = records
            .iter()
            .filter_map(|r| field.value(r))
            .filter(|v| v.is_finite())
            .collect();
        values.sort_by(|a, b| a.total_cmp(b));

        let (min, max) = match (values.first(), values.last()) {
            (Some(&min), Some(&max)) => (min, max),
            _ => (0.0, 0.0),
        };
        if min == max {
            return Self::new(vec![min, next_above(min)], vec!["Q1"]);
        }

        let last = values.len() - 1;
        let mut edges: Vec<f64> = Vec::with_capacity(n + 1);
        for i in 0..=n {
            let edge = if i == n {
                max
            } else {
                values[i * last / n]
            };
            if edges.last().map_or(true, |&prev| edge > prev) {
                edges.push(edge);
            }
        }

        let labels: Vec<String> = (1..edges.len()).map(|q| format!("Q{q}")).collect();
        Self::new(edges, labels)
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn closed_side(&self) -> Closed {
        self.closed
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        if self.edges.len() < 2 {
            return Err(AnalyticsError::InvalidBinSpec {
                reason: format!("need at least 2 edges, got {}", self.edges.len()),
            });
        }
        if self.labels.len() != self.edges.len() - 1 {
            return Err(AnalyticsError::InvalidBinSpec {
                reason: format!(
                    "{} edges need {} labels, got {}",
                    self.edges.len(),
                    self.edges.len() - 1,
                    self.labels.len()
                ),
            });
        }
        if self.edges.iter().any(|e| e.is_nan()) {
            return Err(AnalyticsError::InvalidBinSpec {
                reason: "edge is NaN".into(),
            });
        }
        if let Some(pair) = self.edges.windows(2).find(|w| w[0] >= w[1]) {
            return Err(AnalyticsError::InvalidBinSpec {
                reason: format!("edges not strictly increasing at {} → {}", pair[0], pair[1]),
            });
        }
        Ok(())
    }

    /// Index of the bin holding `value`, or `None` when it falls outside every bin.
    pub fn bin_index(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let last = self.edges.len().checked_sub(2)?;
        (0..=last).find(|&i| {
            let (lo, hi) = (self.edges[i], self.edges[i + 1]);
            match self.closed {
                Closed::Left => value >= lo && (value < hi || (i == last && value == hi)),
                Closed::Right => value > lo && value <= hi,
            }
        })
    }

    pub fn label_for(&self, value: f64) -> Option<&str> {
        self.bin_index(value).map(|i| self.labels[i].as_str())
    }
}

/// Smallest f64 strictly greater than a finite `v`; `v + 1.0` when that is
/// representable as a different value.
fn next_above(v: f64) -> f64 {
    let step = v + 1.0;
    if step > v {
        return step;
    }
    // |v| ≥ 2^53: bump one unit in the last place.
    if v > 0.0 {
        f64::from_bits(v.to_bits() + 1)
    } else {
        f64::from_bits(v.to_bits() - 1)
    }
}

// ── Segment spec ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentSpec {
    /// One bucket per observed value of a categorical field.
    Categorical { field: CategoricalField },
    /// One bucket per bin of a numeric field, empty bins included.
    Binned { field: NumericField, bins: BinScheme },
    /// One bucket per distinct value of a numeric field, rounded to an integer.
    Distinct { field: NumericField },
}

impl SegmentSpec {
    pub fn by(field: CategoricalField) -> Self {
        Self::Categorical { field }
    }

    pub fn binned(field: NumericField, bins: BinScheme) -> Self {
        Self::Binned { field, bins }
    }

    pub fn distinct(field: NumericField) -> Self {
        Self::Distinct { field }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Categorical { field } => field.name(),
            Self::Binned { field, .. } | Self::Distinct { field } => field.name(),
        }
    }
}

// ── Buckets ──────────────────────────────────────────────────────────────────

/// A named group of borrowed records. Metrics are derived by the aggregator.
#[derive(Debug, Clone)]
pub struct Bucket<'a> {
    pub label:   String,
    pub members: Vec<&'a CustomerRecord>,
}

impl<'a> Bucket<'a> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            members: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Segmentation<'a> {
    pub field:        &'static str,
    pub buckets:      Vec<Bucket<'a>>,
    /// Records whose segmentation value is missing or outside every bin.
    pub unclassified: usize,
}

impl Segmentation<'_> {
    pub fn classified(&self) -> usize {
        self.buckets.iter().map(Bucket::len).sum()
    }

    pub fn population(&self) -> usize {
        self.classified() + self.unclassified
    }
}

/// Partition `records` according to `spec`.
pub fn segment<'a>(
    records: &'a [CustomerRecord],
    spec: &SegmentSpec,
) -> AnalyticsResult<Segmentation<'a>> {
    let mut unclassified = 0usize;

    let buckets = match spec {
        SegmentSpec::Categorical { field } => {
            let mut groups: BTreeMap<&'a str, Vec<&'a CustomerRecord>> = BTreeMap::new();
            for record in records {
                match field.value(record) {
                    Some(value) => groups.entry(value).or_default().push(record),
                    None => unclassified += 1,
                }
            }
            groups
                .into_iter()
                .map(|(label, members)| Bucket {
                    label: label.to_string(),
                    members,
                })
                .collect()
        }

        SegmentSpec::Binned { field, bins } => {
            bins.validate()?;
            let mut buckets: Vec<Bucket<'a>> =
                bins.labels().iter().map(|l| Bucket::new(l.clone())).collect();
            for record in records {
                match field.value(record).and_then(|v| bins.bin_index(v)) {
                    Some(i) => buckets[i].members.push(record),
                    None => unclassified += 1,
                }
            }
            buckets
        }

        SegmentSpec::Distinct { field } => {
            let mut groups: BTreeMap<i64, Vec<&'a CustomerRecord>> = BTreeMap::new();
            for record in records {
                match field.value(record).filter(|v| v.is_finite()) {
                    Some(value) => groups.entry(value.round() as i64).or_default().push(record),
                    None => unclassified += 1,
                }
            }
            groups
                .into_iter()
                .map(|(value, members)| Bucket {
                    label: value.to_string(),
                    members,
                })
                .collect()
        }
    };

    let segmentation = Segmentation {
        field: spec.name(),
        buckets,
        unclassified,
    };

    log::debug!(
        "segment by {}: {} buckets, {} classified, {} unclassified",
        segmentation.field,
        segmentation.buckets.len(),
        segmentation.classified(),
        segmentation.unclassified
    );
    if unclassified > 0 {
        log::warn!(
            "segment by {}: {unclassified} records have no value for the field",
            segmentation.field
        );
    }

    Ok(segmentation)
}
