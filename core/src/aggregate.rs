//! Aggregator: reduces each bucket to its derived metrics in one pass.
//!
//! Metrics are never stored apart from their records: a `BucketSummary`
//! is rebuilt from the bucket's members every time, and the same members
//! always reduce to the same summary.

use crate::{
    record::CustomerRecord,
    safe_math::{safe_divide, safe_percentage},
    segment::{Bucket, Segmentation},
    types::{Money, Percent},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketSummary {
    pub label:              String,
    pub total:              usize,
    pub churned:            usize,
    pub churn_rate:         Percent,
    pub revenue_sum:        Money,
    /// Revenue booked by the bucket's churned members.
    pub churned_revenue:    Money,
    /// Mean satisfaction over members with a 1–5 score. `None` when nobody has one.
    pub avg_satisfaction:   Option<f64>,
    pub avg_monthly_charge: Money,
    /// Set by the significance filter; false until then.
    pub significant:        bool,
}

impl BucketSummary {
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            total: 0,
            churned: 0,
            churn_rate: 0.0,
            revenue_sum: 0.0,
            churned_revenue: 0.0,
            avg_satisfaction: None,
            avg_monthly_charge: 0.0,
            significant: false,
        }
    }
}

/// Reduce any record sequence to a summary under `label`.
pub fn summarize<'a, I>(label: impl Into<String>, records: I, rate_decimals: u32) -> BucketSummary
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let mut total = 0usize;
    let mut churned = 0usize;
    let mut revenue_sum = 0.0;
    let mut churned_revenue = 0.0;
    let mut charge_sum = 0.0;
    let mut score_sum = 0.0;
    let mut respondents = 0usize;

    for record in records {
        total += 1;
        revenue_sum += record.total_revenue;
        charge_sum += record.monthly_charge;
        if record.is_churned() {
            churned += 1;
            churned_revenue += record.total_revenue;
        }
        if let Some(score @ 1..=5) = record.satisfaction_score {
            score_sum += score as f64;
            respondents += 1;
        }
    }

    let avg_satisfaction = if respondents > 0 {
        Some(score_sum / respondents as f64)
    } else {
        None
    };

    BucketSummary {
        label: label.into(),
        total,
        churned,
        churn_rate: safe_percentage(churned as f64, total as f64, rate_decimals),
        revenue_sum,
        churned_revenue,
        avg_satisfaction,
        avg_monthly_charge: safe_divide(charge_sum, total as f64, 0.0),
        significant: false,
    }
}

pub fn aggregate(bucket: &Bucket<'_>, rate_decimals: u32) -> BucketSummary {
    summarize(bucket.label.as_str(), bucket.members.iter().copied(), rate_decimals)
}

/// Summaries for every bucket, in segmentation order.
pub fn aggregate_all(segmentation: &Segmentation<'_>, rate_decimals: u32) -> Vec<BucketSummary> {
    segmentation
        .buckets
        .iter()
        .map(|b| aggregate(b, rate_decimals))
        .collect()
}
