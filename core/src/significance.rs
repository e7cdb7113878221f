//! Significance filter: gates small buckets out of decision metrics.
//!
//! Below ~50 members a binomial proportion's 95% margin of error exceeds
//! ±14 points, so rates from such buckets are not compared. Insignificant
//! buckets stay in the report, flagged, for callers that list everything.

use crate::aggregate::BucketSummary;
use serde::{Deserialize, Serialize};

pub fn is_significant(total: usize, min_sample_size: usize) -> bool {
    total >= min_sample_size
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceReport {
    pub min_sample_size: usize,
    /// Every bucket, in input order, with `significant` set.
    pub buckets:         Vec<BucketSummary>,
}

impl SignificanceReport {
    pub fn significant(&self) -> impl Iterator<Item = &BucketSummary> {
        self.buckets.iter().filter(|b| b.significant)
    }

    pub fn insignificant(&self) -> impl Iterator<Item = &BucketSummary> {
        self.buckets.iter().filter(|b| !b.significant)
    }

    pub fn significant_count(&self) -> usize {
        self.significant().count()
    }

    pub fn into_significant(self) -> Vec<BucketSummary> {
        self.buckets.into_iter().filter(|b| b.significant).collect()
    }
}

/// Tag every bucket with its significance flag. Nothing is removed.
pub fn filter_significant(
    buckets: Vec<BucketSummary>,
    min_sample_size: usize,
) -> SignificanceReport {
    let buckets: Vec<BucketSummary> = buckets
        .into_iter()
        .map(|mut b| {
            b.significant = is_significant(b.total, min_sample_size);
            b
        })
        .collect();

    let report = SignificanceReport {
        min_sample_size,
        buckets,
    };

    let excluded = report.buckets.len() - report.significant_count();
    if excluded > 0 {
        log::warn!(
            "significance: {excluded} of {} buckets below n={min_sample_size}, excluded from decisions",
            report.buckets.len()
        );
    }

    report
}
