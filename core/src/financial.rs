//! Financial impact model: churn counts to money.
//!
//! A static point estimate over the observation window: no discounting,
//! no time value. ROI exists only for a positive campaign cost; otherwise
//! it is reported as undefined, never as zero or infinity.

use crate::{
    aggregate::BucketSummary,
    config::FinancialConfig,
    error::AnalyticsResult,
    record::CustomerRecord,
    significance::SignificanceReport,
    types::Money,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Roi {
    Defined(f64),
    Undefined,
}

impl Roi {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(*v),
            Self::Undefined => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Defined(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialImpactEstimate {
    pub churned:                 usize,
    pub unit_cltv:               Money,
    pub retention_recovery_rate: f64,
    /// churned × unit_cltv
    pub total_loss:              Money,
    /// total_loss × retention_recovery_rate
    pub recoverable:             Money,
    pub campaign_cost:           Option<Money>,
    pub roi:                     Roi,
}

/// Estimate for a raw churn count.
pub fn estimate(churned: usize, assumptions: &FinancialConfig) -> AnalyticsResult<FinancialImpactEstimate> {
    assumptions.validate()?;

    let total_loss = churned as f64 * assumptions.unit_cltv;
    let recoverable = total_loss * assumptions.retention_recovery_rate;
    let roi = match assumptions.campaign_cost {
        Some(cost) if cost > 0.0 => Roi::Defined(recoverable / cost),
        _ => Roi::Undefined,
    };

    Ok(FinancialImpactEstimate {
        churned,
        unit_cltv: assumptions.unit_cltv,
        retention_recovery_rate: assumptions.retention_recovery_rate,
        total_loss,
        recoverable,
        campaign_cost: assumptions.campaign_cost,
        roi,
    })
}

/// Estimate over one bucket (`Some(&bucket)`, `[&bucket]`) or a collection.
///
/// No significance gate is applied here; `impact_by_bucket` is the gated view.
pub fn financial_impact<'a, I>(
    buckets: I,
    assumptions: &FinancialConfig,
) -> AnalyticsResult<FinancialImpactEstimate>
where
    I: IntoIterator<Item = &'a BucketSummary>,
{
    let churned = buckets.into_iter().map(|b| b.churned).sum();
    estimate(churned, assumptions)
}

/// Estimate straight from records, without segmenting first.
pub fn financial_impact_for_records<'a, I>(
    records: I,
    assumptions: &FinancialConfig,
) -> AnalyticsResult<FinancialImpactEstimate>
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let churned = records.into_iter().filter(|r| r.is_churned()).count();
    estimate(churned, assumptions)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketImpact {
    pub label:  String,
    pub impact: FinancialImpactEstimate,
}

/// Per-bucket estimates for significant buckets only.
pub fn impact_by_bucket(
    report: &SignificanceReport,
    assumptions: &FinancialConfig,
) -> AnalyticsResult<Vec<BucketImpact>> {
    report
        .significant()
        .map(|b| {
            Ok(BucketImpact {
                label: b.label.clone(),
                impact: estimate(b.churned, assumptions)?,
            })
        })
        .collect()
}
