//! The attrition engine: runs the full pipeline for one request.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Filter evaluator
//!   2. Segmenter
//!   3. Aggregator
//!   4. Significance filter
//!   5. Financial impact model  (significant buckets only)
//!   6. Priority classifier     (significant buckets only)
//!   7. Concentration analyzer  (filtered records, unsegmented)
//!   8. NPS scorer              (filtered records, unsegmented)
//!
//! RULES:
//!   - The engine holds only its configuration. No state survives a call.
//!   - Input records are borrowed and never mutated.
//!   - Structural errors (bad filter, bad bins, bad config) fail the call;
//!     data conditions (empty selections, zero totals) degrade to defaults.

use crate::{
    aggregate::{aggregate_all, BucketSummary},
    concentration::{concentration, ConcentrationResult},
    config::EngineConfig,
    error::AnalyticsResult,
    filter::{apply_filters, FilterCriteria},
    financial::{financial_impact, impact_by_bucket, BucketImpact, FinancialImpactEstimate},
    geo::{city_footprint, GeoFootprint},
    headline::{headline, status_breakdown, AttritionHeadline, StatusShare},
    nps::{nps, NpsSummary},
    priority::{classify_priority, PriorityClassification},
    record::CustomerRecord,
    segment::{segment, SegmentSpec},
    significance::{filter_significant, SignificanceReport},
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttritionReport {
    pub segmented_by:     &'static str,
    pub input_records:    usize,
    pub filtered_records: usize,
    pub unclassified:     usize,
    pub headline:         AttritionHeadline,
    pub status_breakdown: Vec<StatusShare>,
    pub buckets:          SignificanceReport,
    /// Aggregate estimate over significant buckets.
    pub impact:           FinancialImpactEstimate,
    pub bucket_impacts:   Vec<BucketImpact>,
    pub priorities:       PriorityClassification,
    pub concentration:    ConcentrationResult,
    pub nps:              NpsSummary,
    pub geo:              GeoFootprint,
}

pub struct AttritionEngine {
    config: EngineConfig,
}

impl AttritionEngine {
    pub fn new(config: EngineConfig) -> AnalyticsResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Stages 2–4 for an already filtered collection.
    pub fn segment_summaries(
        &self,
        records: &[CustomerRecord],
        spec: &SegmentSpec,
    ) -> AnalyticsResult<(SignificanceReport, usize)> {
        let segmentation = segment(records, spec)?;
        let summaries: Vec<BucketSummary> =
            aggregate_all(&segmentation, self.config.rounding.rate_decimals);
        let report = filter_significant(summaries, self.config.significance.min_sample_size);
        Ok((report, segmentation.unclassified))
    }

    pub fn run(
        &self,
        records: &[CustomerRecord],
        criteria: &FilterCriteria,
        spec: &SegmentSpec,
    ) -> AnalyticsResult<AttritionReport> {
        let decimals = self.config.rounding.rate_decimals;

        let filtered = apply_filters(records, criteria)?;
        let (buckets, unclassified) = self.segment_summaries(&filtered, spec)?;

        let impact = financial_impact(buckets.significant(), &self.config.financial)?;
        let bucket_impacts = impact_by_bucket(&buckets, &self.config.financial)?;
        let priorities = classify_priority(
            &buckets.buckets,
            &self.config.priority,
            self.config.financial.unit_cltv,
        );

        let head = headline(&filtered, decimals);
        let report = AttritionReport {
            segmented_by: spec.name(),
            input_records: records.len(),
            filtered_records: filtered.len(),
            unclassified,
            status_breakdown: status_breakdown(&head, decimals),
            headline: head,
            impact,
            bucket_impacts,
            priorities,
            concentration: concentration(&filtered, self.config.concentration_field),
            nps: nps(&filtered, decimals),
            geo: city_footprint(&filtered, decimals),
            buckets,
        };

        log::info!(
            "run: {}/{} records by {}: {} buckets ({} significant), churn {:.1}%, loss {:.0}, gini {:.3}, nps {:.1}",
            report.filtered_records,
            report.input_records,
            report.segmented_by,
            report.buckets.buckets.len(),
            report.buckets.significant_count(),
            report.headline.churn_rate,
            report.impact.total_loss,
            report.concentration.gini,
            report.nps.nps_score
        );

        Ok(report)
    }
}
