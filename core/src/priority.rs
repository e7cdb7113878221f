//! Priority classifier: four urgency tiers from OR-combined triggers.
//!
//! ```text
//! loss = churned × unit_cltv
//! Critical  if loss ≥ T1.loss OR churned ≥ T1.volume OR rate ≥ T1.rate
//! Targeted  if loss ≥ T2.loss OR churned ≥ T2.volume OR rate ≥ T2.rate
//! Watch     if rate ≥ T3.rate
//! Ignore    otherwise
//! ```
//!
//! Only significant buckets are classified. The rest are listed in
//! `excluded` and never counted in a tier.

use crate::{
    aggregate::BucketSummary,
    config::{PriorityThresholds, TierTrigger},
    types::{Money, Percent},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriorityTier {
    Critical,
    Targeted,
    Watch,
    Ignore,
}

impl PriorityTier {
    pub const ALL: [PriorityTier; 4] = [Self::Critical, Self::Targeted, Self::Watch, Self::Ignore];

    /// Higher is more urgent.
    pub fn urgency(&self) -> u8 {
        match self {
            Self::Critical => 3,
            Self::Targeted => 2,
            Self::Watch => 1,
            Self::Ignore => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Loss,
    Volume,
    Rate,
}

/// The three dimensions a tier decision reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierInputs {
    pub loss:       Money,
    pub churned:    usize,
    pub churn_rate: Percent,
}

fn fired(trigger: &TierTrigger, inputs: &TierInputs) -> Vec<Trigger> {
    let mut out = Vec::new();
    if inputs.loss >= trigger.loss {
        out.push(Trigger::Loss);
    }
    if inputs.churned >= trigger.volume {
        out.push(Trigger::Volume);
    }
    if inputs.churn_rate >= trigger.rate {
        out.push(Trigger::Rate);
    }
    out
}

/// Tier for independent inputs, plus the triggers that fired at that tier.
pub fn classify_inputs(
    inputs: &TierInputs,
    thresholds: &PriorityThresholds,
) -> (PriorityTier, Vec<Trigger>) {
    let critical = fired(&thresholds.critical, inputs);
    if !critical.is_empty() {
        return (PriorityTier::Critical, critical);
    }
    let targeted = fired(&thresholds.targeted, inputs);
    if !targeted.is_empty() {
        return (PriorityTier::Targeted, targeted);
    }
    if inputs.churn_rate >= thresholds.watch_rate {
        return (PriorityTier::Watch, vec![Trigger::Rate]);
    }
    (PriorityTier::Ignore, Vec::new())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityAssignment {
    pub bucket:   BucketSummary,
    pub tier:     PriorityTier,
    pub loss:     Money,
    pub triggers: Vec<Trigger>,
}

/// Classify one bucket regardless of its significance flag.
pub fn classify_bucket(
    bucket: &BucketSummary,
    thresholds: &PriorityThresholds,
    unit_cltv: Money,
) -> PriorityAssignment {
    let inputs = TierInputs {
        loss: bucket.churned as f64 * unit_cltv,
        churned: bucket.churned,
        churn_rate: bucket.churn_rate,
    };
    let (tier, triggers) = classify_inputs(&inputs, thresholds);
    PriorityAssignment {
        bucket: bucket.clone(),
        tier,
        loss: inputs.loss,
        triggers,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityClassification {
    pub assignments: Vec<PriorityAssignment>,
    /// Buckets not eligible because they failed the significance gate.
    pub excluded:    Vec<BucketSummary>,
}

impl PriorityClassification {
    /// Significant buckets per tier. Every tier is present, possibly with 0.
    pub fn tier_counts(&self) -> BTreeMap<PriorityTier, usize> {
        let mut counts: BTreeMap<PriorityTier, usize> =
            PriorityTier::ALL.iter().map(|t| (*t, 0)).collect();
        for a in &self.assignments {
            *counts.entry(a.tier).or_insert(0) += 1;
        }
        counts
    }

    pub fn of_tier(&self, tier: PriorityTier) -> impl Iterator<Item = &PriorityAssignment> {
        self.assignments.iter().filter(move |a| a.tier == tier)
    }

    pub fn tier_of(&self, label: &str) -> Option<PriorityTier> {
        self.assignments
            .iter()
            .find(|a| a.bucket.label == label)
            .map(|a| a.tier)
    }

    /// Most urgent first; ties broken by larger loss, then label.
    pub fn by_urgency(&self) -> Vec<&PriorityAssignment> {
        let mut sorted: Vec<&PriorityAssignment> = self.assignments.iter().collect();
        sorted.sort_by(|a, b| {
            b.tier
                .urgency()
                .cmp(&a.tier.urgency())
                .then_with(|| b.loss.total_cmp(&a.loss))
                .then_with(|| a.bucket.label.cmp(&b.bucket.label))
        });
        sorted
    }
}

/// Classify every significant bucket; route the rest to `excluded`.
pub fn classify_priority(
    buckets: &[BucketSummary],
    thresholds: &PriorityThresholds,
    unit_cltv: Money,
) -> PriorityClassification {
    let mut assignments = Vec::new();
    let mut excluded = Vec::new();

    for bucket in buckets {
        if bucket.significant {
            assignments.push(classify_bucket(bucket, thresholds, unit_cltv));
        } else {
            excluded.push(bucket.clone());
        }
    }

    let classification = PriorityClassification {
        assignments,
        excluded,
    };

    let counts = classification.tier_counts();
    log::debug!(
        "priority: critical={} targeted={} watch={} ignore={} excluded={}",
        counts[&PriorityTier::Critical],
        counts[&PriorityTier::Targeted],
        counts[&PriorityTier::Watch],
        counts[&PriorityTier::Ignore],
        classification.excluded.len()
    );
    for a in classification.of_tier(PriorityTier::Critical) {
        log::info!(
            "priority: '{}' is critical (loss={:.0}, churned={}, rate={:.1}%)",
            a.bucket.label,
            a.loss,
            a.bucket.churned,
            a.bucket.churn_rate
        );
    }

    classification
}
