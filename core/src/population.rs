//! Synthetic population: deterministic, valid customer records from a seed.
//!
//! Used by the report runner's demo mode and by tests that need a
//! realistic population. The shape loosely follows a telco book:
//! month-to-month contracts churn most, low satisfaction raises churn,
//! short tenure customers are often new joiners.

use crate::{
    record::{CustomerRecord, CustomerStatus},
    rng::{RngStream, StreamRng},
};

pub const CITIES: &[(&str, f64, f64)] = &[
    ("Los Angeles", 34.0522, -118.2437),
    ("San Diego", 32.7157, -117.1611),
    ("San Jose", 37.3382, -121.8863),
    ("San Francisco", 37.7749, -122.4194),
    ("Sacramento", 38.5816, -121.4944),
    ("Fresno", 36.7378, -119.7871),
    ("Long Beach", 33.7701, -118.1937),
    ("Oakland", 37.8044, -122.2712),
];

pub const CONTRACTS: &[&str] = &["Month-to-Month", "One Year", "Two Year"];
const CONTRACT_WEIGHTS: &[f64] = &[0.51, 0.21, 0.28];
const CONTRACT_CHURN: &[f64] = &[0.42, 0.11, 0.03];

pub const OFFERS: &[&str] = &["None", "Offer A", "Offer B", "Offer C", "Offer D", "Offer E"];
const OFFER_WEIGHTS: &[f64] = &[0.55, 0.07, 0.12, 0.06, 0.09, 0.11];

const GENDERS: &[&str] = &["Female", "Male"];

const SCORE_WEIGHTS: &[f64] = &[0.10, 0.15, 0.35, 0.25, 0.15];

const CHURN_DETAILS: &[(&str, &[&str])] = &[
    ("Competitor", &["Competitor had better devices", "Competitor made better offer"]),
    ("Dissatisfaction", &["Network reliability", "Product dissatisfaction"]),
    ("Attitude", &["Attitude of support person", "Attitude of service provider"]),
    ("Price", &["Price too high", "Extra data charges"]),
    ("Other", &["Moved", "Deceased", "Don't know"]),
];

#[derive(Debug, Clone, Copy)]
pub struct SyntheticPopulation {
    pub seed: u64,
    pub size: usize,
}

impl SyntheticPopulation {
    pub fn new(seed: u64, size: usize) -> Self {
        Self { seed, size }
    }

    pub fn generate(&self) -> Vec<CustomerRecord> {
        let mut demo = StreamRng::new(self.seed, RngStream::Demographics);
        let mut contract_rng = StreamRng::new(self.seed, RngStream::Contract);
        let mut billing = StreamRng::new(self.seed, RngStream::Billing);
        let mut outcome = StreamRng::new(self.seed, RngStream::Outcome);
        let mut satisfaction = StreamRng::new(self.seed, RngStream::Satisfaction);
        let mut location = StreamRng::new(self.seed, RngStream::Location);

        let mut records = Vec::with_capacity(self.size);

        for i in 0..self.size {
            let gender = *demo.pick(GENDERS);
            let age = 19 + demo.next_u64_below(62) as u32;

            let &(city, lat, lon) = location.pick(CITIES);
            let has_location = location.chance(0.95);

            let contract_idx = contract_rng.pick_weighted(CONTRACT_WEIGHTS);
            let offer = OFFERS[contract_rng.pick_weighted(OFFER_WEIGHTS)];
            let tenure_months = 1 + contract_rng.next_u64_below(72) as u32;

            let monthly_charge = round_cents(billing.uniform(18.0, 120.0));
            let total_revenue =
                round_cents(monthly_charge * tenure_months as f64 * billing.uniform(0.9, 1.1));
            let lifetime_value = round_cents(billing.uniform(2_000.0, 7_000.0));

            let score = if satisfaction.chance(0.9) {
                Some(1 + satisfaction.pick_weighted(SCORE_WEIGHTS) as u8)
            } else {
                None
            };

            let mut p_churn = CONTRACT_CHURN[contract_idx];
            match score {
                Some(s) if s <= 2 => p_churn += 0.25,
                Some(s) if s >= 4 => p_churn = (p_churn - 0.10).max(0.01),
                _ => {}
            }
            let churned = outcome.chance(p_churn);
            let status = if churned {
                CustomerStatus::Churned
            } else if tenure_months <= 6 && outcome.chance(0.6) {
                CustomerStatus::New
            } else {
                CustomerStatus::Active
            };
            let churn_score = round_cents((p_churn + outcome.uniform(-0.1, 0.1)).clamp(0.0, 1.0) * 100.0);

            let mut record = CustomerRecord::new(format!("c-{i:06}"), status)
                .with_gender(gender)
                .with_age(age)
                .with_city(city)
                .with_contract(CONTRACTS[contract_idx])
                .with_offer(offer)
                .with_tenure(tenure_months)
                .with_monthly_charge(monthly_charge)
                .with_revenue(total_revenue)
                .with_lifetime_value(lifetime_value);
            record.satisfaction_score = score;
            record.churn_score = Some(churn_score);
            if has_location {
                record = record.with_location(lat, lon);
            }
            if churned {
                let (category, reasons) = *outcome.pick(CHURN_DETAILS);
                let reason = *outcome.pick(reasons);
                record = record.with_churn_details(category, reason);
            }

            records.push(record);
        }

        log::debug!(
            "population: generated {} records from seed {}",
            records.len(),
            self.seed
        );
        records
    }
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
