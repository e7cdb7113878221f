//! Record model: one customer snapshot and its observed outcome.
//!
//! Records are read-only once loaded. Nothing in the engine mutates a
//! `CustomerRecord`; every metric is derived from borrowed records.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    types::{CustomerId, Money},
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

// ── Status ───────────────────────────────────────────────────────────────────

/// Lifecycle outcome for the observation period. Exactly one per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CustomerStatus {
    #[serde(alias = "Stayed", alias = "active", alias = "stayed")]
    Active,
    #[serde(alias = "churned")]
    Churned,
    #[serde(alias = "Joined", alias = "new", alias = "joined")]
    New,
}

impl CustomerStatus {
    pub const ALL: [CustomerStatus; 3] = [Self::Active, Self::Churned, Self::New];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Churned => "Churned",
            Self::New => "New",
        }
    }
}

impl fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Record ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id:                 CustomerId,
    pub status:             CustomerStatus,
    pub city:               String,
    pub contract_type:      String,
    pub offer:              String,
    pub gender:             String,
    pub age:                u32,
    pub tenure_months:      u32,
    pub monthly_charge:     Money,
    pub total_revenue:      Money,
    pub lifetime_value:     Money,
    #[serde(default)]
    pub satisfaction_score: Option<u8>,
    #[serde(default)]
    pub churn_category:     Option<String>,
    #[serde(default)]
    pub churn_reason:       Option<String>,
    /// Upstream churn propensity. An input, never computed here.
    #[serde(default)]
    pub churn_score:        Option<f64>,
    #[serde(default)]
    pub latitude:           Option<f64>,
    #[serde(default)]
    pub longitude:          Option<f64>,
}

impl CustomerRecord {
    /// A record with empty attributes and zero amounts. Use the `with_*`
    /// methods to fill in what a fixture or loader needs.
    pub fn new(id: impl Into<CustomerId>, status: CustomerStatus) -> Self {
        Self {
            id: id.into(),
            status,
            city: String::new(),
            contract_type: String::new(),
            offer: String::new(),
            gender: String::new(),
            age: 0,
            tenure_months: 0,
            monthly_charge: 0.0,
            total_revenue: 0.0,
            lifetime_value: 0.0,
            satisfaction_score: None,
            churn_category: None,
            churn_reason: None,
            churn_score: None,
            latitude: None,
            longitude: None,
        }
    }

    pub fn is_churned(&self) -> bool {
        self.status == CustomerStatus::Churned
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    pub fn with_contract(mut self, contract_type: impl Into<String>) -> Self {
        self.contract_type = contract_type.into();
        self
    }

    pub fn with_offer(mut self, offer: impl Into<String>) -> Self {
        self.offer = offer.into();
        self
    }

    pub fn with_gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = gender.into();
        self
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = age;
        self
    }

    pub fn with_tenure(mut self, tenure_months: u32) -> Self {
        self.tenure_months = tenure_months;
        self
    }

    pub fn with_monthly_charge(mut self, amount: Money) -> Self {
        self.monthly_charge = amount;
        self
    }

    pub fn with_revenue(mut self, total_revenue: Money) -> Self {
        self.total_revenue = total_revenue;
        self
    }

    pub fn with_lifetime_value(mut self, lifetime_value: Money) -> Self {
        self.lifetime_value = lifetime_value;
        self
    }

    pub fn with_satisfaction(mut self, score: u8) -> Self {
        self.satisfaction_score = Some(score);
        self
    }

    pub fn with_churn_details(
        mut self,
        category: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        self.churn_category = Some(category.into());
        self.churn_reason = Some(reason.into());
        self
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Check the record-level invariants. Loaders call this; the engine
    /// assumes its input already passed.
    pub fn validate(&self) -> AnalyticsResult<()> {
        let fail = |reason: String| {
            Err(AnalyticsError::InvalidRecord {
                id: self.id.clone(),
                reason,
            })
        };

        if self.id.trim().is_empty() {
            return fail("id is empty".into());
        }

        for (name, amount) in [
            ("monthly_charge", self.monthly_charge),
            ("total_revenue", self.total_revenue),
            ("lifetime_value", self.lifetime_value),
        ] {
            if !amount.is_finite() || amount < 0.0 {
                return fail(format!("{name}={amount} must be a non-negative amount"));
            }
        }

        if let Some(score) = self.satisfaction_score {
            if !(1..=5).contains(&score) {
                return fail(format!("satisfaction_score={score} outside 1-5"));
            }
        }

        let has_churn_details = self.churn_category.is_some() || self.churn_reason.is_some();
        if self.is_churned() && (self.churn_category.is_none() || self.churn_reason.is_none()) {
            return fail("churned record is missing churn_category/churn_reason".into());
        }
        if !self.is_churned() && has_churn_details {
            return fail(format!(
                "status {} must not carry churn_category/churn_reason",
                self.status
            ));
        }

        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return fail(format!("latitude={lat} outside [-90, 90]"));
            }
        }
        if let Some(lon) = self.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return fail(format!("longitude={lon} outside [-180, 180]"));
            }
        }

        Ok(())
    }
}

/// Validate every record and reject duplicate ids.
pub fn validate_all(records: &[CustomerRecord]) -> AnalyticsResult<()> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
    for record in records {
        record.validate()?;
        if !seen.insert(record.id.as_str()) {
            return Err(AnalyticsError::InvalidRecord {
                id: record.id.clone(),
                reason: "duplicate id".into(),
            });
        }
    }
    Ok(())
}

// ── Field selectors ──────────────────────────────────────────────────────────

/// Categorical attributes a filter or segment can key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    City,
    ContractType,
    Offer,
    Gender,
    Status,
    ChurnCategory,
    ChurnReason,
}

impl CategoricalField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::City => "city",
            Self::ContractType => "contract_type",
            Self::Offer => "offer",
            Self::Gender => "gender",
            Self::Status => "status",
            Self::ChurnCategory => "churn_category",
            Self::ChurnReason => "churn_reason",
        }
    }

    /// The record's value, or `None` when missing. Blank strings count as missing.
    pub fn value<'a>(&self, record: &'a CustomerRecord) -> Option<&'a str> {
        let raw = match self {
            Self::City => record.city.as_str(),
            Self::ContractType => record.contract_type.as_str(),
            Self::Offer => record.offer.as_str(),
            Self::Gender => record.gender.as_str(),
            Self::Status => record.status.as_str(),
            Self::ChurnCategory => record.churn_category.as_deref()?,
            Self::ChurnReason => record.churn_reason.as_deref()?,
        };
        if raw.trim().is_empty() {
            None
        } else {
            Some(raw)
        }
    }
}

impl FromStr for CategoricalField {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "city" => Ok(Self::City),
            "contract" | "contract_type" => Ok(Self::ContractType),
            "offer" => Ok(Self::Offer),
            "gender" => Ok(Self::Gender),
            "status" | "customer_status" => Ok(Self::Status),
            "churn_category" => Ok(Self::ChurnCategory),
            "churn_reason" => Ok(Self::ChurnReason),
            other => Err(AnalyticsError::InvalidFilter {
                field: other.to_string(),
                reason: "unknown categorical field".into(),
            }),
        }
    }
}

/// Numeric attributes a range filter or bin scheme can key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    Age,
    TenureMonths,
    MonthlyCharge,
    TotalRevenue,
    LifetimeValue,
    SatisfactionScore,
    ChurnScore,
    Latitude,
    Longitude,
}

impl NumericField {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Age => "age",
            Self::TenureMonths => "tenure_months",
            Self::MonthlyCharge => "monthly_charge",
            Self::TotalRevenue => "total_revenue",
            Self::LifetimeValue => "lifetime_value",
            Self::SatisfactionScore => "satisfaction_score",
            Self::ChurnScore => "churn_score",
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
        }
    }

    /// The record's value, or `None` when missing or not a number.
    pub fn value(&self, record: &CustomerRecord) -> Option<f64> {
        let v = match self {
            Self::Age => record.age as f64,
            Self::TenureMonths => record.tenure_months as f64,
            Self::MonthlyCharge => record.monthly_charge,
            Self::TotalRevenue => record.total_revenue,
            Self::LifetimeValue => record.lifetime_value,
            Self::SatisfactionScore => record.satisfaction_score? as f64,
            Self::ChurnScore => record.churn_score?,
            Self::Latitude => record.latitude?,
            Self::Longitude => record.longitude?,
        };
        if v.is_nan() {
            None
        } else {
            Some(v)
        }
    }
}

impl FromStr for NumericField {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "age" => Ok(Self::Age),
            "tenure" | "tenure_months" => Ok(Self::TenureMonths),
            "monthly_charge" => Ok(Self::MonthlyCharge),
            "total_revenue" | "revenue" => Ok(Self::TotalRevenue),
            "lifetime_value" | "cltv" => Ok(Self::LifetimeValue),
            "satisfaction" | "satisfaction_score" => Ok(Self::SatisfactionScore),
            "churn_score" => Ok(Self::ChurnScore),
            "latitude" => Ok(Self::Latitude),
            "longitude" => Ok(Self::Longitude),
            other => Err(AnalyticsError::InvalidFilter {
                field: other.to_string(),
                reason: "unknown numeric field".into(),
            }),
        }
    }
}

/// The monetary subset of `NumericField`, used for concentration analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonetaryField {
    MonthlyCharge,
    TotalRevenue,
    LifetimeValue,
}

impl MonetaryField {
    pub fn value(&self, record: &CustomerRecord) -> Money {
        match self {
            Self::MonthlyCharge => record.monthly_charge,
            Self::TotalRevenue => record.total_revenue,
            Self::LifetimeValue => record.lifetime_value,
        }
    }
}

impl From<MonetaryField> for NumericField {
    fn from(field: MonetaryField) -> Self {
        match field {
            MonetaryField::MonthlyCharge => NumericField::MonthlyCharge,
            MonetaryField::TotalRevenue => NumericField::TotalRevenue,
            MonetaryField::LifetimeValue => NumericField::LifetimeValue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_status_spellings_deserialize() {
        let stayed: CustomerStatus = serde_json::from_str("\"Stayed\"").unwrap();
        let joined: CustomerStatus = serde_json::from_str("\"Joined\"").unwrap();
        assert_eq!(stayed, CustomerStatus::Active);
        assert_eq!(joined, CustomerStatus::New);
    }

    #[test]
    fn churn_details_required_iff_churned() {
        let churned = CustomerRecord::new("c-1", CustomerStatus::Churned);
        assert!(churned.validate().is_err());
        assert!(churned
            .with_churn_details("Competitor", "Better devices")
            .validate()
            .is_ok());

        let active = CustomerRecord::new("c-2", CustomerStatus::Active)
            .with_churn_details("Competitor", "Better devices");
        assert!(active.validate().is_err());
    }

    #[test]
    fn satisfaction_outside_domain_is_rejected() {
        let r = CustomerRecord::new("c-1", CustomerStatus::Active).with_satisfaction(6);
        assert!(r.validate().is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let records = vec![
            CustomerRecord::new("c-1", CustomerStatus::Active),
            CustomerRecord::new("c-1", CustomerStatus::New),
        ];
        assert!(validate_all(&records).is_err());
    }

    #[test]
    fn blank_categorical_value_reads_as_missing() {
        let r = CustomerRecord::new("c-1", CustomerStatus::Active).with_city("  ");
        assert_eq!(CategoricalField::City.value(&r), None);
        assert_eq!(CategoricalField::Status.value(&r), Some("Active"));
    }
}
