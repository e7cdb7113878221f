//! Attrition analytics engine.
//!
//! Turns a filtered collection of customer records into validated,
//! significance-checked, financially weighted churn metrics. Every stage
//! is a pure function of its inputs and an explicit configuration value.

pub mod aggregate;
pub mod concentration;
pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod financial;
pub mod geo;
pub mod headline;
pub mod nps;
pub mod population;
pub mod priority;
pub mod record;
pub mod rng;
pub mod safe_math;
pub mod segment;
pub mod significance;
pub mod types;

pub use aggregate::{aggregate, BucketSummary};
pub use concentration::{concentration, ConcentrationResult};
pub use config::EngineConfig;
pub use engine::{AttritionEngine, AttritionReport};
pub use error::{AnalyticsError, AnalyticsResult};
pub use filter::{apply_filters, FilterCriteria};
pub use financial::{financial_impact, FinancialImpactEstimate, Roi};
pub use nps::{nps, NpsSummary};
pub use priority::{classify_priority, PriorityTier};
pub use record::{CustomerRecord, CustomerStatus};
pub use segment::{segment, SegmentSpec};
pub use significance::filter_significant;
