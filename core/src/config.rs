use crate::{
    error::{AnalyticsError, AnalyticsResult},
    record::MonetaryField,
    types::{Money, Percent, DEFAULT_MIN_SAMPLE_SIZE},
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ── Significance ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignificanceConfig {
    pub min_sample_size: usize,
}

impl Default for SignificanceConfig {
    fn default() -> Self {
        Self {
            min_sample_size: DEFAULT_MIN_SAMPLE_SIZE,
        }
    }
}

// ── Financial assumptions ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialConfig {
    /// Monetary value assigned to each lost customer.
    pub unit_cltv: Money,
    /// Share of the loss a retention campaign is assumed to win back, in [0, 1].
    pub retention_recovery_rate: f64,
    /// Cost of the retention campaign. ROI is undefined without it.
    #[serde(default)]
    pub campaign_cost: Option<Money>,
}

impl Default for FinancialConfig {
    fn default() -> Self {
        Self {
            unit_cltv: 3_000.0,
            retention_recovery_rate: 0.30,
            campaign_cost: None,
        }
    }
}

impl FinancialConfig {
    pub fn validate(&self) -> AnalyticsResult<()> {
        if !self.unit_cltv.is_finite() || self.unit_cltv < 0.0 {
            return Err(AnalyticsError::InvalidConfig {
                reason: format!("unit_cltv={} must be a non-negative amount", self.unit_cltv),
            });
        }
        if !(0.0..=1.0).contains(&self.retention_recovery_rate) {
            return Err(AnalyticsError::InvalidConfig {
                reason: format!(
                    "retention_recovery_rate={} outside [0, 1]",
                    self.retention_recovery_rate
                ),
            });
        }
        if let Some(cost) = self.campaign_cost {
            if !cost.is_finite() || cost < 0.0 {
                return Err(AnalyticsError::InvalidConfig {
                    reason: format!("campaign_cost={cost} must be a non-negative amount"),
                });
            }
        }
        Ok(())
    }
}

// ── Priority thresholds ────────────────────────────────────────────

/// One tier's OR-combined triggers. Any single one is sufficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierTrigger {
    pub loss:   Money,
    pub volume: usize,
    pub rate:   Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityThresholds {
    pub critical:   TierTrigger,
    pub targeted:   TierTrigger,
    pub watch_rate: Percent,
}

impl Default for PriorityThresholds {
    fn default() -> Self {
        Self {
            critical: TierTrigger {
                loss: 150_000.0,
                volume: 50,
                rate: 30.0,
            },
            targeted: TierTrigger {
                loss: 75_000.0,
                volume: 25,
                rate: 25.0,
            },
            watch_rate: 20.0,
        }
    }
}

impl PriorityThresholds {
    pub fn validate(&self) -> AnalyticsResult<()> {
        for (tier, trigger) in [("critical", &self.critical), ("targeted", &self.targeted)] {
            if !trigger.loss.is_finite() || trigger.loss < 0.0 {
                return Err(AnalyticsError::InvalidConfig {
                    reason: format!("{tier}.loss={} must be a non-negative amount", trigger.loss),
                });
            }
            check_rate(&format!("{tier}.rate"), trigger.rate)?;
        }
        check_rate("watch_rate", self.watch_rate)
    }
}

fn check_rate(name: &str, rate: Percent) -> AnalyticsResult<()> {
    if rate.is_nan() || !(0.0..=100.0).contains(&rate) {
        return Err(AnalyticsError::InvalidConfig {
            reason: format!("{name}={rate} outside [0, 100]"),
        });
    }
    Ok(())
}

// ── Rounding ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundingConfig {
    /// Decimal places kept on churn rates and NPS.
    pub rate_decimals: u32,
}

impl Default for RoundingConfig {
    fn default() -> Self {
        Self { rate_decimals: 1 }
    }
}

// ── Engine config ──────────────────────────────────────────────────

/// Every tunable the engine reads. Passed explicitly into each call;
/// there is no process-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub significance:        SignificanceConfig,
    #[serde(default)]
    pub financial:           FinancialConfig,
    #[serde(default)]
    pub priority:            PriorityThresholds,
    #[serde(default)]
    pub rounding:            RoundingConfig,
    #[serde(default = "default_concentration_field")]
    pub concentration_field: MonetaryField,
}

fn default_concentration_field() -> MonetaryField {
    MonetaryField::TotalRevenue
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            significance: SignificanceConfig::default(),
            financial: FinancialConfig::default(),
            priority: PriorityThresholds::default(),
            rounding: RoundingConfig::default(),
            concentration_field: default_concentration_field(),
        }
    }
}

impl EngineConfig {
    /// Load a JSON config file. Absent sections take their defaults.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_json(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> AnalyticsResult<Self> {
        let config: EngineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AnalyticsResult<()> {
        self.financial.validate()?;
        self.priority.validate()?;
        if self.rounding.rate_decimals > 6 {
            return Err(AnalyticsError::InvalidConfig {
                reason: format!(
                    "rate_decimals={} exceeds the 6 places f64 rates can carry",
                    self.rounding.rate_decimals
                ),
            });
        }
        Ok(())
    }

    /// Config with the default significance gate lowered for small fixtures.
    pub fn default_test() -> Self {
        Self {
            significance: SignificanceConfig { min_sample_size: 5 },
            ..Self::default()
        }
    }
}
