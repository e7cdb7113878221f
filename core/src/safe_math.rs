//! Safe arithmetic: the single home of the engine's division policy.
//!
//! RULE: every rate in the engine is computed through `safe_percentage`.
//! An empty denominator yields the caller's default (0 for rates), never
//! a panic, an infinity or a NaN. Only `checked_divide` reports failure,
//! for callers that explicitly want no default.

use crate::error::{AnalyticsError, AnalyticsResult};

/// Divide, falling back to `default` when the quotient is not a finite number.
pub fn safe_divide(numerator: f64, denominator: f64, default: f64) -> f64 {
    if denominator == 0.0 || numerator.is_nan() || denominator.is_nan() {
        return default;
    }
    let quotient = numerator / denominator;
    if quotient.is_finite() {
        quotient
    } else {
        default
    }
}

/// `round(safe_divide(part, whole, 0) × 100, decimals)`.
///
/// Negative parts are allowed (NPS runs from -100 to +100).
pub fn safe_percentage(part: f64, whole: f64, decimals: u32) -> f64 {
    round_to(safe_divide(part, whole, 0.0) * 100.0, decimals)
}

/// Division with no safe default: undefined results are an error.
pub fn checked_divide(metric: &str, numerator: f64, denominator: f64) -> AnalyticsResult<f64> {
    if denominator == 0.0 {
        return Err(AnalyticsError::UndefinedMetric {
            metric: metric.to_string(),
            reason: "denominator is zero".into(),
        });
    }
    let quotient = numerator / denominator;
    if quotient.is_finite() {
        Ok(quotient)
    } else {
        Err(AnalyticsError::UndefinedMetric {
            metric: metric.to_string(),
            reason: format!("{numerator} / {denominator} is not finite"),
        })
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals.min(i32::MAX as u32) as i32);
    let widened = value * factor;
    // Past f64 precision there is nothing left to round.
    if !factor.is_finite() || !widened.is_finite() {
        return value;
    }
    let scaled = widened.round() / factor;
    // Normalise -0.0 so serialised output never shows "-0.0".
    if scaled == 0.0 {
        0.0
    } else {
        scaled
    }
}
