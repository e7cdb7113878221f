//! Concentration analyzer: Lorenz curve and Gini coefficient.
//!
//! Records are sorted ascending by the monetary field; the curve starts
//! at the origin and ends at (1, 1). Gini = 1 − 2 × (trapezoidal area
//! under the curve). A zero total has no concentration: Gini is 0.

use crate::{
    record::{CustomerRecord, MonetaryField},
    safe_math::safe_divide,
    types::Money,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LorenzPoint {
    pub population_share: f64,
    pub value_share:      f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationResult {
    pub field:         MonetaryField,
    pub population:    usize,
    pub total_value:   Money,
    pub lorenz_points: Vec<LorenzPoint>,
    pub gini:          f64,
}

impl ConcentrationResult {
    /// Share of the total held by the top `fraction` of the population,
    /// read off the curve with linear interpolation. Both in [0, 1].
    pub fn top_share(&self, fraction: f64) -> f64 {
        if self.total_value <= 0.0 || self.lorenz_points.len() < 2 {
            return 0.0;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        (1.0 - self.lorenz_at(1.0 - fraction)).clamp(0.0, 1.0)
    }

    fn lorenz_at(&self, x: f64) -> f64 {
        for pair in self.lorenz_points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if x <= b.population_share {
                let span = b.population_share - a.population_share;
                let t = safe_divide(x - a.population_share, span, 0.0);
                return a.value_share + t * (b.value_share - a.value_share);
            }
        }
        self.lorenz_points
            .last()
            .map_or(0.0, |p| p.value_share)
    }
}

pub fn concentration<'a, I>(records: I, field: MonetaryField) -> ConcentrationResult
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let mut values: Vec<f64> = records
        .into_iter()
        .map(|r| {
            let v = field.value(r);
            if v.is_finite() {
                v
            } else {
                0.0
            }
        })
        .collect();
    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    let total: f64 = values.iter().sum();

    let mut lorenz_points = Vec::with_capacity(n + 1);
    lorenz_points.push(LorenzPoint {
        population_share: 0.0,
        value_share: 0.0,
    });
    let mut cumulative = 0.0;
    for (i, v) in values.iter().enumerate() {
        cumulative += v;
        lorenz_points.push(LorenzPoint {
            population_share: (i + 1) as f64 / n as f64,
            value_share: safe_divide(cumulative, total, 0.0),
        });
    }

    let gini = if n == 0 || total <= 0.0 {
        if n > 0 {
            log::warn!("concentration: {field:?} totals zero over {n} records, gini reported as 0");
        }
        0.0
    } else {
        let area: f64 = lorenz_points
            .windows(2)
            .map(|w| {
                (w[1].population_share - w[0].population_share)
                    * (w[1].value_share + w[0].value_share)
                    / 2.0
            })
            .sum();
        (1.0 - 2.0 * area).clamp(0.0, 1.0)
    };

    ConcentrationResult {
        field,
        population: n,
        total_value: total,
        lorenz_points,
        gini,
    }
}
