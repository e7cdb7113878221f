//! Geographic footprint: churn per city with a representative coordinate.

use crate::{
    record::{CategoricalField, CustomerRecord},
    safe_math::safe_percentage,
    types::Percent,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityFootprint {
    pub city:       String,
    pub latitude:   f64,
    pub longitude:  f64,
    pub total:      usize,
    pub churned:    usize,
    pub churn_rate: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoFootprint {
    pub cities:    Vec<CityFootprint>,
    /// Records lacking a city or either coordinate.
    pub unlocated: usize,
}

#[derive(Default)]
struct CityAcc {
    lat_sum: f64,
    lon_sum: f64,
    total:   usize,
    churned: usize,
}

/// Cities sorted by name. Coordinates are the mean over located members.
pub fn city_footprint<'a, I>(records: I, rate_decimals: u32) -> GeoFootprint
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let mut cities: BTreeMap<&'a str, CityAcc> = BTreeMap::new();
    let mut unlocated = 0usize;

    for record in records {
        let located = CategoricalField::City
            .value(record)
            .zip(record.latitude.zip(record.longitude));
        match located {
            Some((city, (lat, lon))) if lat.is_finite() && lon.is_finite() => {
                let acc = cities.entry(city).or_default();
                acc.lat_sum += lat;
                acc.lon_sum += lon;
                acc.total += 1;
                if record.is_churned() {
                    acc.churned += 1;
                }
            }
            _ => unlocated += 1,
        }
    }

    if unlocated > 0 {
        log::debug!("geo: {unlocated} records without a usable location");
    }

    GeoFootprint {
        cities: cities
            .into_iter()
            .map(|(city, acc)| {
                let n = acc.total as f64;
                CityFootprint {
                    city: city.to_string(),
                    latitude: acc.lat_sum / n,
                    longitude: acc.lon_sum / n,
                    total: acc.total,
                    churned: acc.churned,
                    churn_rate: safe_percentage(acc.churned as f64, n, rate_decimals),
                }
            })
            .collect(),
        unlocated,
    }
}
