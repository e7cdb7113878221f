//! Headline KPIs: the top-line counters above every segment view.

use crate::{
    record::{CustomerRecord, CustomerStatus},
    safe_math::safe_percentage,
    types::Percent,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttritionHeadline {
    pub total_customers: usize,
    pub active:          usize,
    pub churned:         usize,
    pub new_customers:   usize,
    /// active + churned: customers installed before the period.
    pub installed_base:  usize,
    /// active + new: customers on the books at period end.
    pub net_active:      usize,
    pub churn_rate:      Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusShare {
    pub status: CustomerStatus,
    pub count:  usize,
    pub share:  Percent,
}

pub fn headline<'a, I>(records: I, rate_decimals: u32) -> AttritionHeadline
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let (mut active, mut churned, mut new_customers) = (0usize, 0usize, 0usize);
    for record in records {
        match record.status {
            CustomerStatus::Active => active += 1,
            CustomerStatus::Churned => churned += 1,
            CustomerStatus::New => new_customers += 1,
        }
    }
    let total_customers = active + churned + new_customers;

    AttritionHeadline {
        total_customers,
        active,
        churned,
        new_customers,
        installed_base: active + churned,
        net_active: active + new_customers,
        churn_rate: safe_percentage(churned as f64, total_customers as f64, rate_decimals),
    }
}

/// Count and share of each status, in `CustomerStatus::ALL` order.
pub fn status_breakdown(headline: &AttritionHeadline, rate_decimals: u32) -> Vec<StatusShare> {
    let whole = headline.total_customers as f64;
    CustomerStatus::ALL
        .iter()
        .map(|&status| {
            let count = match status {
                CustomerStatus::Active => headline.active,
                CustomerStatus::Churned => headline.churned,
                CustomerStatus::New => headline.new_customers,
            };
            StatusShare {
                status,
                count,
                share: safe_percentage(count as f64, whole, rate_decimals),
            }
        })
        .collect()
}
