//! Satisfaction / NPS scorer over the 1–5 satisfaction scale.
//!
//! Promoters score 4–5, passives 3, detractors 1–2. Records without a
//! score (or with one outside 1–5) are not respondents.

use crate::{record::CustomerRecord, safe_math::safe_percentage, types::Percent};
use serde::{Deserialize, Serialize};

pub const PROMOTER_MIN: u8 = 4;
pub const DETRACTOR_MAX: u8 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpsSummary {
    pub respondents:  usize,
    pub promoters:    usize,
    pub passives:     usize,
    pub detractors:   usize,
    /// In [-100, 100].
    pub nps_score:    Percent,
    /// Respondents per score; index 0 is score 1.
    pub score_counts: [usize; 5],
    pub avg_score:    Option<f64>,
}

pub fn nps<'a, I>(records: I, decimals: u32) -> NpsSummary
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let mut score_counts = [0usize; 5];
    let mut ignored = 0usize;

    for record in records {
        match record.satisfaction_score {
            Some(score @ 1..=5) => score_counts[(score - 1) as usize] += 1,
            Some(_) => ignored += 1,
            None => {}
        }
    }
    if ignored > 0 {
        log::warn!("nps: ignored {ignored} scores outside 1-5");
    }

    let respondents: usize = score_counts.iter().sum();
    let detractors: usize = score_counts[..DETRACTOR_MAX as usize].iter().sum();
    let passives = score_counts[2];
    let promoters: usize = score_counts[(PROMOTER_MIN - 1) as usize..].iter().sum();

    let weighted: usize = score_counts
        .iter()
        .enumerate()
        .map(|(i, c)| (i + 1) * c)
        .sum();
    let avg_score = if respondents > 0 {
        Some(weighted as f64 / respondents as f64)
    } else {
        None
    };

    NpsSummary {
        respondents,
        promoters,
        passives,
        detractors,
        nps_score: safe_percentage(
            promoters as f64 - detractors as f64,
            respondents as f64,
            decimals,
        ),
        score_counts,
        avg_score,
    }
}
