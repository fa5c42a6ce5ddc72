//! Per-region salary means and vacancy shares over the full record set.
//!
//! Runs once, sequentially, after every partition is loaded. Regions holding
//! less than 1% of all vacancies (truncated percentage) are left out of the
//! ranked views; each view is sorted descending with ties in first-seen order
//! and cut to [`TOP_N`] entries.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::vacancy::Vacancy;
use crate::year_stats::floor_mean;

pub const TOP_N: usize = 10;
pub const MIN_SHARE_PERCENT: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaStat {
    pub mean_salary: i64,
    pub fraction: f64,
    pub count: usize,
}

/// One entry of a ranked region view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranked<T> {
    pub area: String,
    pub value: T,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AreaStats {
    /// Every region in first-seen order, before the share threshold.
    pub all: Vec<(String, AreaStat)>,
    pub by_salary: Vec<Ranked<i64>>,
    pub by_fraction: Vec<Ranked<f64>>,
}

impl AreaStats {
    pub fn get(&self, area: &str) -> Option<&AreaStat> {
        self.all.iter().find(|(name, _)| name == area).map(|(_, s)| s)
    }
}

/// Rounds to four decimal places. Exact half-way values go to the even neighbour.
pub fn round4(value: f64) -> f64 {
    let scaled = value * 10_000.0;
    let exact_tie = scaled.fract().abs() == 0.5 && scaled / 10_000.0 == value;
    let rounded = if exact_tie {
        scaled.round_ties_even()
    } else {
        scaled.round()
    };
    rounded / 10_000.0
}

/// Whether a region's share is at least one whole percent.
pub fn meets_share_threshold(fraction: f64) -> bool {
    (fraction * 100.0).floor() as i64 >= MIN_SHARE_PERCENT
}

pub fn compute_area_stats<'a, I>(vacancies: I) -> AreaStats
where
    I: IntoIterator<Item = &'a Vacancy>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut sums: Vec<(&'a str, f64, usize)> = Vec::new();
    let mut total = 0usize;
    for vacancy in vacancies {
        let slot = *index.entry(vacancy.area.as_str()).or_insert_with(|| {
            sums.push((vacancy.area.as_str(), 0.0, 0));
            sums.len() - 1
        });
        sums[slot].1 += vacancy.rub_average();
        sums[slot].2 += 1;
        total += 1;
    }
    if total == 0 {
        return AreaStats::default();
    }

    let all: Vec<(String, AreaStat)> = sums
        .into_iter()
        .map(|(area, sum, count)| {
            let stat = AreaStat {
                mean_salary: floor_mean(sum, count),
                fraction: round4(count as f64 / total as f64),
                count,
            };
            (area.to_string(), stat)
        })
        .collect();

    let appropriate: Vec<&(String, AreaStat)> = all
        .iter()
        .filter(|(_, stat)| meets_share_threshold(stat.fraction))
        .collect();
    debug!(
        regions = all.len(),
        appropriate = appropriate.len(),
        "Applied share threshold"
    );

    let mut by_salary: Vec<Ranked<i64>> = appropriate
        .iter()
        .map(|(area, stat)| Ranked {
            area: area.clone(),
            value: stat.mean_salary,
        })
        .collect();
    by_salary.sort_by(|a, b| b.value.cmp(&a.value));
    by_salary.truncate(TOP_N);

    let mut by_fraction: Vec<Ranked<f64>> = appropriate
        .iter()
        .map(|(area, stat)| Ranked {
            area: area.clone(),
            value: stat.fraction,
        })
        .collect();
    by_fraction.sort_by(|a, b| b.value.total_cmp(&a.value));
    by_fraction.truncate(TOP_N);

    info!(
        regions = all.len(),
        records = total,
        "Area statistics computed"
    );
    AreaStats {
        all,
        by_salary,
        by_fraction,
    }
}
