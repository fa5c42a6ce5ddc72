//! Per-year salary means and counts, overall and for the selected title.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::error::{Phase, Result, StatsError};
use crate::loader::VacanciesByYear;
use crate::pool::{run_blocking, WorkerPool};
use crate::vacancy::Vacancy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearStat {
    pub mean_salary: i64,
    pub count: usize,
    pub selected_mean_salary: i64,
    pub selected_count: usize,
}

/// Aggregates one year's vacancies in a single pass.
///
/// `vacancies` must be non-empty. The selected fields only count titles that
/// contain `selected_title` as an exact, case-sensitive substring, and are both
/// zero whenever `selected_title` is empty.
pub fn compute_year_stat(vacancies: &[Vacancy], selected_title: &str) -> YearStat {
    let mut sum = 0.0;
    let mut selected_sum = 0.0;
    let mut selected_count = 0usize;
    for vacancy in vacancies {
        sum += vacancy.rub_average();
        if !selected_title.is_empty() && vacancy.title.contains(selected_title) {
            selected_sum += vacancy.rub_average();
            selected_count += 1;
        }
    }
    let count = vacancies.len();
    YearStat {
        mean_salary: floor_mean(sum, count),
        count,
        selected_mean_salary: if selected_count > 0 {
            floor_mean(selected_sum, selected_count)
        } else {
            0
        },
        selected_count,
    }
}

pub(crate) fn floor_mean(sum: f64, count: usize) -> i64 {
    (sum / count as f64).floor() as i64
}

/// Runs [`compute_year_stat`] for every loaded year on the pool.
pub async fn compute_year_stats(
    loaded: Arc<VacanciesByYear>,
    selected_title: &str,
    pool: &WorkerPool,
) -> Result<BTreeMap<i32, YearStat>> {
    let years: Vec<i32> = loaded.keys().copied().collect();
    info!(years = years.len(), selected_title, "Computing year statistics");
    let selected_title: Arc<str> = Arc::from(selected_title);
    pool.run_per_year(Phase::YearStats, years, |year| {
        let loaded = loaded.clone();
        let selected_title = selected_title.clone();
        async move {
            run_blocking(Phase::YearStats, move || {
                let vacancies = loaded
                    .get(&year)
                    .ok_or(StatsError::PartitionNotFound(year))?;
                Ok(compute_year_stat(vacancies, &selected_title))
            })
            .await
        }
    })
    .await
}
