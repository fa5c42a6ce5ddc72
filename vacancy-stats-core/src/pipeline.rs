//! Top-level pipeline: partition → load → year statistics → area statistics.
//!
//! The driver walks a fixed sequence of [`PipelineState`]s, never re-entering one:
//!   - `Partitioned`: the store holds one partition per year
//!   - `Loaded`: every load task has finished (first barrier)
//!   - `YearStatsReady`: every year-statistics task has finished (second barrier)
//!   - `AreaStatsReady`: the sequential area pass over all records is done
//!   - `Done`: the immutable [`StatisticsBundle`] is handed back
//!
//! With no rows at all (or none well-formed) the run stops early with
//! [`PipelineOutcome::NoData`] instead of aggregating.
//!
//! # Error Handling
//! Any task failure in the pooled phases aborts the run; no partial per-year
//! data is ever returned.
//!
//! # Navigation
//! - Entrypoints: [`StatsPipeline::run`], [`StatsPipeline::run_rows`]
//! - Output: [`PipelineOutcome`], [`StatisticsBundle`]

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::area_stats::{compute_area_stats, AreaStats, Ranked};
use crate::config::StatsConfig;
use crate::currency::RubConverter;
use crate::error::Result;
use crate::loader::load_partitions;
use crate::partition::partition_by_year;
use crate::pool::WorkerPool;
use crate::store::{MemoryStore, PartitionStore};
use crate::vacancy::RawRow;
use crate::year_stats::{compute_year_stats, YearStat};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PipelineState {
    Partitioned,
    Loaded,
    YearStatsReady,
    AreaStatsReady,
    Done,
}

impl PipelineState {
    pub fn next(self) -> Option<Self> {
        match self {
            PipelineState::Partitioned => Some(PipelineState::Loaded),
            PipelineState::Loaded => Some(PipelineState::YearStatsReady),
            PipelineState::YearStatsReady => Some(PipelineState::AreaStatsReady),
            PipelineState::AreaStatsReady => Some(PipelineState::Done),
            PipelineState::Done => None,
        }
    }
}

/// Everything the reporting layer needs. Year maps are keyed ascending;
/// region views are ranked and at most ten entries long.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsBundle {
    pub salary_by_year: BTreeMap<i32, i64>,
    pub count_by_year: BTreeMap<i32, usize>,
    pub selected_salary_by_year: BTreeMap<i32, i64>,
    pub selected_count_by_year: BTreeMap<i32, usize>,
    pub salary_by_area: Vec<Ranked<i64>>,
    pub fraction_by_area: Vec<Ranked<f64>>,
}

impl StatisticsBundle {
    pub fn new(year_stats: &BTreeMap<i32, YearStat>, area_stats: AreaStats) -> Self {
        let mut bundle = Self {
            salary_by_year: BTreeMap::new(),
            count_by_year: BTreeMap::new(),
            selected_salary_by_year: BTreeMap::new(),
            selected_count_by_year: BTreeMap::new(),
            salary_by_area: area_stats.by_salary,
            fraction_by_area: area_stats.by_fraction,
        };
        for (&year, stat) in year_stats {
            bundle.salary_by_year.insert(year, stat.mean_salary);
            bundle.count_by_year.insert(year, stat.count);
            bundle.selected_salary_by_year.insert(year, stat.selected_mean_salary);
            bundle.selected_count_by_year.insert(year, stat.selected_count);
        }
        bundle
    }

    pub fn year_stat(&self, year: i32) -> Option<YearStat> {
        Some(YearStat {
            mean_salary: *self.salary_by_year.get(&year)?,
            count: *self.count_by_year.get(&year)?,
            selected_mean_salary: *self.selected_salary_by_year.get(&year)?,
            selected_count: *self.selected_count_by_year.get(&year)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PipelineOutcome {
    NoData,
    Done(StatisticsBundle),
}

impl PipelineOutcome {
    pub fn bundle(&self) -> Option<&StatisticsBundle> {
        match self {
            PipelineOutcome::Done(bundle) => Some(bundle),
            PipelineOutcome::NoData => None,
        }
    }
}

pub struct StatsPipeline {
    config: StatsConfig,
    converter: Arc<dyn RubConverter>,
    pool: WorkerPool,
    state: Option<PipelineState>,
}

impl StatsPipeline {
    pub fn new(config: StatsConfig, converter: Arc<dyn RubConverter>) -> Self {
        let pool = WorkerPool::new(config.workers);
        Self {
            config,
            converter,
            pool,
            state: None,
        }
    }

    fn enter(&mut self, next: PipelineState) {
        let expected = match self.state {
            None => Some(PipelineState::Partitioned),
            Some(current) => current.next(),
        };
        debug_assert_eq!(expected, Some(next), "pipeline states must advance in order");
        info!(state = ?next, "Pipeline state reached");
        self.state = Some(next);
    }

    /// Partitions `rows` in memory, then runs the pipeline over them.
    pub async fn run_rows(self, header: RawRow, rows: Vec<RawRow>) -> Result<PipelineOutcome> {
        let partitions = partition_by_year(header, rows, &self.config.date_field)?;
        self.run(Arc::new(MemoryStore::new(partitions))).await
    }

    /// Runs the pipeline over already partitioned data.
    pub async fn run(self, store: Arc<dyn PartitionStore>) -> Result<PipelineOutcome> {
        let span = info_span!("pipeline", run_id = %Uuid::new_v4());
        self.drive(store).instrument(span).await
    }

    async fn drive(mut self, store: Arc<dyn PartitionStore>) -> Result<PipelineOutcome> {
        self.config.trace_loaded();

        let years = store.years().await?;
        if years.is_empty() {
            info!("No partitions, nothing to aggregate");
            return Ok(PipelineOutcome::NoData);
        }
        self.enter(PipelineState::Partitioned);

        let loaded = load_partitions(
            store,
            self.converter.clone(),
            &self.config.date_field,
            years,
            &self.pool,
        )
        .await?;
        if loaded.is_empty() {
            info!("No well-formed records, nothing to aggregate");
            return Ok(PipelineOutcome::NoData);
        }
        let loaded = Arc::new(loaded);
        self.enter(PipelineState::Loaded);

        let year_stats =
            compute_year_stats(loaded.clone(), &self.config.selected_title, &self.pool).await?;
        self.enter(PipelineState::YearStatsReady);

        let area_stats = compute_area_stats(loaded.values().flatten());
        self.enter(PipelineState::AreaStatsReady);

        let bundle = StatisticsBundle::new(&year_stats, area_stats);
        self.enter(PipelineState::Done);
        info!(
            years = bundle.count_by_year.len(),
            records = bundle.count_by_year.values().sum::<usize>(),
            "Pipeline complete"
        );
        Ok(PipelineOutcome::Done(bundle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_advance_strictly_in_order() {
        let mut state = PipelineState::Partitioned;
        let mut seen = vec![state];
        while let Some(next) = state.next() {
            assert!(next > state);
            seen.push(next);
            state = next;
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(state, PipelineState::Done);
    }
}
