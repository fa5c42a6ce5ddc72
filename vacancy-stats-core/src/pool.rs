//! Bounded worker pool running one task per year partition.
//!
//! At most `workers` tasks are in flight in a [`JoinSet`]; each owns a single
//! year key, so collecting results is a plain insert into a map with no shared
//! mutable state between tasks. The first task to fail (or panic) ends the
//! phase with an error, the tasks still running are aborted, and no partial
//! map is returned.

use std::collections::BTreeMap;
use std::future::Future;

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use crate::error::{Phase, Result, StatsError};

pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        if workers == 0 {
            warn!("Worker pool size 0 requested, using 1");
        }
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `task(year)` for every year and gathers the results by year.
    pub async fn run_per_year<T, F, Fut>(
        &self,
        phase: Phase,
        years: Vec<i32>,
        task: F,
    ) -> Result<BTreeMap<i32, T>>
    where
        T: Send + 'static,
        F: Fn(i32) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let total = years.len();
        let mut pending = years.into_iter();
        let mut tasks: JoinSet<(i32, Result<T>)> = JoinSet::new();
        let spawn = |tasks: &mut JoinSet<(i32, Result<T>)>, year: i32| {
            debug!(%phase, year, "Scheduling task");
            let fut = task(year);
            tasks.spawn(async move { (year, fut.await) });
        };
        for year in pending.by_ref().take(self.workers) {
            spawn(&mut tasks, year);
        }

        let mut by_year = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((year, Ok(value))) => {
                    debug!(%phase, year, "Task completed");
                    by_year.insert(year, value);
                    if let Some(next) = pending.next() {
                        spawn(&mut tasks, next);
                    }
                }
                Ok((year, Err(e))) => {
                    error!(%phase, year, error = %e, in_flight = tasks.len(), "Task failed, aborting phase");
                    tasks.abort_all();
                    return Err(StatsError::TaskFailed {
                        phase,
                        year,
                        source: Box::new(e),
                    });
                }
                Err(join_error) => {
                    error!(%phase, error = %join_error, "Task could not be joined, aborting phase");
                    tasks.abort_all();
                    return Err(StatsError::TaskJoin {
                        phase,
                        message: join_error.to_string(),
                    });
                }
            }
        }
        debug!(%phase, tasks = total, "All tasks joined");
        Ok(by_year)
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_WORKERS)
    }
}

/// Runs CPU-bound work off the async worker threads.
pub async fn run_blocking<T, F>(phase: Phase, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| StatsError::TaskJoin {
            phase,
            message: e.to_string(),
        })?
}
