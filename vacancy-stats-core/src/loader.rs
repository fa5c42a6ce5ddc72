//! Parallel record loader: turns every stored year partition into typed vacancies.
//!
//! One pool task per year reads its partition from the store, drops rows that
//! are not well-formed (wrong column count, any empty field) and builds each
//! remaining [`Vacancy`] with its rouble average computed through the supplied
//! converter. A year whose rows were all dropped is left out of the result so
//! every year that reaches aggregation has at least one record.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::currency::RubConverter;
use crate::error::{Phase, Result};
use crate::partition::RawPartition;
use crate::pool::{run_blocking, WorkerPool};
use crate::store::PartitionStore;
use crate::vacancy::{ColumnLayout, Vacancy};

pub type VacanciesByYear = BTreeMap<i32, Vec<Vacancy>>;

/// Parses one partition. Malformed rows are skipped; any other row error is returned.
///
/// Field positions come from the partition's header, with the timestamp taken
/// from `date_field`.
pub fn parse_partition(
    partition: &RawPartition,
    date_field: &str,
    converter: &dyn RubConverter,
) -> Result<Vec<Vacancy>> {
    if partition.rows.is_empty() {
        return Ok(Vec::new());
    }
    let layout = ColumnLayout::from_header(&partition.header, date_field)?;
    let mut vacancies = Vec::with_capacity(partition.rows.len());
    for row in &partition.rows {
        if let Some(vacancy) = Vacancy::from_row(row, &layout, converter)? {
            vacancies.push(vacancy);
        }
    }
    let dropped = partition.rows.len() - vacancies.len();
    if dropped > 0 {
        debug!(year = partition.year, dropped, "Dropped malformed rows");
    }
    Ok(vacancies)
}

/// Loads the given years from `store` on the pool.
pub async fn load_partitions(
    store: Arc<dyn PartitionStore>,
    converter: Arc<dyn RubConverter>,
    date_field: &str,
    years: Vec<i32>,
    pool: &WorkerPool,
) -> Result<VacanciesByYear> {
    info!(years = years.len(), workers = pool.workers(), "Loading partitions");
    let date_field: Arc<str> = Arc::from(date_field);
    let loaded = pool
        .run_per_year(Phase::Load, years, |year| {
            let store = store.clone();
            let converter = converter.clone();
            let date_field = date_field.clone();
            async move {
                let partition = store.read_partition(year).await?;
                debug!(year, rows = partition.rows.len(), "Partition read");
                run_blocking(Phase::Load, move || {
                    parse_partition(&partition, &date_field, converter.as_ref())
                })
                .await
            }
        })
        .await?;

    let by_year: VacanciesByYear = loaded
        .into_iter()
        .filter(|(year, vacancies)| {
            if vacancies.is_empty() {
                debug!(year, "No well-formed rows, year skipped");
            }
            !vacancies.is_empty()
        })
        .collect();

    info!(
        years = by_year.len(),
        records = by_year.values().map(Vec::len).sum::<usize>(),
        "Partitions loaded"
    );
    Ok(by_year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::CurrencyTable;
    use crate::vacancy::COLUMNS;

    fn partition(rows: Vec<Vec<&str>>) -> RawPartition {
        RawPartition {
            year: 2020,
            header: COLUMNS.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(String::from).collect())
                .collect(),
        }
    }

    #[test]
    fn keeps_input_order_and_skips_malformed() {
        let p = partition(vec![
            vec!["A", "10", "20", "RUR", "Omsk", "2020-01-01"],
            vec!["B", "10", "", "RUR", "Omsk", "2020-01-01"],
            vec!["C", "30", "40", "RUR", "Omsk", "2020-02-01", "extra"],
            vec!["D", "50", "60", "RUR", "Omsk", "2020-03-01"],
        ]);
        let vacancies = parse_partition(&p, "published_at", &CurrencyTable::default()).unwrap();
        let titles: Vec<&str> = vacancies.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "D"]);
    }
}
