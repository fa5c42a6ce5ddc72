//! Groups raw rows into one partition per publication year.

use std::collections::BTreeMap;

use tracing::{debug, error, info};

use crate::error::{Result, StatsError};
use crate::vacancy::{year_prefix, RawRow};

/// Raw rows of a single year, together with the header they were read under.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawPartition {
    pub year: i32,
    pub header: RawRow,
    pub rows: Vec<RawRow>,
}

/// Disjoint per-year partitions of a row set. Row order inside a year follows input order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct YearPartitions {
    header: RawRow,
    by_year: BTreeMap<i32, Vec<RawRow>>,
}

impl YearPartitions {
    pub fn header(&self) -> &RawRow {
        &self.header
    }

    pub fn years(&self) -> Vec<i32> {
        self.by_year.keys().copied().collect()
    }

    pub fn rows(&self, year: i32) -> Option<&[RawRow]> {
        self.by_year.get(&year).map(Vec::as_slice)
    }

    pub fn partition(&self, year: i32) -> Option<RawPartition> {
        self.by_year.get(&year).map(|rows| RawPartition {
            year,
            header: self.header.clone(),
            rows: rows.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.by_year.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_year.is_empty()
    }

    pub fn total_rows(&self) -> usize {
        self.by_year.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, &[RawRow])> {
        self.by_year.iter().map(|(year, rows)| (*year, rows.as_slice()))
    }
}

/// Splits `rows` by the year in the first four characters of `date_field`.
///
/// A row whose date value is shorter than four characters or not numeric in that
/// prefix fails the whole call; rows with other defects are kept for the loader
/// to filter.
pub fn partition_by_year<I>(header: RawRow, rows: I, date_field: &str) -> Result<YearPartitions>
where
    I: IntoIterator<Item = RawRow>,
{
    let mut rows = rows.into_iter().peekable();
    if rows.peek().is_none() {
        debug!("No rows to partition");
        return Ok(YearPartitions {
            header,
            by_year: BTreeMap::new(),
        });
    }

    let date_index = header
        .iter()
        .position(|name| name == date_field)
        .ok_or_else(|| {
            error!(date_field, ?header, "Date column not found in header");
            StatsError::MissingColumn(date_field.to_string())
        })?;

    let mut by_year: BTreeMap<i32, Vec<RawRow>> = BTreeMap::new();
    for row in rows {
        let date = row.get(date_index).map(String::as_str).unwrap_or_default();
        let Some(year) = year_prefix(date) else {
            error!(date, "Row has no readable year prefix");
            return Err(StatsError::InvalidDate {
                value: date.to_string(),
            });
        };
        by_year.entry(year).or_default().push(row);
    }

    info!(
        partitions = by_year.len(),
        rows = by_year.values().map(Vec::len).sum::<usize>(),
        "Partitioned rows by year"
    );
    Ok(YearPartitions { header, by_year })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> RawRow {
        crate::vacancy::COLUMNS.iter().map(|s| s.to_string()).collect()
    }

    fn row(title: &str, date: &str) -> RawRow {
        vec![title, "1", "2", "RUR", "Moscow", date]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn groups_by_year_preserving_order() {
        let rows = vec![
            row("a", "2020-01-01"),
            row("b", "2021-03-01"),
            row("c", "2020-06-01"),
        ];
        let parts = partition_by_year(header(), rows, "published_at").unwrap();
        assert_eq!(parts.years(), vec![2020, 2021]);
        let titles: Vec<&str> = parts.rows(2020).unwrap().iter().map(|r| r[0].as_str()).collect();
        assert_eq!(titles, vec!["a", "c"]);
        assert_eq!(parts.total_rows(), 3);
    }

    #[test]
    fn short_or_non_numeric_date_is_fatal() {
        let err = partition_by_year(header(), vec![row("a", "20")], "published_at").unwrap_err();
        assert!(matches!(err, StatsError::InvalidDate { .. }));
        let err =
            partition_by_year(header(), vec![row("a", "year-01-01")], "published_at").unwrap_err();
        assert!(matches!(err, StatsError::InvalidDate { .. }));
    }

    #[test]
    fn unknown_date_column_is_reported() {
        let err = partition_by_year(header(), vec![row("a", "2020")], "created_at").unwrap_err();
        assert!(matches!(err, StatsError::MissingColumn(c) if c == "created_at"));
    }

    #[test]
    fn no_rows_yields_no_partitions() {
        let parts = partition_by_year(Vec::new(), Vec::new(), "published_at").unwrap();
        assert!(parts.is_empty());
    }
}
