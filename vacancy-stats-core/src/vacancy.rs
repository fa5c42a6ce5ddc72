//! Typed job-posting record and its construction from a raw CSV row.

use serde::Serialize;

use crate::clean::clean_value;
use crate::currency::RubConverter;
use crate::error::{Result, StatsError};

/// A raw CSV row, one string per column.
pub type RawRow = Vec<String>;

/// Column layout of a well-formed row.
pub const COLUMNS: [&str; 6] = [
    "name",
    "salary_from",
    "salary_to",
    "salary_currency",
    "area_name",
    "published_at",
];

/// Where each record field sits in a partition's header.
///
/// The publication timestamp is read from the configured date column, so the
/// year a row was partitioned under is always the year of its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    width: usize,
    title: usize,
    salary_from: usize,
    salary_to: usize,
    currency: usize,
    area: usize,
    published_at: usize,
}

impl ColumnLayout {
    pub fn from_header(header: &[String], date_field: &str) -> Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|column| column == name)
                .ok_or_else(|| StatsError::MissingColumn(name.to_string()))
        };
        Ok(Self {
            width: header.len(),
            title: find(COLUMNS[0])?,
            salary_from: find(COLUMNS[1])?,
            salary_to: find(COLUMNS[2])?,
            currency: find(COLUMNS[3])?,
            area: find(COLUMNS[4])?,
            published_at: find(date_field)?,
        })
    }

    /// Number of fields a well-formed row has.
    pub fn width(&self) -> usize {
        self.width
    }
}

/// The [`COLUMNS`] order.
impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            width: COLUMNS.len(),
            title: 0,
            salary_from: 1,
            salary_to: 2,
            currency: 3,
            area: 4,
            published_at: 5,
        }
    }
}

/// Year of a date string: its first four characters, which must all be digits.
pub fn year_prefix(date: &str) -> Option<i32> {
    let prefix = date.get(..4)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

/// Publication month, the resolution currency conversion needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Parses the `YYYY-MM` prefix of a date or timestamp.
    pub fn parse(value: &str) -> Option<Self> {
        let year = year_prefix(value)?;
        if value.as_bytes().get(4) != Some(&b'-') {
            return None;
        }
        let month: u32 = value.get(5..7)?.parse().ok()?;
        (1..=12).contains(&month).then_some(Self { year, month })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Salary {
    pub from: i64,
    pub to: i64,
    pub currency: String,
}

impl Salary {
    pub fn average(&self) -> f64 {
        (self.from as f64 + self.to as f64) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vacancy {
    pub title: String,
    pub salary: Salary,
    pub area: String,
    pub published: YearMonth,
    pub published_at: String,
    rub_average: f64,
}

impl Vacancy {
    pub fn new(
        title: String,
        salary: Salary,
        area: String,
        published_at: String,
        converter: &dyn RubConverter,
    ) -> Result<Self> {
        let published =
            YearMonth::parse(&published_at).ok_or_else(|| StatsError::InvalidPublishedAt {
                value: published_at.clone(),
            })?;
        let rub_average = converter.to_rub(salary.average(), &salary.currency, published)?;
        Ok(Self {
            title,
            salary,
            area,
            published,
            published_at,
            rub_average,
        })
    }

    /// Builds a vacancy from a raw row.
    ///
    /// Returns `Ok(None)` when the row has the wrong number of columns or any
    /// empty field; such rows are silently discarded. A well-shaped row with an
    /// unreadable salary, timestamp or currency is an error.
    pub fn from_row(
        row: &[String],
        layout: &ColumnLayout,
        converter: &dyn RubConverter,
    ) -> Result<Option<Self>> {
        if row.len() != layout.width || row.iter().any(|field| field.is_empty()) {
            return Ok(None);
        }
        let field = |i: usize| clean_value(&row[i]);
        let salary = Salary {
            from: parse_bound(&field(layout.salary_from))?,
            to: parse_bound(&field(layout.salary_to))?,
            currency: field(layout.currency),
        };
        Self::new(
            field(layout.title),
            salary,
            field(layout.area),
            field(layout.published_at),
            converter,
        )
        .map(Some)
    }

    /// Mean of the salary range in roubles, computed once at construction.
    pub fn rub_average(&self) -> f64 {
        self.rub_average
    }

    pub fn year(&self) -> i32 {
        self.published.year
    }
}

/// Salary bounds may be written as floats ("20000.0"); the fraction is dropped.
fn parse_bound(value: &str) -> Result<i64> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v.trunc() as i64),
        _ => Err(StatsError::InvalidSalary {
            value: value.to_string(),
        }),
    }
}
