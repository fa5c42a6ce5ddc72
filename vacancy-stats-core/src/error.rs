//! Error type shared by every stage of the statistics pipeline.
//!
//! Malformed rows (wrong column count, empty field) are *not* errors: the loader
//! drops them. Everything in [`StatsError`] is fatal for the run.

use thiserror::Error;

/// Pipeline phase a pooled task belonged to, used in task failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discover,
    Load,
    YearStats,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Discover => write!(f, "discover"),
            Phase::Load => write!(f, "load"),
            Phase::YearStats => write!(f, "year-stats"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("date field {value:?} does not start with a 4-digit year")]
    InvalidDate { value: String },

    #[error("column {0:?} not present in header")]
    MissingColumn(String),

    #[error("currency {code:?} not present in the conversion table")]
    UnknownCurrency { code: String },

    #[error("no {code} rate for {year}-{month:02}")]
    MissingRate { code: String, year: i32, month: u32 },

    #[error("exchange rate table: {0}")]
    RateTable(String),

    #[error("salary bound {value:?} is not a number")]
    InvalidSalary { value: String },

    #[error("published_at {value:?} has no readable year/month")]
    InvalidPublishedAt { value: String },

    #[error("no partition stored for year {0}")]
    PartitionNotFound(i32),

    #[error("{phase} task for year {year} failed: {source}")]
    TaskFailed {
        phase: Phase,
        year: i32,
        #[source]
        source: Box<StatsError>,
    },

    #[error("{phase} task could not be joined: {message}")]
    TaskJoin { phase: Phase, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, StatsError>;
