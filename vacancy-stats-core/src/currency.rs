//! Conversion of salary amounts to roubles.
//!
//! Two sources of rates exist:
//! - [`CurrencyTable`]: a fixed code → rate mapping, the default for every run.
//! - [`MonthlyRateTable`]: per-month rates read from a CSV file (`date,USD,EUR,...`
//!   with `YYYY-MM` dates), used when a rate history is available.
//!
//! Both are immutable once built and are handed to the loader explicitly as an
//! `Arc<dyn RubConverter>`; nothing here is process-global.
//!
//! An unknown currency code is always a fatal [`StatsError::UnknownCurrency`].

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use tracing::{debug, info};

use crate::error::{Result, StatsError};
use crate::vacancy::YearMonth;

pub const RUB_CODE: &str = "RUR";

/// Default rates used when the configuration does not override them.
pub const DEFAULT_RATES: [(&str, f64); 10] = [
    ("AZN", 35.68),
    ("BYR", 23.91),
    ("EUR", 59.90),
    ("GEL", 21.74),
    ("KGS", 0.76),
    ("KZT", 0.13),
    (RUB_CODE, 1.0),
    ("UAH", 1.64),
    ("USD", 60.66),
    ("UZS", 0.0055),
];

/// Converts an amount in some currency, published in a given month, to roubles.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait RubConverter: Send + Sync {
    fn to_rub(&self, amount: f64, currency: &str, published: YearMonth) -> Result<f64>;
}

/// Static code → rate table.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyTable {
    rates: HashMap<String, f64>,
}

impl CurrencyTable {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }

    /// Default table with the given rates replacing or extending the defaults.
    pub fn with_overrides(overrides: &HashMap<String, f64>) -> Self {
        let mut table = Self::default();
        for (code, rate) in overrides {
            debug!(code = %code, rate, "Overriding currency rate");
            table.rates.insert(code.clone(), *rate);
        }
        table
    }

    pub fn rate(&self, code: &str) -> Result<f64> {
        self.rates
            .get(code)
            .copied()
            .ok_or_else(|| StatsError::UnknownCurrency {
                code: code.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl Default for CurrencyTable {
    fn default() -> Self {
        Self {
            rates: DEFAULT_RATES
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
        }
    }
}

impl RubConverter for CurrencyTable {
    fn to_rub(&self, amount: f64, currency: &str, _published: YearMonth) -> Result<f64> {
        Ok(amount * self.rate(currency)?)
    }
}

/// Per-month exchange rates.
#[derive(Debug, Clone, Default)]
pub struct MonthlyRateTable {
    codes: Vec<String>,
    rates: HashMap<YearMonth, HashMap<String, f64>>,
}

impl MonthlyRateTable {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading monthly exchange rates");
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Reads a `date,<CODE>,...` table. Empty cells mean "no rate that month".
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.headers()?.clone();
        if headers.get(0).map(|h| h.trim_start_matches('\u{feff}')) != Some("date") {
            return Err(StatsError::RateTable(
                "first column must be named \"date\"".to_string(),
            ));
        }
        let codes: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut rates = HashMap::new();
        for record in reader.records() {
            let record = record?;
            let date = record.get(0).unwrap_or_default();
            let month = YearMonth::parse(date)
                .ok_or_else(|| StatsError::RateTable(format!("bad date {date:?}")))?;
            let mut row = HashMap::new();
            for (code, cell) in codes.iter().zip(record.iter().skip(1)) {
                if cell.is_empty() {
                    continue;
                }
                let rate: f64 = cell.parse().map_err(|_| {
                    StatsError::RateTable(format!("bad {code} rate {cell:?} for {date}"))
                })?;
                row.insert(code.clone(), rate);
            }
            rates.insert(month, row);
        }
        info!(
            months = rates.len(),
            currencies = codes.len(),
            "Monthly exchange rates loaded"
        );
        Ok(Self { codes, rates })
    }

    pub fn months(&self) -> usize {
        self.rates.len()
    }
}

impl RubConverter for MonthlyRateTable {
    fn to_rub(&self, amount: f64, currency: &str, published: YearMonth) -> Result<f64> {
        if currency == RUB_CODE {
            return Ok(amount);
        }
        if !self.codes.iter().any(|c| c == currency) {
            return Err(StatsError::UnknownCurrency {
                code: currency.to_string(),
            });
        }
        self.rates
            .get(&published)
            .and_then(|row| row.get(currency))
            .map(|rate| amount * rate)
            .ok_or_else(|| StatsError::MissingRate {
                code: currency.to_string(),
                year: published.year,
                month: published.month,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAY_2020: YearMonth = YearMonth {
        year: 2020,
        month: 5,
    };

    #[test]
    fn default_table_converts_with_static_rates() {
        let table = CurrencyTable::default();
        assert_eq!(table.len(), 10);
        assert_eq!(table.to_rub(150.0, "RUR", MAY_2020).unwrap(), 150.0);
        assert_eq!(table.to_rub(4000.0, "USD", MAY_2020).unwrap(), 4000.0 * 60.66);
    }

    #[test]
    fn unknown_code_is_a_lookup_failure() {
        let err = CurrencyTable::default()
            .to_rub(1.0, "XYZ", MAY_2020)
            .unwrap_err();
        assert!(matches!(err, StatsError::UnknownCurrency { code } if code == "XYZ"));
    }

    #[test]
    fn overrides_replace_defaults() {
        let overrides = HashMap::from([("USD".to_string(), 75.0), ("CNY".to_string(), 11.0)]);
        let table = CurrencyTable::with_overrides(&overrides);
        assert_eq!(table.rate("USD").unwrap(), 75.0);
        assert_eq!(table.rate("CNY").unwrap(), 11.0);
        assert_eq!(table.rate("EUR").unwrap(), 59.90);
    }

    #[test]
    fn monthly_table_uses_the_publication_month() {
        let csv = "date,USD,EUR\n2020-04,70.0,80.0\n2020-05,72.0,\n";
        let table = MonthlyRateTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.months(), 2);
        assert_eq!(table.to_rub(10.0, "USD", MAY_2020).unwrap(), 720.0);
        assert_eq!(table.to_rub(10.0, "RUR", MAY_2020).unwrap(), 10.0);
        assert!(matches!(
            table.to_rub(10.0, "EUR", MAY_2020),
            Err(StatsError::MissingRate { month: 5, .. })
        ));
        assert!(matches!(
            table.to_rub(10.0, "KZT", MAY_2020),
            Err(StatsError::UnknownCurrency { .. })
        ));
    }

    #[test]
    fn monthly_table_rejects_bad_header() {
        let err = MonthlyRateTable::from_reader("month,USD\n2020-01,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, StatsError::RateTable(_)));
    }
}
