/// `load_config` module: Loads a static YAML config and applies environment overrides,
/// producing everything the `stats` command needs.
///
/// This module is the only place where untrusted YAML is parsed and mapped to the
/// strongly-typed core configuration.
///
/// # Responsibilities
/// - Parse the YAML file into type-safe structs (`input`, `stats`, `currency`, `output`)
/// - Resolve the input section to exactly one [`InputSource`]
/// - Apply `VACANCY_STATS_WORKERS` / `VACANCY_STATS_SELECTED_TITLE` overrides
/// - Build the rouble converter the pipeline is handed explicitly
///
/// # Errors
/// All errors use `anyhow::Error` with context and are surfaced at the CLI boundary.
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use vacancy_stats_core::{CurrencyTable, MonthlyRateTable, RubConverter, StatsConfig};

pub const WORKERS_ENV: &str = "VACANCY_STATS_WORKERS";
pub const SELECTED_TITLE_ENV: &str = "VACANCY_STATS_SELECTED_TITLE";

#[derive(Debug, Clone, PartialEq)]
pub enum InputSource {
    /// A single CSV file, partitioned in memory.
    Csv(PathBuf),
    /// A directory of `<year>.csv` files written by `split`.
    PartitionsDir(PathBuf),
}

#[derive(Debug, Deserialize)]
pub struct InputSection {
    pub csv: Option<PathBuf>,
    pub partitions_dir: Option<PathBuf>,
}

impl InputSection {
    fn resolve(self) -> Result<InputSource> {
        match (self.csv, self.partitions_dir) {
            (Some(csv), None) => Ok(InputSource::Csv(csv)),
            (None, Some(dir)) => Ok(InputSource::PartitionsDir(dir)),
            (Some(_), Some(_)) => bail!("input: set either `csv` or `partitions_dir`, not both"),
            (None, None) => bail!("input: one of `csv` or `partitions_dir` is required"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CurrencySection {
    #[serde(default)]
    pub rates: HashMap<String, f64>,
    pub monthly_rates_csv: Option<PathBuf>,
}

impl CurrencySection {
    pub fn converter(&self) -> Result<Arc<dyn RubConverter>> {
        match &self.monthly_rates_csv {
            Some(path) => {
                if !self.rates.is_empty() {
                    warn!("currency.rates is ignored when monthly_rates_csv is set");
                }
                let table = MonthlyRateTable::from_path(path)
                    .with_context(|| format!("Failed to load monthly rates {}", path.display()))?;
                Ok(Arc::new(table))
            }
            None => Ok(Arc::new(CurrencyTable::with_overrides(&self.rates))),
        }
    }
}

#[derive(Debug)]
pub struct CliConfig {
    pub input: InputSource,
    pub stats: StatsConfig,
    pub currency: CurrencySection,
    pub output: Option<PathBuf>,
}

/// Loads the YAML config at `path` and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    #[derive(Debug, Deserialize)]
    struct RawConfig {
        input: InputSection,
        #[serde(default)]
        stats: StatsConfig,
        #[serde(default)]
        currency: CurrencySection,
        output: Option<PathBuf>,
    }

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let mut stats = raw.stats;
    apply_env_overrides(&mut stats)?;

    Ok(CliConfig {
        input: raw.input.resolve()?,
        stats,
        currency: raw.currency,
        output: raw.output,
    })
}

fn apply_env_overrides(stats: &mut StatsConfig) -> Result<()> {
    if let Ok(workers) = std::env::var(WORKERS_ENV) {
        stats.workers = workers
            .trim()
            .parse()
            .with_context(|| format!("{WORKERS_ENV} must be a positive integer, got {workers:?}"))?;
        info!(workers = stats.workers, "Worker count overridden from environment");
    }
    if let Ok(title) = std::env::var(SELECTED_TITLE_ENV) {
        info!(selected_title = %title, "Selected title overridden from environment");
        stats.selected_title = title;
    }
    Ok(())
}
