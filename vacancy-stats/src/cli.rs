///
/// This module implements the CLI interface for vacancy-stats: command parsing,
/// the async `run` entrypoint, and writing results for the reporting layer.
///
/// All statistics logic lives in the [`vacancy-stats-core`] crate.
/// This module is strictly CLI glue.
///
/// ## How To Use
/// - For command-line users: use the installed `vacancy-stats` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`vacancy-stats-core`]: ../../vacancy-stats-core/
use crate::load_config::{load_config, InputSource};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use vacancy_stats_core::config::DEFAULT_DATE_FIELD;
use vacancy_stats_core::partition::partition_by_year;
use vacancy_stats_core::store::read_csv_path;
use vacancy_stats_core::{CsvDirStore, PipelineOutcome, StatsPipeline};

/// CLI for vacancy-stats: salary statistics by year and region.
#[derive(Parser)]
#[clap(
    name = "vacancy-stats",
    version,
    about = "Year and region salary statistics over job-posting CSV exports"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute statistics as described by the given config file and print them as JSON
    Stats {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Split a CSV export into one `<year>.csv` file per publication year
    Split {
        /// Source CSV file
        #[clap(long)]
        input: PathBuf,
        /// Directory receiving the per-year files
        #[clap(long)]
        out_dir: PathBuf,
        /// Column holding the publication date
        #[clap(long, default_value = DEFAULT_DATE_FIELD)]
        date_field: String,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Stats { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "stats", input = ?config.input, "Starting statistics run");
            let converter = config.currency.converter()?;
            let pipeline = StatsPipeline::new(config.stats.clone(), converter);
            let outcome = match &config.input {
                InputSource::Csv(path) => {
                    let (header, rows) = read_csv_path(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    pipeline.run_rows(header, rows).await
                }
                InputSource::PartitionsDir(dir) => {
                    let store = CsvDirStore::open(dir)
                        .with_context(|| format!("Failed to open {}", dir.display()))?;
                    pipeline.run(Arc::new(store)).await
                }
            };
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(command = "stats", error = %e, "Statistics run failed");
                    return Err(anyhow::Error::new(e));
                }
            };
            if matches!(outcome, PipelineOutcome::NoData) {
                tracing::warn!(command = "stats", "No data to aggregate");
            }
            write_outcome(&outcome, config.output.as_ref())?;
            tracing::info!(command = "stats", "Statistics run complete");
            Ok(())
        }
        Commands::Split {
            input,
            out_dir,
            date_field,
        } => {
            tracing::info!(command = "split", input = %input.display(), "Splitting by year");
            let (header, rows) = read_csv_path(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let partitions = partition_by_year(header, rows, &date_field)?;
            CsvDirStore::write_partitions(&out_dir, &partitions)
                .with_context(|| format!("Failed to write partitions to {}", out_dir.display()))?;
            println!(
                "Wrote {} partitions ({} rows) to {}",
                partitions.len(),
                partitions.total_rows(),
                out_dir.display()
            );
            Ok(())
        }
    }
}

fn write_outcome(outcome: &PipelineOutcome, output: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(outcome)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(output = %path.display(), "Statistics written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
