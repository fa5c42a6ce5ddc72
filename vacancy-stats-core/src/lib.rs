#![doc = "vacancy-stats-core: partitioned, parallel salary statistics over job-posting records."]

//! This crate holds the whole statistics pipeline and its data model. It reads raw
//! rows, splits them by publication year, loads each year on a worker pool,
//! and aggregates per-year and per-region figures for a reporting layer.
//! Rendering of those figures is not part of this crate.
//!
//! # Usage
//! Build a [`StatsPipeline`] from a [`StatsConfig`] and a [`RubConverter`], then call
//! [`StatsPipeline::run_rows`] with in-memory rows or [`StatsPipeline::run`] with a
//! [`PartitionStore`].

pub mod area_stats;
pub mod clean;
pub mod config;
pub mod currency;
pub mod error;
pub mod loader;
pub mod partition;
pub mod pipeline;
pub mod pool;
pub mod store;
pub mod vacancy;
pub mod year_stats;

pub use config::StatsConfig;
pub use currency::{CurrencyTable, MonthlyRateTable, RubConverter};
pub use error::{Result, StatsError};
pub use pipeline::{PipelineOutcome, StatisticsBundle, StatsPipeline};
pub use store::{CsvDirStore, MemoryStore, PartitionStore};
