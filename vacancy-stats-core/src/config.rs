use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::pool::DEFAULT_WORKERS;

pub const DEFAULT_DATE_FIELD: &str = "published_at";

/// Run parameters of the statistics pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Title substring for the selected-vacancy statistics. Empty selects nothing.
    pub selected_title: String,
    /// Worker pool size for the load and year-statistics phases.
    pub workers: usize,
    /// Column whose first four characters give the partition year.
    pub date_field: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            selected_title: String::new(),
            workers: DEFAULT_WORKERS,
            date_field: DEFAULT_DATE_FIELD.to_string(),
        }
    }
}

impl StatsConfig {
    pub fn trace_loaded(&self) {
        info!(
            selected_title = %self.selected_title,
            workers = self.workers,
            date_field = %self.date_field,
            "Loaded StatsConfig"
        );
        debug!(?self, "StatsConfig loaded (full debug)");
    }
}
