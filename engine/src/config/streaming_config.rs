use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    config::config_manager::Config,
    limits::{
        DEFAULT_LAP_UPLOAD_BUDGET, DEFAULT_MIN_SWAP_INTERVAL_MS, DEFAULT_RADIUS,
        DEFAULT_REPORT_CAPACITY, DEFAULT_SYNC_REPETITIONS,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamingConfig {
    /// Meshes with squared distance below `radius²` from the observer's cell stay resident
    pub radius: u32,
    pub sync_repetitions: u32,
    pub min_swap_interval_ms: u64,
    /// Uploads per lap before the loader ends the lap at the next sync point. 0 = unlimited.
    pub lap_upload_budget: usize,
    pub report_capacity: usize,
    pub cache_dir: PathBuf,
    pub seed: u32,
}

impl StreamingConfig {
    pub fn min_swap_interval(&self) -> Duration {
        Duration::from_millis(self.min_swap_interval_ms)
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS,
            sync_repetitions: DEFAULT_SYNC_REPETITIONS,
            min_swap_interval_ms: DEFAULT_MIN_SWAP_INTERVAL_MS,
            lap_upload_budget: DEFAULT_LAP_UPLOAD_BUDGET,
            report_capacity: DEFAULT_REPORT_CAPACITY,
            cache_dir: PathBuf::from("cache"),
            seed: 0,
        }
    }
}

impl Config for StreamingConfig {
    fn get_path() -> &'static str {
        "streaming.ron"
    }

    fn is_valid(&self) -> bool {
        self.radius > 0 && self.sync_repetitions > 0 && self.report_capacity > 0
    }
}
