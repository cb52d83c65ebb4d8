use std::time::Duration;

use engine::config::config_manager::Config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// How long to run before shutting down. 0 runs until killed.
    pub run_seconds: u64,
    pub frame_time_ms: u64,
    pub stats_interval_ms: u64,
    /// Observer speed along its circular path, in voxels per second
    pub observer_speed: f32,
    pub observer_path_radius: f32,
    pub observer_height: f32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            run_seconds: 30,
            frame_time_ms: 16,
            stats_interval_ms: 1000,
            observer_speed: 48.0,
            observer_path_radius: 256.0,
            observer_height: 24.0,
        }
    }
}

impl ClientConfig {
    pub fn run_duration(&self) -> Option<Duration> {
        (self.run_seconds > 0).then(|| Duration::from_secs(self.run_seconds))
    }

    pub fn frame_time(&self) -> Duration {
        Duration::from_millis(self.frame_time_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }
}

impl Config for ClientConfig {
    fn get_path() -> &'static str {
        "client.ron"
    }

    fn is_valid(&self) -> bool {
        self.frame_time_ms > 0
            && self.observer_speed.is_finite()
            && self.observer_path_radius.is_finite()
            && self.observer_path_radius > 0.0
    }
}
