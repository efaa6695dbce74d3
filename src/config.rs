use serde::Deserialize;

use crate::decay::{DEFAULT_HORIZON_DAYS, NOMINAL_DECAY_PERCENT};

fn default_grid_rows() -> u32 {
    50
}

fn default_grid_cols() -> u32 {
    50
}

fn default_decay_horizon_days() -> u32 {
    DEFAULT_HORIZON_DAYS
}

fn default_nominal_decay_percent() -> f64 {
    NOMINAL_DECAY_PERCENT
}

fn default_stats_interval_days() -> u64 {
    10
}

fn default_slow_calculation_ms() -> f64 {
    50.0
}

fn default_timing_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_grid_rows")]
    pub grid_rows: u32,
    #[serde(default = "default_grid_cols")]
    pub grid_cols: u32,
    #[serde(default = "default_decay_horizon_days")]
    pub decay_horizon_days: u32,
    #[serde(default = "default_nominal_decay_percent")]
    pub nominal_decay_percent: f64,
    /// Cadence, in simulated days, of cache-health log lines.
    #[serde(default = "default_stats_interval_days")]
    pub stats_interval_days: u64,
    /// Calculations slower than this are logged as warnings.
    #[serde(default = "default_slow_calculation_ms")]
    pub slow_calculation_ms: f64,
    #[serde(default = "default_timing_enabled")]
    pub timing_enabled: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_rows: default_grid_rows(),
            grid_cols: default_grid_cols(),
            decay_horizon_days: default_decay_horizon_days(),
            nominal_decay_percent: default_nominal_decay_percent(),
            stats_interval_days: default_stats_interval_days(),
            slow_calculation_ms: default_slow_calculation_ms(),
            timing_enabled: default_timing_enabled(),
        }
    }
}

impl SimulationConfig {
    pub fn with_grid(mut self, rows: u32, cols: u32) -> Self {
        self.grid_rows = rows;
        self.grid_cols = cols;
        self
    }
}
