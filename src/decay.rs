//! Day-indexed condition / maintenance tables, one per distinct aging rate.

use std::collections::HashMap;

use serde::Serialize;

use crate::definitions::BuildingDefinition;

pub const DEFAULT_HORIZON_DAYS: u32 = 500;
/// Applied when a definition carries no usable aging rate (percent).
pub const NOMINAL_DECAY_PERCENT: f64 = 0.05;
const MIN_CONDITION: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DecayFactors {
    pub condition: f64,
    pub maintenance_multiplier: f64,
}

pub struct DecayTables {
    horizon_days: u32,
    nominal_percent: f64,
    tables: HashMap<u64, Vec<DecayFactors>>,
}

impl DecayTables {
    pub fn new(horizon_days: u32, nominal_percent: f64) -> Self {
        Self {
            horizon_days,
            nominal_percent,
            tables: HashMap::new(),
        }
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    /// Number of distinct rates a table has been built for.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Fractional aging rate for a definition. Stored values are percentages.
    pub fn rate_for(&self, definition: &BuildingDefinition) -> f64 {
        let percent = definition
            .economics
            .decay_rate_percent
            .filter(|p| p.is_finite() && *p > 0.0)
            .unwrap_or(self.nominal_percent);
        percent / 100.0
    }

    pub fn factors(&mut self, definition: &BuildingDefinition, age_days: u32) -> DecayFactors {
        let rate = self.rate_for(definition);
        self.factors_for_rate(rate, age_days)
    }

    pub fn factors_for_rate(&mut self, rate: f64, age_days: u32) -> DecayFactors {
        let day = age_days.min(self.horizon_days) as usize;
        let horizon = self.horizon_days;
        let table = self
            .tables
            .entry(rate.to_bits())
            .or_insert_with(|| build_table(rate, horizon));
        table[day]
    }
}

impl Default for DecayTables {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZON_DAYS, NOMINAL_DECAY_PERCENT)
    }
}

fn build_table(rate: f64, horizon_days: u32) -> Vec<DecayFactors> {
    log::debug!("building decay table for rate {rate} ({horizon_days} days)");
    let mut table = Vec::with_capacity(horizon_days as usize + 1);
    let mut maintenance_multiplier = 1.0;
    for day in 0..=horizon_days {
        table.push(DecayFactors {
            condition: (1.0 - day as f64 * rate).max(MIN_CONDITION),
            maintenance_multiplier,
        });
        maintenance_multiplier *= 1.0 + rate;
    }
    table
}
