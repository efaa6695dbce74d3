use std::path::PathBuf;

use anyhow::Result;

use crate::{
    daily::{DailyCycleDriver, DailyReport, DailyUpdate},
    simulation::Simulation,
    snapshot::SnapshotWriter,
};

const MAX_REPORT_HISTORY: usize = 100;

pub struct EngineSettings {
    pub scenario_name: String,
    pub snapshot_interval_days: u64,
    pub snapshot_dir: PathBuf,
    pub stats_interval_days: u64,
}

/// Drives a simulation day by day. Simulated-day boundaries are the only trigger.
pub struct Engine {
    driver: DailyCycleDriver,
    snapshot_writer: SnapshotWriter,
    settings: EngineSettings,
    reports: Vec<DailyReport>,
}

impl Engine {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            driver: DailyCycleDriver::new(settings.stats_interval_days),
            snapshot_writer: SnapshotWriter::new(
                &settings.snapshot_dir,
                settings.snapshot_interval_days,
            ),
            settings,
            reports: Vec::new(),
        }
    }

    pub fn run(&mut self, sim: &mut Simulation, days: u64) -> Result<()> {
        self.run_with_hook(sim, days, |_| {})
    }

    /// Runs `days` daily cycles, handing each update to `hook` for broadcast.
    pub fn run_with_hook<F>(&mut self, sim: &mut Simulation, days: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&DailyUpdate),
    {
        for _ in 0..days {
            let report = self.driver.run_day(sim);
            self.snapshot_writer
                .maybe_write(&report.update, &self.settings.scenario_name)?;
            hook(&report.update);
            self.reports.push(report);
            if self.reports.len() > MAX_REPORT_HISTORY {
                self.reports.remove(0);
            }
        }
        Ok(())
    }

    /// The most recent daily reports, oldest first.
    pub fn reports(&self) -> &[DailyReport] {
        &self.reports
    }

    pub fn last_report(&self) -> Option<&DailyReport> {
        self.reports.last()
    }

    /// Mean wall-clock cost of a daily cycle over the retained history.
    pub fn average_day_ms(&self) -> Option<f64> {
        if self.reports.is_empty() {
            return None;
        }
        let total: f64 = self.reports.iter().map(|r| r.elapsed_ms).sum();
        Some(total / self.reports.len() as f64)
    }
}
