use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;

use crate::{
    calculators::PerformanceResult,
    invalidation::LifecycleEvent,
    simulation::{CacheReport, Simulation},
    spatial::LocationKey,
    world::PlayerId,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OwnerSummary {
    pub owner: PlayerId,
    pub buildings: usize,
    pub revenue: f64,
    pub maintenance: f64,
    pub net_income: f64,
    pub civic_score: f64,
    pub wealth: f64,
}

/// Aggregate game-state update produced once per simulated day.
#[derive(Debug, Clone, Serialize)]
pub struct DailyUpdate {
    pub day: u64,
    pub completed: Vec<LocationKey>,
    pub results: Vec<PerformanceResult>,
    pub owners: Vec<OwnerSummary>,
    pub total_net_income: f64,
}

impl DailyUpdate {
    /// Owners ordered by wealth, richest first.
    pub fn leaderboard(&self) -> Vec<&OwnerSummary> {
        let mut owners: Vec<&OwnerSummary> = self.owners.iter().collect();
        owners.sort_by(|a, b| b.wealth.total_cmp(&a.wealth).then(a.owner.cmp(&b.owner)));
        owners
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub update: DailyUpdate,
    pub buildings_processed: usize,
    pub elapsed_ms: f64,
    /// Present on days that fall on the stats cadence.
    pub cache: Option<CacheReport>,
}

pub struct DailyCycleDriver {
    stats_interval_days: u64,
}

impl DailyCycleDriver {
    pub fn new(stats_interval_days: u64) -> Self {
        Self {
            stats_interval_days,
        }
    }

    pub fn run_day(&mut self, sim: &mut Simulation) -> DailyReport {
        let start = Instant::now();
        sim.state_mut().advance_day();
        let day = sim.state().day();
        let completed = sim.advance_buildings();

        // Aging moves every building's condition at once.
        sim.apply(LifecycleEvent::DayBoundary);

        let locations = sim.state().locations();
        let mut results = Vec::with_capacity(locations.len());
        for location in &locations {
            if let Some(result) = sim.performance(*location) {
                results.push(result);
            }
        }

        let mut owners: BTreeMap<PlayerId, OwnerSummary> = BTreeMap::new();
        for result in &results {
            let Some(building) = sim.state().building(result.location) else {
                continue;
            };
            let civic = sim
                .catalog()
                .get(&building.definition_id)
                .filter(|_| result.operational)
                .map(|d| d.civic_score)
                .unwrap_or(0.0);
            let summary = owners
                .entry(building.owner.clone())
                .or_insert_with(|| OwnerSummary {
                    owner: building.owner.clone(),
                    ..OwnerSummary::default()
                });
            summary.buildings += 1;
            summary.revenue += result.revenue;
            summary.maintenance += result.maintenance;
            summary.net_income += result.net_income;
            summary.civic_score += civic;
        }
        for summary in owners.values_mut() {
            sim.state_mut().credit(&summary.owner, summary.net_income);
            summary.wealth = sim
                .state()
                .player(&summary.owner)
                .map(|p| p.wealth)
                .unwrap_or(0.0);
        }
        sim.clear_stale_flags();

        let total_net_income = results.iter().map(|r| r.net_income).sum();
        let elapsed_ms = start.elapsed().as_secs_f64() * 1_000.0;
        let cache = if self.stats_interval_days > 0 && day % self.stats_interval_days == 0 {
            let report = sim.cache_report();
            log::info!(
                "day {day}: {} buildings in {elapsed_ms:.2} ms | performance hit rate {:.1}% ({} invalidations) | livability hit rate {:.1}% ({} invalidations) | {} decay tables",
                locations.len(),
                report.performance.hit_rate * 100.0,
                report.performance.invalidations + report.performance.global_invalidations,
                report.livability.hit_rate * 100.0,
                report.livability.invalidations + report.livability.global_invalidations,
                report.decay_tables,
            );
            Some(report)
        } else {
            log::debug!(
                "day {day}: {} buildings in {elapsed_ms:.2} ms",
                locations.len()
            );
            None
        };

        DailyReport {
            update: DailyUpdate {
                day,
                completed,
                results,
                owners: owners.into_values().collect(),
                total_net_income,
            },
            buildings_processed: locations.len(),
            elapsed_ms,
            cache,
        }
    }
}

impl Default for DailyCycleDriver {
    fn default() -> Self {
        Self::new(10)
    }
}
