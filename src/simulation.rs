//! The simulation context: game state, static definitions, market input and
//! both result caches, owned together and threaded through every call.

use std::time::Instant;

use serde::Serialize;

use crate::{
    cache::CacheStats,
    calculators::{
        carens_score, CarensScore, LivabilityCalculator, PerformanceCalculator, PerformanceInputs,
        PerformanceResult,
    },
    config::SimulationConfig,
    decay::DecayTables,
    definitions::DefinitionCatalog,
    error::SimError,
    invalidation::{InvalidationCoordinator, LifecycleEvent},
    market::MarketEfficiency,
    spatial::{LocationKey, ParcelGrid},
    world::{Building, BuildingId, GameState},
};

/// Cache health for operational logging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheReport {
    pub performance: CacheStats,
    pub livability: CacheStats,
    pub decay_tables: usize,
}

pub struct Simulation {
    config: SimulationConfig,
    state: GameState,
    catalog: DefinitionCatalog,
    market: MarketEfficiency,
    performance: PerformanceCalculator,
    livability: LivabilityCalculator,
    coordinator: InvalidationCoordinator,
}

impl Simulation {
    pub fn new(config: SimulationConfig, catalog: DefinitionCatalog) -> Self {
        let grid = ParcelGrid::new(config.grid_rows, config.grid_cols);
        let decay = DecayTables::new(config.decay_horizon_days, config.nominal_decay_percent);
        let coordinator = InvalidationCoordinator::new(catalog.max_effect_range());
        Self {
            state: GameState::new(grid),
            catalog,
            market: MarketEfficiency::default(),
            performance: PerformanceCalculator::new(decay),
            livability: LivabilityCalculator::new(),
            coordinator,
            config,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn catalog(&self) -> &DefinitionCatalog {
        &self.catalog
    }

    pub fn market(&self) -> &MarketEfficiency {
        &self.market
    }

    pub fn invalidation_radius(&self) -> u32 {
        self.coordinator.radius()
    }

    pub fn performance_calculator(&self) -> &PerformanceCalculator {
        &self.performance
    }

    pub fn livability_calculator(&self) -> &LivabilityCalculator {
        &self.livability
    }

    /// Performance of the building at `location`, served from cache when clean.
    pub fn performance(&mut self, location: LocationKey) -> Option<PerformanceResult> {
        self.timed("performance", location, |sim| {
            let inputs = PerformanceInputs {
                state: &sim.state,
                catalog: &sim.catalog,
                market: &sim.market,
            };
            sim.performance
                .performance(&inputs, &mut sim.livability, location)
        })
    }

    pub fn local_multiplier(&mut self, location: LocationKey) -> f64 {
        self.timed("livability", location, |sim| {
            sim.livability
                .local_multiplier(&sim.state, &sim.catalog, location)
        })
    }

    /// Per-category CARENS totals for display. Never cached.
    pub fn carens_breakdown(&self, location: LocationKey) -> Option<CarensScore> {
        carens_score(&self.state, &self.catalog, location)
    }

    pub fn set_market_efficiency(&mut self, market: MarketEfficiency) {
        if market != self.market {
            self.market = market;
            self.apply(LifecycleEvent::MarketChanged);
        }
    }

    pub fn start_construction(
        &mut self,
        location: LocationKey,
        definition_id: &str,
        owner: &str,
    ) -> Result<BuildingId, SimError> {
        if !self.state.grid().contains(location) {
            return Err(SimError::OutOfBounds(location));
        }
        if self.state.building(location).is_some() {
            return Err(SimError::Occupied(location));
        }
        let definition = self
            .catalog
            .get(definition_id)
            .ok_or_else(|| SimError::UnknownDefinition(definition_id.to_string()))?;
        let days = definition.economics.construction_days;
        let id = self.state.place(location, definition_id, owner, days);
        self.apply(LifecycleEvent::BuildStart(location));
        log::debug!("construction of '{definition_id}' started at {location} for {owner}");
        Ok(id)
    }

    pub fn complete_construction(&mut self, location: LocationKey) -> Result<(), SimError> {
        let building = self
            .state
            .building_mut(location)
            .ok_or(SimError::NoBuilding(location))?;
        if !building.under_construction {
            return Err(SimError::NotUnderConstruction(location));
        }
        building.under_construction = false;
        building.construction_days_remaining = 0;
        building.age_days = 0;
        self.apply(LifecycleEvent::ConstructionComplete(location));
        log::debug!("construction complete at {location}");
        Ok(())
    }

    /// Starts and immediately completes a building.
    pub fn place_completed(
        &mut self,
        location: LocationKey,
        definition_id: &str,
        owner: &str,
    ) -> Result<BuildingId, SimError> {
        let id = self.start_construction(location, definition_id, owner)?;
        self.complete_construction(location)?;
        Ok(id)
    }

    pub fn destroy(&mut self, location: LocationKey) -> Result<Building, SimError> {
        if self.state.building(location).is_none() {
            return Err(SimError::NoBuilding(location));
        }
        self.apply(LifecycleEvent::Destroy(location));
        let building = self
            .state
            .remove(location)
            .ok_or(SimError::NoBuilding(location))?;
        log::debug!("building {} destroyed at {location}", building.id.raw());
        Ok(building)
    }

    /// Restores condition by resetting the building's age.
    pub fn repair(&mut self, location: LocationKey) -> Result<(), SimError> {
        let building = self
            .state
            .building_mut(location)
            .ok_or(SimError::NoBuilding(location))?;
        if building.under_construction {
            return Err(SimError::UnderConstruction(location));
        }
        building.age_days = 0;
        self.apply(LifecycleEvent::Repair(location));
        Ok(())
    }

    /// Overrides a completed building's age, e.g. when restoring a scenario.
    pub fn set_age(&mut self, location: LocationKey, age_days: u32) -> Result<(), SimError> {
        let building = self
            .state
            .building_mut(location)
            .ok_or(SimError::NoBuilding(location))?;
        if building.under_construction {
            return Err(SimError::UnderConstruction(location));
        }
        building.age_days = age_days;
        // Only this parcel's own condition moved, same as a repair.
        self.apply(LifecycleEvent::Repair(location));
        Ok(())
    }

    pub fn cache_report(&self) -> CacheReport {
        CacheReport {
            performance: self.performance.stats(),
            livability: self.livability.stats(),
            decay_tables: self.performance.decay().table_count(),
        }
    }

    pub(crate) fn apply(&mut self, event: LifecycleEvent) {
        let grid = self.state.grid();
        self.coordinator
            .apply(event, grid, &mut self.performance, &mut self.livability);
    }

    pub(crate) fn clear_stale_flags(&mut self) {
        self.performance.cache_mut().clear_stale_flags();
        self.livability.cache_mut().clear_stale_flags();
    }

    pub(crate) fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Ages completed buildings by a day and advances construction. Returns
    /// the parcels whose construction finished.
    pub(crate) fn advance_buildings(&mut self) -> Vec<LocationKey> {
        let mut finished = Vec::new();
        for location in self.state.locations() {
            let Some(building) = self.state.building_mut(location) else {
                continue;
            };
            if !building.under_construction {
                building.age_days = building.age_days.saturating_add(1);
                continue;
            }
            building.construction_days_remaining =
                building.construction_days_remaining.saturating_sub(1);
            if building.construction_days_remaining == 0 {
                finished.push(location);
            }
        }
        for location in &finished {
            if let Err(err) = self.complete_construction(*location) {
                log::warn!("could not complete construction at {location}: {err}");
            }
        }
        finished
    }

    fn timed<T>(
        &mut self,
        label: &str,
        location: LocationKey,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        if !self.config.timing_enabled {
            return f(self);
        }
        let start = Instant::now();
        let out = f(self);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1_000.0;
        if elapsed_ms > self.config.slow_calculation_ms {
            log::warn!("slow {label} calculation at {location}: {elapsed_ms:.1} ms");
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::{BuildingDefinition, Category, Economics, LivabilityProfile};

    fn catalog() -> DefinitionCatalog {
        let mut catalog = DefinitionCatalog::new();
        catalog.insert(BuildingDefinition::new(
            "shop",
            Economics {
                construction_days: 2,
                max_revenue: 100.0,
                maintenance_cost: 10.0,
                decay_rate_percent: Some(1.0),
                ..Economics::default()
            },
            LivabilityProfile::default().with(Category::Culture, 40.0, 2.0),
        ));
        catalog
    }

    fn sim() -> Simulation {
        Simulation::new(SimulationConfig::default().with_grid(10, 10), catalog())
    }

    #[test]
    fn lifecycle_handlers_validate_input() {
        let mut sim = sim();
        let at = LocationKey::new(1, 1);
        assert_eq!(
            sim.start_construction(LocationKey::new(10, 0), "shop", "p1"),
            Err(SimError::OutOfBounds(LocationKey::new(10, 0)))
        );
        assert_eq!(
            sim.start_construction(at, "castle", "p1"),
            Err(SimError::UnknownDefinition("castle".into()))
        );
        sim.start_construction(at, "shop", "p1").unwrap();
        assert_eq!(
            sim.start_construction(at, "shop", "p2"),
            Err(SimError::Occupied(at))
        );
        assert_eq!(sim.repair(at), Err(SimError::UnderConstruction(at)));
        sim.complete_construction(at).unwrap();
        assert_eq!(
            sim.complete_construction(at),
            Err(SimError::NotUnderConstruction(at))
        );
        assert!(sim.destroy(at).is_ok());
        assert_eq!(sim.destroy(at).unwrap_err(), SimError::NoBuilding(at));
    }

    #[test]
    fn construction_advances_and_buildings_age() {
        let mut sim = sim();
        let old = LocationKey::new(0, 0);
        let new = LocationKey::new(5, 5);
        sim.place_completed(old, "shop", "p1").unwrap();
        sim.start_construction(new, "shop", "p1").unwrap();

        assert!(sim.advance_buildings().is_empty());
        assert_eq!(sim.advance_buildings(), vec![new]);
        assert_eq!(sim.state().building(old).unwrap().age_days, 2);
        let finished = sim.state().building(new).unwrap();
        assert!(!finished.under_construction);
        assert_eq!(finished.age_days, 0);
    }

    #[test]
    fn repair_resets_condition() {
        let mut sim = sim();
        let at = LocationKey::new(3, 3);
        sim.place_completed(at, "shop", "p1").unwrap();
        for _ in 0..20 {
            sim.advance_buildings();
        }
        let worn = sim.performance(at).unwrap();
        assert!(worn.condition < 1.0);

        sim.repair(at).unwrap();
        let fresh = sim.performance(at).unwrap();
        assert_eq!(fresh.condition, 1.0);
        assert_eq!(fresh.maintenance_multiplier, 1.0);
        assert!(fresh.net_income > worn.net_income);
    }

    #[test]
    fn market_change_invalidates_performance_only() {
        let mut sim = sim();
        let at = LocationKey::new(3, 3);
        sim.place_completed(at, "shop", "p1").unwrap();
        let before = sim.performance(at).unwrap();

        sim.set_market_efficiency(MarketEfficiency::uniform(0.5));
        let after = sim.performance(at).unwrap();
        assert!((after.revenue - before.revenue * 0.5).abs() < 1e-9);
        assert_eq!(sim.cache_report().livability.global_invalidations, 0);
    }
}
