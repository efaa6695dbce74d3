use serde::Serialize;

use crate::{
    cache::{CacheStats, ResultCache},
    calculators::livability::{LivabilityCalculator, NEUTRAL_MULTIPLIER},
    decay::DecayTables,
    definitions::DefinitionCatalog,
    market::MarketEfficiency,
    spatial::LocationKey,
    world::{BuildingId, GameState},
};

/// Operating result for one parcel, ready for broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceResult {
    pub building_id: BuildingId,
    pub location: LocationKey,
    pub operational: bool,
    pub revenue: f64,
    pub maintenance: f64,
    pub net_income: f64,
    pub condition: f64,
    pub maintenance_multiplier: f64,
    pub market_efficiency: f64,
    pub livability_multiplier: f64,
    pub age_days: u32,
    pub day: u64,
}

/// Everything a performance calculation reads but does not own.
pub struct PerformanceInputs<'a> {
    pub state: &'a GameState,
    pub catalog: &'a DefinitionCatalog,
    pub market: &'a MarketEfficiency,
}

pub struct PerformanceCalculator {
    cache: ResultCache<PerformanceResult>,
    decay: DecayTables,
}

impl PerformanceCalculator {
    pub fn new(decay: DecayTables) -> Self {
        Self {
            cache: ResultCache::new("performance"),
            decay,
        }
    }

    pub fn cache(&self) -> &ResultCache<PerformanceResult> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ResultCache<PerformanceResult> {
        &mut self.cache
    }

    pub fn decay(&self) -> &DecayTables {
        &self.decay
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// `None` for an empty parcel or a building whose definition is unknown.
    pub fn performance(
        &mut self,
        inputs: &PerformanceInputs<'_>,
        livability: &mut LivabilityCalculator,
        location: LocationKey,
    ) -> Option<PerformanceResult> {
        if let Some(entry) = self.cache.get(location) {
            return Some(entry.payload);
        }

        let building = inputs.state.building(location)?;
        let definition = inputs.catalog.get(&building.definition_id)?;
        let day = inputs.state.day();

        let result = if building.under_construction {
            PerformanceResult {
                building_id: building.id,
                location,
                operational: false,
                revenue: 0.0,
                maintenance: 0.0,
                net_income: 0.0,
                condition: 1.0,
                maintenance_multiplier: 1.0,
                market_efficiency: inputs.market.revenue_factor(),
                livability_multiplier: NEUTRAL_MULTIPLIER,
                age_days: 0,
                day,
            }
        } else {
            let factors = self.decay.factors(definition, building.age_days);
            let efficiency = inputs.market.revenue_factor();
            let livability_multiplier =
                livability.local_multiplier(inputs.state, inputs.catalog, location);

            let revenue = definition.economics.max_revenue
                * factors.condition
                * efficiency
                * livability_multiplier;
            let maintenance =
                definition.economics.maintenance_cost * factors.maintenance_multiplier;

            PerformanceResult {
                building_id: building.id,
                location,
                operational: true,
                revenue,
                maintenance,
                net_income: revenue - maintenance,
                condition: factors.condition,
                maintenance_multiplier: factors.maintenance_multiplier,
                market_efficiency: efficiency,
                livability_multiplier,
                age_days: building.age_days,
                day,
            }
        };

        self.cache.set(location, result);
        Some(result)
    }
}
