use serde::Serialize;

use crate::{
    cache::{CacheStats, ResultCache},
    definitions::{Category, DefinitionCatalog},
    spatial::LocationKey,
    world::GameState,
};

pub const NEUTRAL_MULTIPLIER: f64 = 1.0;
pub const MIN_MULTIPLIER: f64 = 0.6;
pub const MAX_MULTIPLIER: f64 = 1.4;
/// Multiplier swing per 100 points of net CARENS score.
const SCORE_SENSITIVITY: f64 = 0.4;

/// Accumulated CARENS totals at one parcel.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CarensScore {
    totals: [f64; 6],
}

impl CarensScore {
    pub fn get(&self, category: Category) -> f64 {
        self.totals[category.index()]
    }

    pub fn net(&self) -> f64 {
        self.totals.iter().sum()
    }

    pub fn multiplier(&self) -> f64 {
        multiplier_from_score(self.net())
    }
}

pub fn multiplier_from_score(net_score: f64) -> f64 {
    (NEUTRAL_MULTIPLIER + (net_score / 100.0) * SCORE_SENSITIVITY)
        .clamp(MIN_MULTIPLIER, MAX_MULTIPLIER)
}

/// Linear falloff: full effect at distance 0, nothing at or past `range`.
pub fn attenuate(effect: f64, distance: u32, range: f64) -> f64 {
    if effect == 0.0 || range <= 0.0 || distance as f64 > range {
        return 0.0;
    }
    effect * (1.0 - distance as f64 / range).max(0.0)
}

pub struct LivabilityCalculator {
    cache: ResultCache<f64>,
}

impl LivabilityCalculator {
    pub fn new() -> Self {
        Self {
            cache: ResultCache::new("livability"),
        }
    }

    pub fn cache(&self) -> &ResultCache<f64> {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ResultCache<f64> {
        &mut self.cache
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Livability multiplier in [0.6, 1.4] for the building at `location`.
    /// Empty parcels read as neutral and are not cached.
    pub fn local_multiplier(
        &mut self,
        state: &GameState,
        catalog: &DefinitionCatalog,
        location: LocationKey,
    ) -> f64 {
        if let Some(entry) = self.cache.get(location) {
            return entry.payload;
        }
        let Some(score) = carens_score(state, catalog, location) else {
            return NEUTRAL_MULTIPLIER;
        };
        let multiplier = score.multiplier();
        self.cache.set(location, multiplier);
        multiplier
    }
}

impl Default for LivabilityCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Uncached CARENS breakdown. `None` when the parcel has no building or the
/// building's definition is unknown.
pub fn carens_score(
    state: &GameState,
    catalog: &DefinitionCatalog,
    location: LocationKey,
) -> Option<CarensScore> {
    let target = state.building(location)?;
    catalog.get(&target.definition_id)?;

    let mut score = CarensScore::default();
    // Cost scales with the number of buildings, not the map area.
    for neighbor in state.buildings() {
        if neighbor.location == location || neighbor.under_construction {
            continue;
        }
        let Some(definition) = catalog.get(&neighbor.definition_id) else {
            continue;
        };
        let distance = neighbor.location.chebyshev(location);
        for (slot, effect) in score.totals.iter_mut().zip(definition.livability.effects()) {
            *slot += attenuate(effect.effect, distance, effect.range);
        }
    }
    Some(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attenuation_is_linear_to_range_boundary() {
        assert_eq!(attenuate(40.0, 0, 2.0), 40.0);
        assert_eq!(attenuate(40.0, 1, 2.0), 20.0);
        assert_eq!(attenuate(40.0, 2, 2.0), 0.0);
        assert_eq!(attenuate(40.0, 3, 2.0), 0.0);
        assert_eq!(attenuate(-30.0, 1, 3.0), -20.0);
        assert_eq!(attenuate(0.0, 0, 2.0), 0.0);
        assert_eq!(attenuate(10.0, 0, 0.0), 0.0);
    }

    #[test]
    fn multiplier_is_clamped() {
        assert_eq!(multiplier_from_score(0.0), 1.0);
        assert_eq!(multiplier_from_score(1000.0), MAX_MULTIPLIER);
        assert_eq!(multiplier_from_score(-1000.0), MIN_MULTIPLIER);
        assert!((multiplier_from_score(20.0) - 1.08).abs() < 1e-12);
        assert!((multiplier_from_score(-50.0) - 0.8).abs() < 1e-12);
    }
}
