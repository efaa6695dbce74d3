//! Maps lifecycle events onto cache invalidation at the right granularity.

use crate::{
    calculators::{LivabilityCalculator, PerformanceCalculator},
    spatial::{LocationKey, ParcelGrid},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    BuildStart(LocationKey),
    ConstructionComplete(LocationKey),
    /// Must be applied before the building leaves the game state.
    Destroy(LocationKey),
    Repair(LocationKey),
    MarketChanged,
    DayBoundary,
}

pub struct InvalidationCoordinator {
    radius: u32,
}

impl InvalidationCoordinator {
    /// `radius` is the widest attenuation range any definition can project.
    pub fn new(radius: u32) -> Self {
        Self {
            radius: radius.max(1),
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Parcels whose cached results depend on what stands at `location`.
    pub fn affected(&self, grid: ParcelGrid, location: LocationKey) -> Vec<LocationKey> {
        grid.within(location, self.radius)
    }

    pub fn apply(
        &self,
        event: LifecycleEvent,
        grid: ParcelGrid,
        performance: &mut PerformanceCalculator,
        livability: &mut LivabilityCalculator,
    ) {
        match event {
            // Nothing built yet contributes income or livability.
            LifecycleEvent::BuildStart(_) => {}
            LifecycleEvent::ConstructionComplete(location) => self.invalidate_area(
                grid,
                location,
                "construction complete",
                performance,
                livability,
            ),
            LifecycleEvent::Destroy(location) => {
                self.invalidate_area(grid, location, "destroyed", performance, livability)
            }
            LifecycleEvent::Repair(location) => {
                performance.cache_mut().mark_stale(location, "repaired");
                livability.cache_mut().mark_stale(location, "repaired");
            }
            LifecycleEvent::MarketChanged => {
                performance.cache_mut().mark_all_stale("market efficiency changed");
            }
            LifecycleEvent::DayBoundary => {
                performance.cache_mut().mark_all_stale("day boundary");
                livability.cache_mut().mark_all_stale("day boundary");
            }
        }
    }

    fn invalidate_area(
        &self,
        grid: ParcelGrid,
        location: LocationKey,
        reason: &str,
        performance: &mut PerformanceCalculator,
        livability: &mut LivabilityCalculator,
    ) {
        let affected = self.affected(grid, location);
        log::debug!(
            "{reason} at {location}: invalidating {} parcels within {}",
            affected.len(),
            self.radius
        );
        for key in affected {
            performance.cache_mut().mark_stale(key, reason);
            livability.cache_mut().mark_stale(key, reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decay::DecayTables;

    fn calculators() -> (PerformanceCalculator, LivabilityCalculator) {
        (
            PerformanceCalculator::new(DecayTables::default()),
            LivabilityCalculator::new(),
        )
    }

    #[test]
    fn completion_reaches_full_attenuation_radius() {
        let grid = ParcelGrid::new(20, 20);
        let coordinator = InvalidationCoordinator::new(3);
        let (mut perf, mut liv) = calculators();
        let center = LocationKey::new(10, 10);
        coordinator.apply(
            LifecycleEvent::ConstructionComplete(center),
            grid,
            &mut perf,
            &mut liv,
        );

        assert!(liv.cache().is_stale(center));
        assert!(liv.cache().is_stale(LocationKey::new(13, 7)));
        assert!(perf.cache().is_stale(LocationKey::new(8, 12)));
        assert!(!liv.cache().is_stale(LocationKey::new(14, 10)));
        assert!(!perf.cache().is_globally_stale());
    }

    #[test]
    fn build_start_invalidates_nothing() {
        let grid = ParcelGrid::new(5, 5);
        let coordinator = InvalidationCoordinator::new(2);
        let (mut perf, mut liv) = calculators();
        let at = LocationKey::new(2, 2);
        coordinator.apply(LifecycleEvent::BuildStart(at), grid, &mut perf, &mut liv);
        assert!(!perf.cache().is_stale(at));
        assert!(!liv.cache().is_stale(at));
        assert_eq!(perf.stats().invalidations, 0);
    }

    #[test]
    fn repair_touches_only_its_parcel() {
        let grid = ParcelGrid::new(5, 5);
        let coordinator = InvalidationCoordinator::new(2);
        let (mut perf, mut liv) = calculators();
        let at = LocationKey::new(2, 2);
        coordinator.apply(LifecycleEvent::Repair(at), grid, &mut perf, &mut liv);
        assert!(perf.cache().is_stale(at));
        assert!(!perf.cache().is_stale(LocationKey::new(2, 3)));
        assert!(!liv.cache().is_stale(LocationKey::new(1, 1)));
    }

    #[test]
    fn day_boundary_is_global_for_both_caches() {
        let grid = ParcelGrid::new(5, 5);
        let coordinator = InvalidationCoordinator::new(1);
        let (mut perf, mut liv) = calculators();
        coordinator.apply(LifecycleEvent::DayBoundary, grid, &mut perf, &mut liv);
        assert!(perf.cache().is_globally_stale());
        assert!(liv.cache().is_globally_stale());

        coordinator.apply(LifecycleEvent::MarketChanged, grid, &mut perf, &mut liv);
        assert_eq!(perf.stats().global_invalidations, 2);
        assert_eq!(liv.stats().global_invalidations, 1);
    }
}
