use parcelsim::{
    definitions::{BuildingDefinition, Category, DefinitionCatalog, Economics, LivabilityProfile},
    market::MarketEfficiency,
    LocationKey, Simulation, SimulationConfig,
};

fn simulation() -> Simulation {
    let mut catalog = DefinitionCatalog::new();
    catalog.insert(BuildingDefinition::new(
        "bakery",
        Economics {
            construction_days: 2,
            max_revenue: 200.0,
            maintenance_cost: 20.0,
            decay_rate_percent: Some(1.0),
            ..Economics::default()
        },
        LivabilityProfile::default().with(Category::Culture, 40.0, 2.0),
    ));
    Simulation::new(SimulationConfig::default().with_grid(30, 30), catalog)
}

#[test]
fn consecutive_calls_hit_the_cache() {
    let mut sim = simulation();
    let at = LocationKey::new(5, 5);
    sim.place_completed(at, "bakery", "ada").unwrap();

    let first = sim.performance(at).unwrap();
    let before = sim.cache_report().performance;
    let second = sim.performance(at).unwrap();
    let after = sim.cache_report().performance;

    assert_eq!(first, second);
    assert_eq!(first.revenue.to_bits(), second.revenue.to_bits());
    assert_eq!(after.hits, before.hits + 1);
    assert_eq!(after.misses, before.misses);
}

#[test]
fn fresh_building_earns_full_revenue() {
    let mut sim = simulation();
    let at = LocationKey::new(5, 5);
    sim.place_completed(at, "bakery", "ada").unwrap();

    let result = sim.performance(at).unwrap();
    assert!(result.operational);
    assert_eq!(result.revenue, 200.0);
    assert_eq!(result.maintenance, 20.0);
    assert_eq!(result.net_income, 180.0);
    assert_eq!(result.livability_multiplier, 1.0);
}

#[test]
fn neighbor_livability_feeds_revenue() {
    let mut sim = simulation();
    let at = LocationKey::new(5, 5);
    sim.place_completed(at, "bakery", "ada").unwrap();
    let alone = sim.performance(at).unwrap();

    sim.place_completed(LocationKey::new(6, 6), "bakery", "bo").unwrap();
    let with_neighbor = sim.performance(at).unwrap();
    assert!((with_neighbor.livability_multiplier - 1.08).abs() < 1e-12);
    assert!((with_neighbor.revenue - alone.revenue * 1.08).abs() < 1e-9);
}

#[test]
fn revenue_scales_with_market_efficiency() {
    let mut sim = simulation();
    let at = LocationKey::new(5, 5);
    sim.place_completed(at, "bakery", "ada").unwrap();
    sim.set_market_efficiency(MarketEfficiency::uniform(0.75));

    let result = sim.performance(at).unwrap();
    assert_eq!(result.market_efficiency, 0.75);
    assert_eq!(result.revenue, 150.0);
}

#[test]
fn empty_parcel_has_no_performance() {
    let mut sim = simulation();
    assert!(sim.performance(LocationKey::new(1, 1)).is_none());
    assert!(sim.performance_calculator().cache().is_empty());
}

#[test]
fn unknown_definition_cannot_be_built() {
    let mut sim = Simulation::new(SimulationConfig::default(), DefinitionCatalog::new());
    let at = LocationKey::new(1, 1);
    assert!(sim.start_construction(at, "bakery", "ada").is_err());
    assert!(sim.performance(at).is_none());
}

#[test]
fn construction_site_earns_nothing() {
    let mut sim = simulation();
    let at = LocationKey::new(2, 2);
    sim.start_construction(at, "bakery", "ada").unwrap();

    let result = sim.performance(at).unwrap();
    assert!(!result.operational);
    assert_eq!(result.net_income, 0.0);

    sim.complete_construction(at).unwrap();
    assert!(sim.performance(at).unwrap().operational);
}

#[test]
fn invalidation_stays_local() {
    let mut sim = simulation();
    let near = LocationKey::new(3, 3);
    let far = LocationKey::new(25, 25);
    sim.place_completed(near, "bakery", "ada").unwrap();
    sim.place_completed(far, "bakery", "bo").unwrap();
    sim.performance(near);
    sim.performance(far);

    sim.repair(near).unwrap();
    assert!(sim.performance_calculator().cache().is_stale(near));
    assert!(!sim.performance_calculator().cache().is_stale(far));

    let hits = sim.cache_report().performance.hits;
    sim.performance(far);
    assert_eq!(sim.cache_report().performance.hits, hits + 1);

    sim.place_completed(LocationKey::new(4, 4), "bakery", "cy").unwrap();
    assert!(!sim.performance_calculator().cache().is_stale(far));
    assert!(sim.livability_calculator().cache().is_stale(near));
}
