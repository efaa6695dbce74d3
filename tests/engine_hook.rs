use parcelsim::{
    engine::{Engine, EngineSettings},
    scenario::ScenarioLoader,
    LocationKey,
};
use tempfile::tempdir;

fn loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

fn settings(name: &str, interval: u64, dir: &std::path::Path) -> EngineSettings {
    EngineSettings {
        scenario_name: name.to_string(),
        snapshot_interval_days: interval,
        snapshot_dir: dir.to_path_buf(),
        stats_interval_days: 10,
    }
}

#[test]
fn scenario_builds_expected_town() {
    let scenario = loader().load("scenarios/small_town.yaml").unwrap();
    let sim = scenario.build_simulation().unwrap();

    assert_eq!(sim.catalog().len(), 5);
    assert_eq!(sim.invalidation_radius(), 4);
    assert_eq!(sim.state().building_count(), 6 + 12);
    assert_eq!(sim.market().overall, 0.9);
    let cottage = sim.state().building(LocationKey::new(4, 5)).unwrap();
    assert_eq!(cottage.age_days, 40);
    assert!(sim.state().building(LocationKey::new(8, 8)).unwrap().under_construction);
}

#[test]
fn random_fill_is_deterministic() {
    let scenario = loader().load("scenarios/small_town.yaml").unwrap();
    let a = scenario.build_simulation().unwrap();
    let b = scenario.build_simulation().unwrap();
    assert_eq!(a.state().locations(), b.state().locations());
}

#[test]
fn engine_runs_hook_each_day() {
    let scenario = loader().load("scenarios/small_town.yaml").unwrap();
    let mut sim = scenario.build_simulation().unwrap();
    let temp = tempdir().expect("tempdir");
    let mut engine = Engine::new(settings(&scenario.name, 0, temp.path()));

    let mut days = Vec::new();
    engine
        .run_with_hook(&mut sim, 6, |update| days.push(update.day))
        .expect("run succeeds");

    assert_eq!(days, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(engine.reports().len(), 6);
    let last = engine.last_report().unwrap();
    assert_eq!(last.buildings_processed, sim.state().building_count());
    assert!(engine.average_day_ms().is_some());
}

#[test]
fn cottage_under_construction_completes_on_schedule() {
    let scenario = loader().load("scenarios/small_town.yaml").unwrap();
    let mut sim = scenario.build_simulation().unwrap();
    let temp = tempdir().expect("tempdir");
    let mut engine = Engine::new(settings(&scenario.name, 0, temp.path()));

    let mut completed = Vec::new();
    engine
        .run_with_hook(&mut sim, 3, |update| completed.extend(update.completed.clone()))
        .unwrap();
    assert_eq!(completed, vec![LocationKey::new(8, 8)]);
}

#[test]
fn aging_erodes_net_income_between_days() {
    let scenario = loader().load("scenarios/small_town.yaml").unwrap();
    let mut sim = scenario.build_simulation().unwrap();
    let temp = tempdir().expect("tempdir");
    let mut engine = Engine::new(settings(&scenario.name, 0, temp.path()));
    let factory = LocationKey::new(12, 12);

    let mut incomes = Vec::new();
    engine
        .run_with_hook(&mut sim, 30, |update| {
            if let Some(result) = update.results.iter().find(|r| r.location == factory) {
                incomes.push(result.net_income);
            }
        })
        .unwrap();
    assert_eq!(incomes.len(), 30);
    assert!(incomes.windows(2).all(|w| w[1] <= w[0]));
    assert!(incomes[29] < incomes[0]);
}

#[test]
fn cache_stats_are_reported_on_cadence() {
    let scenario = loader().load("scenarios/small_town.yaml").unwrap();
    let mut sim = scenario.build_simulation().unwrap();
    let temp = tempdir().expect("tempdir");
    let mut engine = Engine::new(settings(&scenario.name, 0, temp.path()));
    engine.run(&mut sim, 20).unwrap();

    let with_stats: Vec<u64> = engine
        .reports()
        .iter()
        .filter(|r| r.cache.is_some())
        .map(|r| r.update.day)
        .collect();
    assert_eq!(with_stats, vec![10, 20]);
    let report = engine.last_report().unwrap().cache.unwrap();
    assert_eq!(report.livability.global_invalidations, 20);
    // One more for the scenario's market efficiency.
    assert_eq!(report.performance.global_invalidations, 21);
    assert!(report.decay_tables >= 1);
}

#[test]
fn snapshots_follow_interval() {
    let scenario = loader().load("scenarios/small_town.yaml").unwrap();
    let mut sim = scenario.build_simulation().unwrap();
    let temp = tempdir().expect("tempdir");
    let mut engine = Engine::new(settings(&scenario.name, 2, temp.path()));
    engine.run(&mut sim, 5).unwrap();

    let dir = temp.path().join(&scenario.name);
    let mut files: Vec<String> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    files.sort();
    assert_eq!(files, vec!["day_000002.json", "day_000004.json"]);

    let text = std::fs::read_to_string(dir.join("day_000004.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["day"], 4);
    assert_eq!(json["scenario"], "small_town");
}
