use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rand::{seq::SliceRandom, Rng};
use serde::Deserialize;

use crate::{
    config::SimulationConfig,
    definitions::DefinitionCatalog,
    market::MarketEfficiency,
    rng::RngManager,
    simulation::Simulation,
    spatial::LocationKey,
};

fn default_snapshot_interval_days() -> u64 {
    30
}

fn default_owner() -> String {
    "city".to_string()
}

fn default_completed() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub days: Option<u64>,
    #[serde(default = "default_snapshot_interval_days")]
    pub snapshot_interval_days: u64,
    /// Building catalog JSON, relative to the scenario's base directory.
    pub catalog: PathBuf,
    #[serde(default)]
    pub config: SimulationConfig,
    #[serde(default)]
    pub market: MarketEfficiency,
    #[serde(default)]
    pub buildings: Vec<ScenarioBuilding>,
    #[serde(default)]
    pub random_fill: Option<RandomFill>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioBuilding {
    pub row: u32,
    pub col: u32,
    pub definition: String,
    #[serde(default = "default_owner")]
    pub owner: String,
    #[serde(default = "default_completed")]
    pub completed: bool,
    #[serde(default)]
    pub age_days: u32,
}

/// Scatters completed buildings over free parcels.
#[derive(Debug, Clone, Deserialize)]
pub struct RandomFill {
    pub count: usize,
    /// Definitions to draw from; every catalog entry when empty.
    #[serde(default)]
    pub definitions: Vec<String>,
    #[serde(default)]
    pub owners: Vec<String>,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let mut scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if scenario.catalog.is_relative() {
            scenario.catalog = self.base_dir.join(&scenario.catalog);
        }
        Ok(scenario)
    }
}

impl Scenario {
    pub fn days(&self, override_days: Option<u64>) -> u64 {
        override_days.or(self.days).unwrap_or(120)
    }

    pub fn build_simulation(&self) -> Result<Simulation> {
        let catalog = DefinitionCatalog::load(&self.catalog)?;
        self.build_simulation_with(catalog)
    }

    pub fn build_simulation_with(&self, catalog: DefinitionCatalog) -> Result<Simulation> {
        let mut sim = Simulation::new(self.config.clone(), catalog);
        sim.set_market_efficiency(self.market);

        for placed in &self.buildings {
            let location = LocationKey::new(placed.row, placed.col);
            sim.start_construction(location, &placed.definition, &placed.owner)
                .with_context(|| format!("Scenario '{}' building at {location}", self.name))?;
            if placed.completed {
                sim.complete_construction(location)?;
                if placed.age_days > 0 {
                    sim.set_age(location, placed.age_days)?;
                }
            }
        }

        if let Some(fill) = &self.random_fill {
            self.apply_random_fill(&mut sim, fill)?;
        }
        log::info!(
            "scenario '{}' ready: {} buildings on a {}x{} grid",
            self.name,
            sim.state().building_count(),
            self.config.grid_rows,
            self.config.grid_cols
        );
        Ok(sim)
    }

    fn apply_random_fill(&self, sim: &mut Simulation, fill: &RandomFill) -> Result<()> {
        let definitions: Vec<String> = if fill.definitions.is_empty() {
            sim.catalog().ids().into_iter().map(str::to_string).collect()
        } else {
            fill.definitions.clone()
        };
        if definitions.is_empty() {
            return Ok(());
        }
        let owners = if fill.owners.is_empty() {
            vec![default_owner()]
        } else {
            fill.owners.clone()
        };

        let grid = sim.state().grid();
        let free = grid.parcel_count() as usize - sim.state().building_count();
        let target = fill.count.min(free);
        let mut rng = RngManager::new(self.seed).stream("random_fill");
        let mut placed = 0;
        while placed < target {
            let location = LocationKey::new(
                rng.gen_range(0..grid.rows()),
                rng.gen_range(0..grid.cols()),
            );
            if sim.state().building(location).is_some() {
                continue;
            }
            let definition = definitions
                .choose(&mut rng)
                .map(String::as_str)
                .unwrap_or_default();
            let owner = owners
                .choose(&mut rng)
                .map(String::as_str)
                .unwrap_or_default();
            sim.place_completed(location, definition, owner)
                .with_context(|| format!("Random fill in scenario '{}'", self.name))?;
            placed += 1;
        }
        Ok(())
    }
}
