use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::spatial::{LocationKey, ParcelGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildingId(u64);

impl BuildingId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

pub type PlayerId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub location: LocationKey,
    pub definition_id: String,
    pub under_construction: bool,
    pub construction_days_remaining: u32,
    /// Days since construction completed (or since the last repair).
    pub age_days: u32,
    pub owner: PlayerId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerLedger {
    pub wealth: f64,
    pub lifetime_income: f64,
}

/// Authoritative placement of buildings on the parcel grid.
pub struct GameState {
    grid: ParcelGrid,
    day: u64,
    next_building: u64,
    pub(crate) buildings: HashMap<LocationKey, Building>,
    pub(crate) players: BTreeMap<PlayerId, PlayerLedger>,
}

impl GameState {
    pub fn new(grid: ParcelGrid) -> Self {
        Self {
            grid,
            day: 0,
            next_building: 0,
            buildings: HashMap::new(),
            players: BTreeMap::new(),
        }
    }

    pub fn grid(&self) -> ParcelGrid {
        self.grid
    }

    pub fn day(&self) -> u64 {
        self.day
    }

    pub(crate) fn advance_day(&mut self) {
        self.day += 1;
    }

    pub fn building(&self, key: LocationKey) -> Option<&Building> {
        self.buildings.get(&key)
    }

    pub(crate) fn building_mut(&mut self, key: LocationKey) -> Option<&mut Building> {
        self.buildings.get_mut(&key)
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    /// Occupied parcels in row-major order.
    pub fn locations(&self) -> Vec<LocationKey> {
        let mut keys: Vec<LocationKey> = self.buildings.keys().copied().collect();
        keys.sort();
        keys
    }

    pub fn player(&self, id: &str) -> Option<&PlayerLedger> {
        self.players.get(id)
    }

    pub(crate) fn credit(&mut self, player: &str, amount: f64) {
        let ledger = self.players.entry(player.to_string()).or_default();
        ledger.wealth += amount;
        ledger.lifetime_income += amount;
    }

    pub(crate) fn place(
        &mut self,
        location: LocationKey,
        definition_id: &str,
        owner: &str,
        construction_days: u32,
    ) -> BuildingId {
        let id = self.allocate();
        self.players.entry(owner.to_string()).or_default();
        self.buildings.insert(
            location,
            Building {
                id,
                location,
                definition_id: definition_id.to_string(),
                under_construction: true,
                construction_days_remaining: construction_days,
                age_days: 0,
                owner: owner.to_string(),
            },
        );
        id
    }

    pub(crate) fn remove(&mut self, location: LocationKey) -> Option<Building> {
        self.buildings.remove(&location)
    }

    fn allocate(&mut self) -> BuildingId {
        let id = BuildingId(self.next_building);
        self.next_building += 1;
        id
    }
}
