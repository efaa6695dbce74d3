//! Static building definitions and their livability profiles.
//!
//! Catalog files come in two livability shapes per category: a legacy bare
//! number with a sibling `<category>_range` field, or a structured
//! `{ "impact": .., "attenuation": .. }` object. Both are normalized here, once,
//! into a [`CategoryEffect`] so the spatial scan never branches on shape.
//! Values that are not numbers fall back to the defaults with a warning
//! instead of failing the whole catalog.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Range used when a legacy bare-number effect has no `<category>_range`.
pub const DEFAULT_EFFECT_RANGE: f64 = 2.0;

/// CARENS livability categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Culture,
    Affordability,
    Resilience,
    Environment,
    Noise,
    Safety,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Culture,
        Category::Affordability,
        Category::Resilience,
        Category::Environment,
        Category::Noise,
        Category::Safety,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::Culture => "culture",
            Category::Affordability => "affordability",
            Category::Resilience => "resilience",
            Category::Environment => "environment",
            Category::Noise => "noise",
            Category::Safety => "safety",
        }
    }
}

/// Normalized (effect, range) pair for one category.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryEffect {
    pub effect: f64,
    pub range: f64,
}

impl CategoryEffect {
    pub fn new(effect: f64, range: f64) -> Self {
        Self { effect, range }
    }

    pub fn is_active(&self) -> bool {
        self.effect != 0.0 && self.range > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LivabilityProfile {
    effects: [CategoryEffect; 6],
}

impl LivabilityProfile {
    pub fn new(effects: [CategoryEffect; 6]) -> Self {
        Self { effects }
    }

    pub fn with(mut self, category: Category, effect: f64, range: f64) -> Self {
        self.effects[category.index()] = CategoryEffect::new(effect, range);
        self
    }

    pub fn get(&self, category: Category) -> CategoryEffect {
        self.effects[category.index()]
    }

    pub fn effects(&self) -> &[CategoryEffect; 6] {
        &self.effects
    }

    /// Largest range among categories that actually have an effect.
    pub fn max_range(&self) -> f64 {
        self.effects
            .iter()
            .filter(|e| e.is_active())
            .map(|e| e.range)
            .fold(0.0, f64::max)
    }

    /// Sum of impact / sqrt(attenuation), one decimal, with each range taken
    /// as the attenuation.
    pub fn civic_score(&self) -> f64 {
        civic_score(self.effects.iter().map(|e| (e.effect, Some(e.range))))
    }
}

/// Sum of impact / sqrt(attenuation), rounded to one decimal. A missing,
/// zero or negative attenuation counts as 1.
pub fn civic_score(pairs: impl IntoIterator<Item = (f64, Option<f64>)>) -> f64 {
    let raw: f64 = pairs
        .into_iter()
        .map(|(impact, attenuation)| {
            let attenuation = attenuation.filter(|a| *a > 0.0).unwrap_or(1.0);
            impact / attenuation.sqrt()
        })
        .sum();
    (raw * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Economics {
    pub build_cost: f64,
    pub construction_days: u32,
    pub max_revenue: f64,
    pub maintenance_cost: f64,
    /// Aging rate as a percentage (0.05 means 0.05 %).
    pub decay_rate_percent: Option<f64>,
}

/// JEEFHH flows, carried for the market subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceFlows {
    pub jobs_provided: f64,
    pub jobs_required: f64,
    pub energy_provided: f64,
    pub energy_required: f64,
    pub education_provided: f64,
    pub education_required: f64,
    pub food_provided: f64,
    pub food_required: f64,
    pub housing_provided: f64,
    pub housing_required: f64,
    pub healthcare_provided: f64,
    pub healthcare_required: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingDefinition {
    pub id: String,
    pub name: String,
    pub category: String,
    pub economics: Economics,
    pub resources: ResourceFlows,
    pub livability: LivabilityProfile,
    pub civic_score: f64,
}

impl BuildingDefinition {
    /// Minimal definition, mostly for tests and generated scenarios.
    pub fn new(id: impl Into<String>, economics: Economics, livability: LivabilityProfile) -> Self {
        let civic_score = livability.civic_score();
        Self {
            id: id.into(),
            name: String::new(),
            category: String::new(),
            economics,
            resources: ResourceFlows::default(),
            livability,
            civic_score,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DefinitionCatalog {
    definitions: HashMap<String, BuildingDefinition>,
    max_effect_range: u32,
}

impl DefinitionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read building catalog {}", path.display()))?;
        Self::from_json_str(&data)
            .with_context(|| format!("Failed to parse building catalog {}", path.display()))
    }

    pub fn from_json_str(data: &str) -> Result<Self> {
        let raw: RawCatalog = serde_json::from_str(data)?;
        let mut catalog = Self::new();
        match raw {
            RawCatalog::Grouped(groups) => {
                for (category, entries) in groups {
                    for entry in entries {
                        catalog.insert_new(entry.normalize(Some(&category)))?;
                    }
                }
            }
            RawCatalog::Flat(entries) => {
                for entry in entries {
                    catalog.insert_new(entry.normalize(None))?;
                }
            }
        }
        Ok(catalog)
    }

    fn insert_new(&mut self, definition: BuildingDefinition) -> Result<()> {
        if self.definitions.contains_key(&definition.id) {
            bail!("building id '{}' defined more than once", definition.id);
        }
        self.insert(definition);
        Ok(())
    }

    /// Adds or replaces a definition.
    pub fn insert(&mut self, definition: BuildingDefinition) {
        let range = definition.livability.max_range().ceil() as u32;
        self.max_effect_range = self.max_effect_range.max(range);
        self.definitions.insert(definition.id.clone(), definition);
    }

    pub fn get(&self, id: &str) -> Option<&BuildingDefinition> {
        self.definitions.get(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Widest attenuation radius across every category of every definition,
    /// never less than one tile.
    pub fn max_effect_range(&self) -> u32 {
        self.max_effect_range.max(1)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCatalog {
    Grouped(BTreeMap<String, Vec<RawDefinition>>),
    Flat(Vec<RawDefinition>),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDefinition {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    civic_score: Option<f64>,
    #[serde(default)]
    economics: RawEconomics,
    #[serde(default)]
    resources: RawResources,
    #[serde(default)]
    livability: Value,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEconomics {
    build_cost: Option<f64>,
    construction_days: Option<f64>,
    max_revenue: Option<f64>,
    maintenance_cost: Option<f64>,
    decay_rate: Option<f64>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResources {
    jobs_provided: Option<f64>,
    jobs_required: Option<f64>,
    energy_provided: Option<f64>,
    energy_required: Option<f64>,
    education_provided: Option<f64>,
    education_required: Option<f64>,
    food_provided: Option<f64>,
    food_required: Option<f64>,
    housing_provided: Option<f64>,
    housing_required: Option<f64>,
    healthcare_provided: Option<f64>,
    healthcare_required: Option<f64>,
}

fn finite_or(value: Option<f64>, fallback: f64) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(fallback)
}

/// One category after reading: the normalized pair plus the attenuation as
/// written in the file, which the civic score uses.
struct ReadEffect {
    effect: CategoryEffect,
    attenuation: Option<f64>,
}

/// Reads an optional numeric field. Absent and `null` are `None`; anything
/// else that is not a finite number is reported and also read as `None`.
fn read_number(value: Option<&Value>, id: &str, field: &str) -> Option<f64> {
    match value {
        None | Some(Value::Null) => None,
        Some(value) => {
            let number = value.as_f64().filter(|v| v.is_finite());
            if number.is_none() {
                log::warn!("building '{id}': ignoring non-numeric livability {field} {value}");
            }
            number
        }
    }
}

fn read_effect(livability: &Map<String, Value>, id: &str, category: Category) -> ReadEffect {
    let name = category.name();
    let range_field = format!("{name}_range");
    let legacy_range = read_number(livability.get(&range_field), id, &range_field);
    match livability.get(name) {
        None | Some(Value::Null) => ReadEffect {
            effect: CategoryEffect::default(),
            attenuation: None,
        },
        Some(Value::Object(fields)) => {
            let impact = read_number(fields.get("impact"), id, &format!("{name}.impact"));
            let attenuation =
                read_number(fields.get("attenuation"), id, &format!("{name}.attenuation"))
                    .or(legacy_range);
            ReadEffect {
                effect: CategoryEffect::new(
                    impact.unwrap_or(0.0),
                    attenuation.unwrap_or(DEFAULT_EFFECT_RANGE),
                ),
                attenuation,
            }
        }
        Some(value) => {
            let effect = read_number(Some(value), id, name);
            let attenuation = effect.and(legacy_range);
            ReadEffect {
                effect: CategoryEffect::new(
                    effect.unwrap_or(0.0),
                    attenuation.unwrap_or(DEFAULT_EFFECT_RANGE),
                ),
                attenuation,
            }
        }
    }
}

/// Normalized profile and the civic score implied by the file's own
/// attenuation values.
fn read_livability(raw: &Value, id: &str) -> (LivabilityProfile, f64) {
    let empty = Map::new();
    let livability = match raw {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            log::warn!("building '{id}': livability is not an object ({other}), using neutral");
            &empty
        }
    };
    let read: Vec<ReadEffect> = Category::ALL
        .iter()
        .map(|category| read_effect(livability, id, *category))
        .collect();
    let mut effects = [CategoryEffect::default(); 6];
    for (slot, entry) in effects.iter_mut().zip(&read) {
        *slot = entry.effect;
    }
    let civic = civic_score(read.iter().map(|e| (e.effect.effect, e.attenuation)));
    (LivabilityProfile::new(effects), civic)
}

impl RawDefinition {
    fn normalize(self, group: Option<&str>) -> BuildingDefinition {
        let (livability, derived_civic_score) = read_livability(&self.livability, &self.id);
        let economics = Economics {
            build_cost: finite_or(self.economics.build_cost, 0.0),
            construction_days: finite_or(self.economics.construction_days, 0.0).max(0.0) as u32,
            max_revenue: finite_or(self.economics.max_revenue, 0.0),
            maintenance_cost: finite_or(self.economics.maintenance_cost, 0.0),
            decay_rate_percent: self.economics.decay_rate,
        };
        let r = &self.resources;
        let resources = ResourceFlows {
            jobs_provided: finite_or(r.jobs_provided, 0.0),
            jobs_required: finite_or(r.jobs_required, 0.0),
            energy_provided: finite_or(r.energy_provided, 0.0),
            energy_required: finite_or(r.energy_required, 0.0),
            education_provided: finite_or(r.education_provided, 0.0),
            education_required: finite_or(r.education_required, 0.0),
            food_provided: finite_or(r.food_provided, 0.0),
            food_required: finite_or(r.food_required, 0.0),
            housing_provided: finite_or(r.housing_provided, 0.0),
            housing_required: finite_or(r.housing_required, 0.0),
            healthcare_provided: finite_or(r.healthcare_provided, 0.0),
            healthcare_required: finite_or(r.healthcare_required, 0.0),
        };
        let civic_score = self
            .civic_score
            .filter(|v| v.is_finite())
            .unwrap_or(derived_civic_score);
        BuildingDefinition {
            name: self.name.unwrap_or_else(|| self.id.clone()),
            category: self
                .category
                .or_else(|| group.map(str::to_string))
                .unwrap_or_default(),
            id: self.id,
            economics,
            resources,
            livability,
            civic_score,
        }
    }
}
