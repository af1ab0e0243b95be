//! Catalog loaders for data-driven content.
//!
//! Missions, ship blueprints and weapons live in JSON files under
//! `data/catalog/` so they can be edited without recompiling. On startup the
//! files are validated, then reconciled into the store by name: existing
//! records are updated in place, new ones inserted, and nothing is deleted.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::game::errors::GameError;
use crate::game::mission::MissionTree;
use crate::game::storage::{GameStore, Upsert};
use crate::game::types::{
    MissionTemplate, ShipBlueprint, WeaponBlueprint, BLUEPRINT_SCHEMA_VERSION,
    MISSION_SCHEMA_VERSION, WEAPON_SCHEMA_VERSION,
};

/// Mission as written in `missions.json`; `branches` nests child missions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub epilogue: String,
    pub xp_reward: u32,
    pub time_required: u32,
    #[serde(default = "default_tier")]
    pub tier: u8,
    #[serde(default)]
    pub branches: Vec<MissionSeed>,
}

fn default_tier() -> u8 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipSeed {
    pub model: String,
    pub cost: u64,
    pub mass: u32,
    pub cargo_capacity: u32,
    pub fuel_capacity: u32,
    pub weapon_hardpoints: u8,
    pub aux_hardpoints: u8,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_damage_dice: String,
    #[serde(default)]
    pub mass: u32,
}

/// Where the three catalog files live.
#[derive(Debug, Clone)]
pub struct CatalogPaths {
    pub missions: PathBuf,
    pub ships: PathBuf,
    pub weapons: PathBuf,
}

/// Everything the engine needs from the catalog after reconciliation.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub missions: MissionTree,
    pub blueprints: Vec<ShipBlueprint>,
    pub weapons: Vec<WeaponBlueprint>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, GameError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        GameError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read {}: {}", path.display(), e),
        ))
    })?;
    Ok(serde_json::from_str(&contents)?)
}

/// Load the mission forest from `missions.json`.
pub fn load_missions_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<MissionSeed>, GameError> {
    read_json(path.as_ref())
}

/// Load ship blueprints from `ships.json`.
pub fn load_ships_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<ShipSeed>, GameError> {
    read_json(path.as_ref())
}

/// Load weapon blueprints from `weapons.json`.
pub fn load_weapons_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<WeaponSeed>, GameError> {
    read_json(path.as_ref())
}

/// Reject a mission forest that would corrupt the store: empty, zero-tick
/// missions, or a name used twice (a repeat would link a template to itself
/// through the name-keyed upsert). Returns the number of missions.
pub fn validate_mission_seeds(seeds: &[MissionSeed]) -> Result<usize, GameError> {
    if seeds.is_empty() {
        return Err(GameError::EmptyCatalog("mission"));
    }
    let mut names = HashSet::new();
    let mut stack: Vec<&MissionSeed> = seeds.iter().collect();
    while let Some(seed) = stack.pop() {
        if seed.time_required == 0 {
            return Err(GameError::ZeroRequiredTicks(seed.name.clone()));
        }
        if !names.insert(seed.name.as_str()) {
            return Err(GameError::DuplicateTemplate(seed.name.clone()));
        }
        stack.extend(seed.branches.iter());
    }
    Ok(names.len())
}

/// Flatten the forest into templates, children before their parents.
pub fn flatten_missions(seeds: &[MissionSeed]) -> Vec<MissionTemplate> {
    let mut out = Vec::new();
    flatten_into(seeds, None, &mut out);
    out
}

fn flatten_into(seeds: &[MissionSeed], parent: Option<&str>, out: &mut Vec<MissionTemplate>) {
    for (ordinal, seed) in seeds.iter().enumerate() {
        flatten_into(&seed.branches, Some(&seed.name), out);
        out.push(MissionTemplate {
            name: seed.name.clone(),
            description: seed.description.clone(),
            epilogue: seed.epilogue.clone(),
            xp_reward: seed.xp_reward,
            time_required: seed.time_required,
            tier: seed.tier,
            parent: parent.map(str::to_string),
            ordinal: ordinal as u32,
            updated_at: Utc::now(),
            schema_version: MISSION_SCHEMA_VERSION,
        });
    }
}

/// Validate and upsert the mission forest, then build the tree from
/// everything stored (templates dropped from the file stay selectable).
pub fn sync_missions(store: &GameStore, seeds: &[MissionSeed]) -> Result<MissionTree, GameError> {
    validate_mission_seeds(seeds)?;
    let (mut inserted, mut updated) = (0usize, 0usize);
    for template in flatten_missions(seeds) {
        match store.upsert_mission_template(template)? {
            Upsert::Inserted => inserted += 1,
            Upsert::Updated => updated += 1,
        }
    }
    info!("Missions synced: {} new, {} updated", inserted, updated);
    MissionTree::from_templates(store.list_mission_templates()?)
}

pub fn sync_ship_blueprints(
    store: &GameStore,
    seeds: &[ShipSeed],
) -> Result<Vec<ShipBlueprint>, GameError> {
    for seed in seeds {
        store.upsert_ship_blueprint(ShipBlueprint {
            model: seed.model.clone(),
            cost: seed.cost,
            mass: seed.mass,
            cargo_capacity: seed.cargo_capacity,
            fuel_capacity: seed.fuel_capacity,
            weapon_hardpoints: seed.weapon_hardpoints,
            aux_hardpoints: seed.aux_hardpoints,
            description: seed.description.clone(),
            schema_version: BLUEPRINT_SCHEMA_VERSION,
        })?;
    }
    let blueprints = store.list_ship_blueprints()?;
    info!("Ships loaded: {} blueprints", blueprints.len());
    Ok(blueprints)
}

pub fn sync_weapon_blueprints(
    store: &GameStore,
    seeds: &[WeaponSeed],
) -> Result<Vec<WeaponBlueprint>, GameError> {
    for seed in seeds {
        store.upsert_weapon_blueprint(WeaponBlueprint {
            name: seed.name.clone(),
            description: seed.description.clone(),
            base_damage_dice: seed.base_damage_dice.clone(),
            mass: seed.mass,
            schema_version: WEAPON_SCHEMA_VERSION,
        })?;
    }
    store.list_weapon_blueprints()
}

/// Read all three catalog files and reconcile them into `store`. The mission
/// file is mandatory; a missing ship or weapon file leaves the stored
/// entries as they are.
pub fn sync_catalog(store: &GameStore, paths: &CatalogPaths) -> Result<Catalog, GameError> {
    let mission_seeds = load_missions_from_json(&paths.missions)?;
    let missions = sync_missions(store, &mission_seeds)?;

    let blueprints = if paths.ships.exists() {
        sync_ship_blueprints(store, &load_ships_from_json(&paths.ships)?)?
    } else {
        warn!("Ship catalog {} not found; using stored blueprints", paths.ships.display());
        store.list_ship_blueprints()?
    };

    let weapons = if paths.weapons.exists() {
        sync_weapon_blueprints(store, &load_weapons_from_json(&paths.weapons)?)?
    } else {
        warn!("Weapon catalog {} not found; using stored weapons", paths.weapons.display());
        store.list_weapon_blueprints()?
    };

    Ok(Catalog {
        missions,
        blueprints,
        weapons,
    })
}
