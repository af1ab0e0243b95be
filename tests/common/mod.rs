//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use grindbot::game::{
    Catalog, CatalogPaths, EngineSettings, GameEngine, GameStore, MissionTemplate, MissionTree,
    ShipBlueprint,
};
use tempfile::TempDir;

/// The sample catalog shipped under `data/catalog`.
pub fn repo_catalog_paths() -> CatalogPaths {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join("catalog");
    CatalogPaths {
        missions: root.join("missions.json"),
        ships: root.join("ships.json"),
        weapons: root.join("weapons.json"),
    }
}

pub fn open_store() -> (GameStore, TempDir) {
    let dir = TempDir::new().expect("tempdir");
    let store = GameStore::open(dir.path().join("db")).expect("open store");
    (store, dir)
}

pub fn blueprint(model: &str, cost: u64) -> ShipBlueprint {
    ShipBlueprint {
        model: model.to_string(),
        cost,
        mass: 50,
        cargo_capacity: 20,
        fuel_capacity: 100,
        weapon_hardpoints: 1,
        aux_hardpoints: 1,
        description: format!("{} test hull", model),
        schema_version: grindbot::game::types::BLUEPRINT_SCHEMA_VERSION,
    }
}

/// One root mission, no branches: every completion repeats it.
pub fn single_mission_catalog(ticks: u32, xp: u32) -> Catalog {
    Catalog {
        missions: MissionTree::from_templates(vec![MissionTemplate::new("Patrol", xp, ticks, 1)
            .with_description("Fly the loop.")
            .with_epilogue("Quiet shift.")])
        .expect("tree"),
        blueprints: vec![blueprint("Sparrow", 50_000), blueprint("Lancer", 240_000)],
        weapons: Vec::new(),
    }
}

/// Two roots; `Patrol` branches into `Ambush` and `Pursuit`.
pub fn branching_catalog() -> Catalog {
    Catalog {
        missions: MissionTree::from_templates(vec![
            MissionTemplate::new("Patrol", 100, 2, 1),
            MissionTemplate::new("Salvage", 80, 2, 1),
            MissionTemplate::new("Ambush", 150, 2, 2).with_parent("Patrol", 0),
            MissionTemplate::new("Pursuit", 150, 2, 2).with_parent("Patrol", 1),
        ])
        .expect("tree"),
        blueprints: vec![blueprint("Sparrow", 50_000)],
        weapons: Vec::new(),
    }
}

pub fn settings(checkpoint_every: u32, starting_credits: u64) -> EngineSettings {
    EngineSettings {
        tick_period: Duration::from_secs(1),
        checkpoint_every,
        starting_credits,
        max_name_length: 30,
    }
}

pub fn engine(catalog: Catalog, settings: EngineSettings) -> (GameEngine, TempDir) {
    let (store, dir) = open_store();
    let engine = GameEngine::new(store, catalog, settings)
        .expect("engine")
        .with_seed(42);
    (engine, dir)
}

pub fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("db")
}
