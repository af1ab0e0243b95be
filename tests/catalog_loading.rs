//! Catalog JSON loading, validation and name-based reconciliation.

mod common;

use std::fs;

use grindbot::game::catalog::{sync_missions, MissionSeed};
use grindbot::game::{sync_catalog, CatalogPaths, GameError};
use tempfile::TempDir;

fn write_catalog(dir: &TempDir, missions: &str, ships: Option<&str>) -> CatalogPaths {
    let paths = CatalogPaths {
        missions: dir.path().join("missions.json"),
        ships: dir.path().join("ships.json"),
        weapons: dir.path().join("weapons.json"),
    };
    fs::write(&paths.missions, missions).unwrap();
    if let Some(ships) = ships {
        fs::write(&paths.ships, ships).unwrap();
    }
    paths
}

#[test]
fn sample_catalog_loads_everything() {
    let (store, _dir) = common::open_store();
    let catalog = sync_catalog(&store, &common::repo_catalog_paths()).expect("sync");
    assert_eq!(catalog.missions.len(), 7);
    assert_eq!(catalog.blueprints.len(), 3);
    assert_eq!(catalog.weapons.len(), 3);
    assert_eq!(store.list_mission_templates().unwrap().len(), 7);
}

#[test]
fn resync_updates_in_place_without_duplicates() {
    let (store, _store_dir) = common::open_store();
    let files = TempDir::new().unwrap();
    let paths = write_catalog(
        &files,
        r#"[{"name": "Patrol", "xp_reward": 100, "time_required": 5,
             "branches": [{"name": "Ambush", "xp_reward": 150, "time_required": 6}]}]"#,
        None,
    );
    sync_catalog(&store, &paths).expect("first sync");

    fs::write(
        &paths.missions,
        r#"[{"name": "Patrol", "xp_reward": 120, "time_required": 5, "epilogue": "Done.",
             "branches": [{"name": "Ambush", "xp_reward": 150, "time_required": 6}]}]"#,
    )
    .unwrap();
    let catalog = sync_catalog(&store, &paths).expect("second sync");
    assert_eq!(catalog.missions.len(), 2);
    let patrol = catalog.missions.get("Patrol").unwrap();
    assert_eq!(patrol.xp_reward, 120);
    assert_eq!(patrol.epilogue, "Done.");
    assert_eq!(catalog.missions.get("Ambush").unwrap().parent.as_deref(), Some("Patrol"));
}

#[test]
fn missions_dropped_from_the_file_are_kept() {
    let (store, _store_dir) = common::open_store();
    let files = TempDir::new().unwrap();
    let paths = write_catalog(
        &files,
        r#"[{"name": "Patrol", "xp_reward": 100, "time_required": 5},
            {"name": "Salvage", "xp_reward": 80, "time_required": 4}]"#,
        None,
    );
    sync_catalog(&store, &paths).expect("first sync");
    fs::write(&paths.missions, r#"[{"name": "Patrol", "xp_reward": 100, "time_required": 5}]"#).unwrap();
    let catalog = sync_catalog(&store, &paths).expect("second sync");
    assert!(catalog.missions.get("Salvage").is_some());
}

#[test]
fn zero_tick_mission_is_rejected_before_any_write() {
    let (store, _store_dir) = common::open_store();
    let files = TempDir::new().unwrap();
    let paths = write_catalog(
        &files,
        r#"[{"name": "Patrol", "xp_reward": 100, "time_required": 5,
             "branches": [{"name": "Idle", "xp_reward": 10, "time_required": 0}]}]"#,
        None,
    );
    let err = sync_catalog(&store, &paths).unwrap_err();
    assert!(matches!(err, GameError::ZeroRequiredTicks(name) if name == "Idle"));
    assert!(store.list_mission_templates().unwrap().is_empty());
}

#[test]
fn repeated_name_cannot_form_a_cycle() {
    let (store, _dir) = common::open_store();
    let seeds: Vec<MissionSeed> = serde_json::from_str(
        r#"[{"name": "Loop", "xp_reward": 1, "time_required": 1,
             "branches": [{"name": "Loop", "xp_reward": 1, "time_required": 1}]}]"#,
    )
    .unwrap();
    assert!(matches!(
        sync_missions(&store, &seeds),
        Err(GameError::DuplicateTemplate(name)) if name == "Loop"
    ));
}

#[test]
fn empty_or_malformed_catalog_fails() {
    let (store, _dir) = common::open_store();
    let files = TempDir::new().unwrap();
    let paths = write_catalog(&files, "[]", None);
    assert!(matches!(
        sync_catalog(&store, &paths),
        Err(GameError::EmptyCatalog("mission"))
    ));
    fs::write(&paths.missions, r#"[{"name": "Patrol"}]"#).unwrap();
    assert!(matches!(sync_catalog(&store, &paths), Err(GameError::Json(_))));
}

#[test]
fn missing_ship_file_keeps_stored_blueprints() {
    let (store, _dir) = common::open_store();
    let files = TempDir::new().unwrap();
    let paths = write_catalog(
        &files,
        r#"[{"name": "Patrol", "xp_reward": 100, "time_required": 5}]"#,
        Some(
            r#"[{"model": "Sparrow", "cost": 50000, "mass": 40, "cargo_capacity": 20,
                 "fuel_capacity": 100, "weapon_hardpoints": 1, "aux_hardpoints": 1}]"#,
        ),
    );
    assert_eq!(sync_catalog(&store, &paths).unwrap().blueprints.len(), 1);

    fs::remove_file(&paths.ships).unwrap();
    let catalog = sync_catalog(&store, &paths).expect("sync without ships file");
    assert_eq!(catalog.blueprints.len(), 1);
    assert_eq!(catalog.blueprints[0].model, "Sparrow");
    assert!(catalog.weapons.is_empty());
}
