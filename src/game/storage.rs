use std::path::Path;

use log::debug;
use sled::IVec;
use uuid::Uuid;

use crate::game::errors::GameError;
use crate::game::types::{
    CharacterRecord, MissionTemplate, ShipBlueprint, ShipRecord, WeaponBlueprint,
    BLUEPRINT_SCHEMA_VERSION, CHARACTER_SCHEMA_VERSION, MISSION_SCHEMA_VERSION,
    SHIP_SCHEMA_VERSION, WEAPON_SCHEMA_VERSION,
};

const TREE_CHARACTERS: &str = "characters";
const TREE_MISSIONS: &str = "missions";
const TREE_BLUEPRINTS: &str = "ship_blueprints";
const TREE_WEAPONS: &str = "weapon_blueprints";
const TREE_SHIPS: &str = "ships";

/// Whether an upsert created a record or overwrote one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Updated,
}

/// Records that carry a schema version checked on every read.
trait Versioned {
    const ENTITY: &'static str;
    const VERSION: u8;
    fn schema_version(&self) -> u8;
}

macro_rules! versioned {
    ($ty:ty, $entity:literal, $version:expr) => {
        impl Versioned for $ty {
            const ENTITY: &'static str = $entity;
            const VERSION: u8 = $version;
            fn schema_version(&self) -> u8 {
                self.schema_version
            }
        }
    };
}

versioned!(CharacterRecord, "character", CHARACTER_SCHEMA_VERSION);
versioned!(MissionTemplate, "mission", MISSION_SCHEMA_VERSION);
versioned!(ShipBlueprint, "ship blueprint", BLUEPRINT_SCHEMA_VERSION);
versioned!(WeaponBlueprint, "weapon", WEAPON_SCHEMA_VERSION);
versioned!(ShipRecord, "ship", SHIP_SCHEMA_VERSION);

/// Sled-backed persistence for characters, catalog data and ships.
///
/// Every record is an owned value: callers keep their in-memory copies
/// between calls and write them back explicitly.
pub struct GameStore {
    db: sled::Db,
    characters: sled::Tree,
    missions: sled::Tree,
    blueprints: sled::Tree,
    weapons: sled::Tree,
    ships: sled::Tree,
}

impl GameStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        debug!("Opened game store at {}", path_ref.display());
        Ok(Self {
            characters: db.open_tree(TREE_CHARACTERS)?,
            missions: db.open_tree(TREE_MISSIONS)?,
            blueprints: db.open_tree(TREE_BLUEPRINTS)?,
            weapons: db.open_tree(TREE_WEAPONS)?,
            ships: db.open_tree(TREE_SHIPS)?,
            db,
        })
    }

    fn ship_key(owner_id: &str, id: &Uuid) -> Vec<u8> {
        format!("{}:{}", owner_id, id).into_bytes()
    }

    fn ship_prefix(owner_id: &str) -> Vec<u8> {
        format!("{}:", owner_id).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned + Versioned>(bytes: IVec) -> Result<T, GameError> {
        let record: T = bincode::deserialize(&bytes)?;
        if record.schema_version() != T::VERSION {
            return Err(GameError::SchemaMismatch {
                entity: T::ENTITY,
                expected: T::VERSION,
                found: record.schema_version(),
            });
        }
        Ok(record)
    }

    fn list<T: serde::de::DeserializeOwned + Versioned>(tree: &sled::Tree) -> Result<Vec<T>, GameError> {
        tree.iter()
            .map(|entry| {
                entry
                    .map_err(GameError::from)
                    .and_then(|(_key, value)| Self::deserialize(value))
            })
            .collect()
    }

    fn upsert<T: serde::Serialize>(tree: &sled::Tree, key: &str, value: &T) -> Result<Upsert, GameError> {
        let bytes = Self::serialize(value)?;
        let previous = tree.insert(key.as_bytes(), bytes)?;
        tree.flush()?;
        Ok(if previous.is_some() {
            Upsert::Updated
        } else {
            Upsert::Inserted
        })
    }

    // ── Characters ──

    /// Insert or update one character.
    pub fn put_character(&self, character: &CharacterRecord) -> Result<(), GameError> {
        Self::upsert(&self.characters, &character.owner_id, character)?;
        Ok(())
    }

    /// Write every character in one batch and flush it: the periodic checkpoint.
    pub fn put_characters<'a, I>(&self, characters: I) -> Result<usize, GameError>
    where
        I: IntoIterator<Item = &'a CharacterRecord>,
    {
        let mut batch = sled::Batch::default();
        let mut count = 0usize;
        for character in characters {
            batch.insert(character.owner_id.as_bytes(), Self::serialize(character)?);
            count += 1;
        }
        self.characters.apply_batch(batch)?;
        self.characters.flush()?;
        Ok(count)
    }

    pub fn get_character(&self, owner_id: &str) -> Result<CharacterRecord, GameError> {
        let Some(bytes) = self.characters.get(owner_id.as_bytes())? else {
            return Err(GameError::NotFound(format!("character: {}", owner_id)));
        };
        Self::deserialize(bytes)
    }

    /// Remove a character. Returns whether one was stored.
    pub fn delete_character(&self, owner_id: &str) -> Result<bool, GameError> {
        let removed = self.characters.remove(owner_id.as_bytes())?.is_some();
        self.characters.flush()?;
        Ok(removed)
    }

    pub fn list_characters(&self) -> Result<Vec<CharacterRecord>, GameError> {
        Self::list(&self.characters)
    }

    // ── Mission templates ──

    pub fn upsert_mission_template(&self, template: MissionTemplate) -> Result<Upsert, GameError> {
        Self::upsert(&self.missions, &template.name, &template)
    }

    pub fn get_mission_template(&self, name: &str) -> Result<MissionTemplate, GameError> {
        let Some(bytes) = self.missions.get(name.as_bytes())? else {
            return Err(GameError::NotFound(format!("mission: {}", name)));
        };
        Self::deserialize(bytes)
    }

    pub fn list_mission_templates(&self) -> Result<Vec<MissionTemplate>, GameError> {
        Self::list(&self.missions)
    }

    // ── Ship and weapon blueprints ──

    pub fn upsert_ship_blueprint(&self, blueprint: ShipBlueprint) -> Result<Upsert, GameError> {
        Self::upsert(&self.blueprints, &blueprint.model, &blueprint)
    }

    pub fn list_ship_blueprints(&self) -> Result<Vec<ShipBlueprint>, GameError> {
        Self::list(&self.blueprints)
    }

    pub fn upsert_weapon_blueprint(&self, weapon: WeaponBlueprint) -> Result<Upsert, GameError> {
        Self::upsert(&self.weapons, &weapon.name, &weapon)
    }

    pub fn list_weapon_blueprints(&self) -> Result<Vec<WeaponBlueprint>, GameError> {
        Self::list(&self.weapons)
    }

    // ── Owned ships ──

    pub fn put_ship(&self, ship: &ShipRecord) -> Result<(), GameError> {
        let key = Self::ship_key(&ship.owner_id, &ship.id);
        self.ships.insert(key, Self::serialize(ship)?)?;
        self.ships.flush()?;
        Ok(())
    }

    pub fn get_ship(&self, owner_id: &str, id: &Uuid) -> Result<ShipRecord, GameError> {
        let Some(bytes) = self.ships.get(Self::ship_key(owner_id, id))? else {
            return Err(GameError::NotFound(format!("ship: {}", id)));
        };
        Self::deserialize(bytes)
    }

    pub fn delete_ship(&self, owner_id: &str, id: &Uuid) -> Result<bool, GameError> {
        let removed = self.ships.remove(Self::ship_key(owner_id, id))?.is_some();
        self.ships.flush()?;
        Ok(removed)
    }

    /// All ships owned by one player, oldest first.
    pub fn ships_by_owner(&self, owner_id: &str) -> Result<Vec<ShipRecord>, GameError> {
        let mut ships: Vec<ShipRecord> = self
            .ships
            .scan_prefix(Self::ship_prefix(owner_id))
            .map(|entry| {
                entry
                    .map_err(GameError::from)
                    .and_then(|(_key, value)| Self::deserialize(value))
            })
            .collect::<Result<_, _>>()?;
        ships.sort_by_key(|s| s.created_at);
        Ok(ships)
    }

    pub fn delete_ships_by_owner(&self, owner_id: &str) -> Result<usize, GameError> {
        let keys: Vec<IVec> = self
            .ships
            .scan_prefix(Self::ship_prefix(owner_id))
            .keys()
            .collect::<Result<_, _>>()?;
        for key in &keys {
            self.ships.remove(key)?;
        }
        self.ships.flush()?;
        Ok(keys.len())
    }

    /// Flush every tree to disk.
    pub fn flush(&self) -> Result<(), GameError> {
        self.db.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn character_round_trip() {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStore::open(dir.path()).expect("store");
        let mut c = CharacterRecord::new("1001", "Zed", 250_000);
        c.xp = 420;
        store.put_character(&c).expect("put");
        let fetched = store.get_character("1001").expect("get");
        assert_eq!(fetched, c);
        assert!(store.delete_character("1001").expect("delete"));
        assert!(matches!(
            store.get_character("1001"),
            Err(GameError::NotFound(_))
        ));
    }

    #[test]
    fn schema_version_is_checked() {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStore::open(dir.path()).expect("store");
        let mut c = CharacterRecord::new("1001", "Zed", 0);
        c.schema_version = CHARACTER_SCHEMA_VERSION + 1;
        store.put_character(&c).expect("put");
        match store.get_character("1001") {
            Err(GameError::SchemaMismatch { entity, found, .. }) => {
                assert_eq!(entity, "character");
                assert_eq!(found, CHARACTER_SCHEMA_VERSION + 1);
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn upsert_reports_insert_then_update() {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStore::open(dir.path()).expect("store");
        let t = MissionTemplate::new("Patrol", 100, 5, 1);
        assert_eq!(store.upsert_mission_template(t.clone()).unwrap(), Upsert::Inserted);
        let changed = MissionTemplate {
            xp_reward: 120,
            ..t
        };
        assert_eq!(store.upsert_mission_template(changed).unwrap(), Upsert::Updated);
        assert_eq!(store.list_mission_templates().unwrap().len(), 1);
        assert_eq!(store.get_mission_template("Patrol").unwrap().xp_reward, 120);
    }

    #[test]
    fn ships_are_scoped_by_owner() {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStore::open(dir.path()).expect("store");
        let a = ShipRecord::new("alice", "Sparrow", "ALI-001");
        let b = ShipRecord::new("bob", "Sparrow", "BOB-002");
        store.put_ship(&a).unwrap();
        store.put_ship(&b).unwrap();
        let alices = store.ships_by_owner("alice").unwrap();
        assert_eq!(alices.len(), 1);
        assert_eq!(alices[0].name, "ALI-001");
        assert_eq!(store.delete_ships_by_owner("alice").unwrap(), 1);
        assert!(store.ships_by_owner("alice").unwrap().is_empty());
        assert_eq!(store.get_ship("bob", &b.id).unwrap().name, "BOB-002");
    }

    #[test]
    fn checkpoint_writes_all_characters() {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStore::open(dir.path()).expect("store");
        let chars = vec![
            CharacterRecord::new("1", "A", 0),
            CharacterRecord::new("2", "B", 0),
        ];
        assert_eq!(store.put_characters(&chars).unwrap(), 2);
        assert_eq!(store.list_characters().unwrap().len(), 2);
    }
}
