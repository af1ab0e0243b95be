//! Game domain: characters, the mission tree, ships and the tick engine.
//!
//! Records live in a sled-backed [`GameStore`]; the catalog is read from
//! JSON on startup and reconciled into the store; [`GameEngine`] owns the
//! live character registry and is the only thing that mutates it.

pub mod catalog;
pub mod character;
pub mod engine;
pub mod errors;
pub mod hangar;
pub mod leveling;
pub mod mission;
pub mod outbox;
pub mod storage;
pub mod types;

pub use catalog::{sync_catalog, Catalog, CatalogPaths, MissionSeed, ShipSeed, WeaponSeed};
pub use engine::{format_uptime, EngineSettings, GameEngine, SaleReceipt, TickReport};
pub use errors::GameError;
pub use hangar::{blueprint_info_card, plate_name, Hangar};
pub use leveling::{level_for_xp, LevelUp};
pub use mission::{mission_info_card, reward_bounds, roll_reward, MissionStatus, MissionTree};
pub use outbox::{OutgoingMessage, Outbox};
pub use storage::{GameStore, Upsert};
pub use types::{
    CargoItem, CharacterRecord, FlightStatus, MissionInstance, MissionTemplate,
    ShipBlueprint, ShipRecord, WeaponBlueprint,
};
