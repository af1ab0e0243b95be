use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CHARACTER_SCHEMA_VERSION: u8 = 1;
pub const MISSION_SCHEMA_VERSION: u8 = 1;
pub const BLUEPRINT_SCHEMA_VERSION: u8 = 1;
pub const WEAPON_SCHEMA_VERSION: u8 = 1;
pub const SHIP_SCHEMA_VERSION: u8 = 1;

// ============================================================================
// Missions
// ============================================================================

/// Immutable catalog definition of a mission. Templates form a forest: a
/// template without a parent is a root, children are ordered by `ordinal`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissionTemplate {
    pub name: String,
    pub description: String,
    pub epilogue: String,
    /// Base experience before the ±10% jitter.
    pub xp_reward: u32,
    /// Ticks needed to finish; always > 0 once validated.
    pub time_required: u32,
    pub tier: u8,
    #[serde(default)]
    pub parent: Option<String>,
    /// Position among its siblings in the source catalog.
    #[serde(default)]
    pub ordinal: u32,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl MissionTemplate {
    pub fn new(name: &str, xp_reward: u32, time_required: u32, tier: u8) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            epilogue: String::new(),
            xp_reward,
            time_required,
            tier,
            parent: None,
            ordinal: 0,
            updated_at: Utc::now(),
            schema_version: MISSION_SCHEMA_VERSION,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_epilogue(mut self, epilogue: &str) -> Self {
        self.epilogue = epilogue.to_string();
        self
    }

    pub fn with_parent(mut self, parent: &str, ordinal: u32) -> Self {
        self.parent = Some(parent.to_string());
        self.ordinal = ordinal;
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A mission bound to one character. Progress runs from 0 up to
/// `required_ticks`; reaching it is the terminal COMPLETE state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MissionInstance {
    /// Name of the template this instance was started from.
    pub template: String,
    /// Snapshot of the template's `time_required` at bind time.
    pub required_ticks: u32,
    pub progress: u32,
}

// ============================================================================
// Characters
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CharacterRecord {
    /// Chat-platform id of the owning player; one character per player.
    pub owner_id: String,
    pub name: String,
    pub xp: u64,
    pub credits: u64,
    #[serde(default)]
    pub current_mission: Option<MissionInstance>,
    /// Non-owning pointer to one of the player's ships.
    #[serde(default)]
    pub current_ship: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl CharacterRecord {
    pub fn new(owner_id: &str, name: &str, starting_credits: u64) -> Self {
        let now = Utc::now();
        Self {
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            xp: 0,
            credits: starting_credits,
            current_mission: None,
            current_ship: None,
            created_at: now,
            updated_at: now,
            schema_version: CHARACTER_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ============================================================================
// Ships and cargo
// ============================================================================

/// Catalog entry for a purchasable ship model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShipBlueprint {
    pub model: String,
    pub cost: u64,
    /// Tonnes.
    pub mass: u32,
    pub cargo_capacity: u32,
    pub fuel_capacity: u32,
    pub weapon_hardpoints: u8,
    pub aux_hardpoints: u8,
    pub description: String,
    pub schema_version: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    #[default]
    Docked,
    InFlight,
}

impl FlightStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FlightStatus::Docked => "DOCKED",
            FlightStatus::InFlight => "IN FLIGHT",
        }
    }
}

/// A ship owned by a player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShipRecord {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    /// Model name of the blueprint this ship was built from.
    pub blueprint: String,
    #[serde(default)]
    pub flight_status: FlightStatus,
    #[serde(default)]
    pub cargo: Vec<CargoItem>,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl ShipRecord {
    pub fn new(owner_id: &str, blueprint: &str, name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            blueprint: blueprint.to_string(),
            flight_status: FlightStatus::Docked,
            cargo: Vec::new(),
            created_at: Utc::now(),
            schema_version: SHIP_SCHEMA_VERSION,
        }
    }

    pub fn cargo_mass(&self) -> u32 {
        self.cargo.iter().map(CargoItem::mass).sum()
    }
}

/// Catalog entry for a weapon that can be carried or mounted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeaponBlueprint {
    pub name: String,
    pub description: String,
    /// Dice expression such as `2d6`.
    pub base_damage_dice: String,
    pub mass: u32,
    pub schema_version: u8,
}

/// Anything a ship can carry in its hold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CargoItem {
    Goods {
        name: String,
        mass: u32,
    },
    Weapon {
        blueprint: String,
        bonus_damage: i32,
        mass: u32,
    },
}

impl CargoItem {
    pub fn mass(&self) -> u32 {
        match self {
            CargoItem::Goods { mass, .. } | CargoItem::Weapon { mass, .. } => *mass,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CargoItem::Goods { name, .. } => name,
            CargoItem::Weapon { blueprint, .. } => blueprint,
        }
    }
}
