//! The game session: sole owner of the in-memory character registry.
//!
//! `GameEngine` is driven from a single loop. Every tick advances each
//! character's mission exactly once; command handlers call into the same
//! value between ticks, so no character is ever mutated concurrently and
//! no locking is needed.

use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::game::catalog::Catalog;
use crate::game::errors::GameError;
use crate::game::hangar::Hangar;
use crate::game::mission::{mission_info_card, roll_reward, MissionStatus, MissionTree};
use crate::game::outbox::{OutgoingMessage, Outbox};
use crate::game::storage::GameStore;
use crate::game::types::{CharacterRecord, MissionInstance, ShipRecord, WeaponBlueprint};

/// Tunables taken from the `[game]` config section.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub tick_period: Duration,
    /// Ticks between checkpoints.
    pub checkpoint_every: u32,
    pub starting_credits: u64,
    pub max_name_length: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
            checkpoint_every: 30,
            starting_credits: 250_000,
            max_name_length: 30,
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub advanced: usize,
    pub completed: usize,
    pub started: usize,
    pub checkpointed: bool,
}

/// Result of a successful ship sale.
#[derive(Debug, Clone)]
pub struct SaleReceipt {
    pub ship: ShipRecord,
    pub refund: u64,
}

pub struct GameEngine {
    store: GameStore,
    missions: MissionTree,
    hangar: Hangar,
    weapons: Vec<WeaponBlueprint>,
    characters: BTreeMap<String, CharacterRecord>,
    outbox: Outbox,
    settings: EngineSettings,
    rng: StdRng,
    ticks: u64,
    since_checkpoint: u32,
}

impl GameEngine {
    /// Load every stored character. A mission whose template is no longer in
    /// the tree is unbound so the next tick picks a fresh one.
    pub fn new(store: GameStore, catalog: Catalog, settings: EngineSettings) -> Result<Self, GameError> {
        let mut characters = BTreeMap::new();
        for mut character in store.list_characters()? {
            let stale = character
                .current_mission_template()
                .map(|name| catalog.missions.get(name).is_none())
                .unwrap_or(false);
            if stale {
                warn!(
                    "Unbinding stale mission {:?} from {}",
                    character.current_mission_template(),
                    character.name
                );
                character.current_mission = None;
            }
            characters.insert(character.owner_id.clone(), character);
        }
        info!(
            "Game engine ready: {} characters, {} missions, {} ship models",
            characters.len(),
            catalog.missions.len(),
            catalog.blueprints.len()
        );
        Ok(Self {
            store,
            missions: catalog.missions,
            hangar: Hangar::new(catalog.blueprints),
            weapons: catalog.weapons,
            characters,
            outbox: Outbox::new(),
            settings: EngineSettings {
                checkpoint_every: settings.checkpoint_every.max(1),
                ..settings
            },
            rng: StdRng::from_entropy(),
            ticks: 0,
            since_checkpoint: 0,
        })
    }

    /// Replace the random source, for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ── Tick driver ──

    /// Advance every character by one tick, then checkpoint if due.
    pub fn tick(&mut self) -> Result<TickReport, GameError> {
        self.ticks += 1;
        let mut report = TickReport {
            tick: self.ticks,
            ..TickReport::default()
        };

        for character in self.characters.values_mut() {
            if character.current_mission.is_none() {
                start_next(&self.missions, &mut self.outbox, character, None, &mut self.rng);
                report.started += 1;
                continue;
            }
            let Some(status) = character.current_mission.as_mut().map(MissionInstance::advance) else {
                continue;
            };
            report.advanced += 1;
            match status {
                MissionStatus::Active => {}
                MissionStatus::Completed => {
                    complete_mission(&self.missions, &mut self.outbox, character, &mut self.rng);
                    report.completed += 1;
                    report.started += 1;
                }
                MissionStatus::AlreadyComplete => {
                    let finished = character.current_mission_template().map(str::to_string);
                    start_next(
                        &self.missions,
                        &mut self.outbox,
                        character,
                        finished.as_deref(),
                        &mut self.rng,
                    );
                    report.started += 1;
                }
            }
        }

        self.since_checkpoint += 1;
        if self.since_checkpoint >= self.settings.checkpoint_every {
            self.checkpoint()?;
            report.checkpointed = true;
        }
        Ok(report)
    }

    /// Flush every character to storage in one batch.
    pub fn checkpoint(&mut self) -> Result<usize, GameError> {
        let written = self.store.put_characters(self.characters.values())?;
        self.since_checkpoint = 0;
        debug!("Checkpoint at tick {}: {} characters", self.ticks, written);
        Ok(written)
    }

    /// Final checkpoint before the process stops.
    pub fn shutdown(&mut self) -> Result<(), GameError> {
        self.checkpoint()?;
        self.store.flush()
    }

    pub fn drain_outbox(&mut self) -> Vec<OutgoingMessage> {
        self.outbox.drain()
    }

    // ── Characters ──

    pub fn character(&self, owner_id: &str) -> Option<&CharacterRecord> {
        self.characters.get(owner_id)
    }

    pub fn characters(&self) -> impl Iterator<Item = &CharacterRecord> {
        self.characters.values()
    }

    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    pub fn create_character(&mut self, owner_id: &str, name: &str) -> Result<&CharacterRecord, GameError> {
        let name = self.validate_name(name)?;
        if let Some(existing) = self.characters.get(owner_id) {
            return Err(GameError::AlreadyExists(format!(
                "you already play {}",
                existing.name
            )));
        }
        if self
            .characters
            .values()
            .any(|c| c.name.eq_ignore_ascii_case(&name))
        {
            return Err(GameError::AlreadyExists(format!("the name {} is taken", name)));
        }

        let character = CharacterRecord::new(owner_id, &name, self.settings.starting_credits);
        self.store.put_character(&character)?;
        self.outbox.public(format!("{} has entered the world!", character.name));
        info!("Character created: {} ({})", character.name, owner_id);
        Ok(self.characters.entry(owner_id.to_string()).or_insert(character))
    }

    /// Remove the character and every ship it owns.
    pub fn delete_character(&mut self, owner_id: &str) -> Result<CharacterRecord, GameError> {
        let character = self
            .characters
            .remove(owner_id)
            .ok_or_else(|| GameError::NotFound(format!("character for {}", owner_id)))?;
        self.store.delete_character(owner_id)?;
        let ships = self.store.delete_ships_by_owner(owner_id)?;
        self.outbox
            .public(format!("{} stumbled out an airlock and died.", character.name));
        info!(
            "Character deleted: {} ({}), {} ships scrapped",
            character.name, owner_id, ships
        );
        Ok(character)
    }

    /// Character sheet including the boarded ship.
    pub fn character_sheet(&self, owner_id: &str) -> Result<String, GameError> {
        let character = self.require(owner_id)?;
        let ship = self.current_ship(owner_id)?;
        Ok(character.info_card(ship.as_ref()))
    }

    /// Level | Name | XP table, highest xp first.
    pub fn scoreboard(&self) -> String {
        let mut rows: Vec<&CharacterRecord> = self.characters.values().collect();
        rows.sort_by(|a, b| b.xp.cmp(&a.xp).then_with(|| a.name.cmp(&b.name)));
        let rows: Vec<(String, &str, String)> = rows
            .into_iter()
            .map(|c| (c.level().to_string(), c.name.as_str(), c.xp.to_string()))
            .collect();

        let l = rows.iter().map(|r| r.0.len()).max().unwrap_or(0).max("Level".len());
        let n = rows
            .iter()
            .map(|r| r.1.chars().count())
            .max()
            .unwrap_or(0)
            .max("Name".len());
        let x = rows.iter().map(|r| r.2.len()).max().unwrap_or(0).max("XP".len());

        let header = format!("{:>l$} | {:^n$} | {:<x$}", "Level", "Name", "XP");
        let mut lines = vec![header.trim_end().to_string(), "-".repeat(header.len())];
        for (level, name, xp) in &rows {
            let line = format!("{:>l$} | {:^n$} | {:<x$}", level, name, xp);
            lines.push(line.trim_end().to_string());
        }
        lines.join("\n")
    }

    // ── Ships ──

    pub fn hangar(&self) -> &Hangar {
        &self.hangar
    }

    pub fn weapons(&self) -> &[WeaponBlueprint] {
        &self.weapons
    }

    pub fn ships(&self, owner_id: &str) -> Result<Vec<ShipRecord>, GameError> {
        self.require(owner_id)?;
        self.store.ships_by_owner(owner_id)
    }

    pub fn current_ship(&self, owner_id: &str) -> Result<Option<ShipRecord>, GameError> {
        let character = self.require(owner_id)?;
        let Some(id) = character.current_ship else {
            return Ok(None);
        };
        match self.store.get_ship(owner_id, &id) {
            Ok(ship) => Ok(Some(ship)),
            Err(GameError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Buy and board a ship. The registry entry is replaced only after the
    /// ship and the debited character are both stored; any earlier failure
    /// leaves the character as it was.
    pub fn buy_ship(&mut self, owner_id: &str, model: &str) -> Result<ShipRecord, GameError> {
        let taken: Vec<String> = self.ships(owner_id)?.into_iter().map(|s| s.name).collect();
        let mut character = self.require(owner_id)?.clone();
        let ship = self.hangar.purchase(&mut character, model, &taken, &mut self.rng)?;
        self.store.put_ship(&ship)?;
        if let Err(e) = self.store.put_character(&character) {
            // Roll back the ship row.
            let _ = self.store.delete_ship(owner_id, &ship.id);
            return Err(e);
        }
        self.outbox.public(format!(
            "{} bought a {} and named it '{}'!",
            character.name, ship.blueprint, ship.name
        ));
        info!("{} bought {} ({})", character.name, ship.name, ship.blueprint);
        self.characters.insert(owner_id.to_string(), character);
        Ok(ship)
    }

    /// Delete the ship, then refund. Same commit rule as [`buy_ship`](Self::buy_ship).
    pub fn sell_ship(&mut self, owner_id: &str, ship_name: &str) -> Result<SaleReceipt, GameError> {
        let ship = self.find_ship(owner_id, ship_name)?;
        let mut character = self.require(owner_id)?.clone();
        self.store.delete_ship(owner_id, &ship.id)?;
        let refund = self.hangar.sell(&mut character, &ship);
        if let Err(e) = self.store.put_character(&character) {
            let _ = self.store.put_ship(&ship);
            return Err(e);
        }
        self.outbox.public(format!(
            "{} sold the {} '{}' for {} credits.",
            character.name, ship.blueprint, ship.name, refund
        ));
        self.characters.insert(owner_id.to_string(), character);
        Ok(SaleReceipt { ship, refund })
    }

    pub fn board_ship(&mut self, owner_id: &str, ship_name: &str) -> Result<ShipRecord, GameError> {
        let ship = self.find_ship(owner_id, ship_name)?;
        self.set_current_ship(owner_id, Some(ship.id))?;
        Ok(ship)
    }

    /// Rename the boarded ship.
    pub fn rename_current_ship(&mut self, owner_id: &str, new_name: &str) -> Result<ShipRecord, GameError> {
        let new_name = self.validate_name(new_name)?;
        let mut ship = self
            .current_ship(owner_id)?
            .ok_or_else(|| GameError::NotFound("you are not aboard a ship".to_string()))?;
        let clash = self
            .store
            .ships_by_owner(owner_id)?
            .into_iter()
            .any(|s| s.id != ship.id && s.name.eq_ignore_ascii_case(&new_name));
        if clash {
            return Err(GameError::AlreadyExists(format!("you already own a ship named {}", new_name)));
        }
        ship.name = new_name;
        self.store.put_ship(&ship)?;
        Ok(ship)
    }

    // ── Clock ──

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn uptime(&self) -> Duration {
        self.settings.tick_period.saturating_mul(self.ticks.min(u64::from(u32::MAX)) as u32)
    }

    pub fn tick_period(&self) -> Duration {
        self.settings.tick_period
    }

    pub fn checkpoint_every(&self) -> u32 {
        self.settings.checkpoint_every
    }

    /// Set the checkpoint period. Zero is treated as one.
    pub fn set_checkpoint_every(&mut self, ticks: u32) {
        self.settings.checkpoint_every = ticks.max(1);
        info!("Checkpoint period set to {} ticks", self.settings.checkpoint_every);
    }

    pub fn missions(&self) -> &MissionTree {
        &self.missions
    }

    // ── helpers ──

    fn require(&self, owner_id: &str) -> Result<&CharacterRecord, GameError> {
        self.characters
            .get(owner_id)
            .ok_or_else(|| GameError::NotFound(format!("character for {}", owner_id)))
    }

    fn find_ship(&self, owner_id: &str, ship_name: &str) -> Result<ShipRecord, GameError> {
        let wanted = ship_name.trim();
        self.ships(owner_id)?
            .into_iter()
            .find(|s| s.name.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| GameError::NotFound(format!("ship: {}", wanted)))
    }

    fn set_current_ship(&mut self, owner_id: &str, ship: Option<Uuid>) -> Result<(), GameError> {
        let mut character = self.require(owner_id)?.clone();
        character.current_ship = ship;
        character.touch();
        self.store.put_character(&character)?;
        self.characters.insert(owner_id.to_string(), character);
        Ok(())
    }

    fn validate_name(&self, raw: &str) -> Result<String, GameError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(GameError::InvalidName("name cannot be empty".to_string()));
        }
        if name.chars().count() > self.settings.max_name_length {
            return Err(GameError::InvalidName(format!(
                "name must be at most {} characters",
                self.settings.max_name_length
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(GameError::InvalidName("name contains control characters".to_string()));
        }
        Ok(name.to_string())
    }
}

/// Pay out a finished mission and bind the next one.
fn complete_mission<R: Rng + ?Sized>(
    missions: &MissionTree,
    outbox: &mut Outbox,
    character: &mut CharacterRecord,
    rng: &mut R,
) {
    let finished = character.current_mission_template().map(str::to_string);
    if let Some(template) = finished.as_deref().and_then(|name| missions.get(name)) {
        let award = roll_reward(template, rng);
        for level_up in character.add_xp(award) {
            outbox.public(format!(
                "{} is now level {} ({} XP)!",
                character.name, level_up.level, level_up.xp
            ));
        }
        if !template.epilogue.is_empty() {
            outbox.private(&character.owner_id, template.epilogue.clone());
        }
        outbox.private(
            &character.owner_id,
            format!("You completed {} and were awarded {} XP!", template.name, award),
        );
        debug!("{} completed {} for {} xp", character.name, template.name, award);
    }
    start_next(missions, outbox, character, finished.as_deref(), rng);
}

/// Select and bind the next mission. A repeat of `completed` is announced
/// but kept.
fn start_next<R: Rng + ?Sized>(
    missions: &MissionTree,
    outbox: &mut Outbox,
    character: &mut CharacterRecord,
    completed: Option<&str>,
    rng: &mut R,
) {
    let Some(template) = missions.select_next(completed, rng) else {
        return;
    };
    let repeat = if completed == Some(template.name.as_str()) {
        "Deja vu...\n"
    } else {
        ""
    };
    outbox.private(
        &character.owner_id,
        format!(
            "You have started a new mission.\n{}{}",
            repeat,
            mission_info_card(template)
        ),
    );
    // The superseded instance is dropped; only the current one is kept.
    let _previous = character.bind_mission(MissionInstance::start(template));
}

/// `H:MM:SS`, or `D day(s), H:MM:SS` once a day has passed.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;
    if days == 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!(
            "{} day{}, {}:{:02}:{:02}",
            days,
            if days == 1 { "" } else { "s" },
            hours,
            minutes,
            seconds
        )
    }
}
