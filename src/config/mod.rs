//! # Configuration
//!
//! GrindBot reads a single TOML file (default `config.toml`). Every section
//! has serde defaults, so a file only needs the values it changes.
//!
//! - [`BotConfig`] - display name, command prefix, reply formatting, admins
//! - [`StorageConfig`] - data directory and sled database path
//! - [`GameConfig`] - tick period, checkpoint period, economy and catalog files
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ```toml
//! [bot]
//! name = "GrindBot"
//! command_prefix = "!"
//! code_blocks = true
//! [[bot.admins]]
//! id = "sysop"
//! name = "Sysop"
//!
//! [storage]
//! data_dir = "./data"
//!
//! [game]
//! tick_ms = 1000
//! checkpoint_ticks = 30
//! starting_credits = 250000
//! max_name_length = 30
//! missions_file = "data/catalog/missions.json"
//! ships_file = "data/catalog/ships.json"
//! weapons_file = "data/catalog/weapons.json"
//!
//! [logging]
//! level = "info"
//! file = "grindbot.log"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::game::{CatalogPaths, EngineSettings};

/// A player allowed to run admin commands.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminConfig {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_bot_name")]
    pub name: String,
    #[serde(default = "default_command_prefix")]
    pub command_prefix: String,
    /// Wrap replies in a fenced code block.
    #[serde(default = "default_true")]
    pub code_blocks: bool,
    #[serde(default)]
    pub admins: Vec<AdminConfig>,
}

fn default_bot_name() -> String {
    "GrindBot".to_string()
}

fn default_command_prefix() -> String {
    "!".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            command_prefix: default_command_prefix(),
            code_blocks: true,
            admins: vec![AdminConfig {
                id: "sysop".to_string(),
                name: "Sysop".to_string(),
            }],
        }
    }
}

impl BotConfig {
    pub fn is_admin(&self, id: &str) -> bool {
        self.admins.iter().any(|a| a.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    /// Optional override for the sled database; defaults to `<data_dir>/grindbot.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            db_path: None,
        }
    }
}

impl StorageConfig {
    pub fn resolved_db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.data_dir).join("grindbot.db"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Ticks between character checkpoints.
    #[serde(default = "default_checkpoint_ticks")]
    pub checkpoint_ticks: u32,
    #[serde(default = "default_starting_credits")]
    pub starting_credits: u64,
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    #[serde(default = "default_missions_file")]
    pub missions_file: String,
    #[serde(default = "default_ships_file")]
    pub ships_file: String,
    #[serde(default = "default_weapons_file")]
    pub weapons_file: String,
}

fn default_tick_ms() -> u64 {
    1000
}
fn default_checkpoint_ticks() -> u32 {
    30
}
fn default_starting_credits() -> u64 {
    250_000
}
fn default_max_name_length() -> usize {
    30
}
fn default_missions_file() -> String {
    "data/catalog/missions.json".to_string()
}
fn default_ships_file() -> String {
    "data/catalog/ships.json".to_string()
}
fn default_weapons_file() -> String {
    "data/catalog/weapons.json".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            checkpoint_ticks: default_checkpoint_ticks(),
            starting_credits: default_starting_credits(),
            max_name_length: default_max_name_length(),
            missions_file: default_missions_file(),
            ships_file: default_ships_file(),
            weapons_file: default_weapons_file(),
        }
    }
}

impl GameConfig {
    pub fn catalog_paths(&self) -> CatalogPaths {
        CatalogPaths {
            missions: PathBuf::from(&self.missions_file),
            ships: PathBuf::from(&self.ships_file),
            weapons: PathBuf::from(&self.weapons_file),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            tick_period: Duration::from_millis(self.tick_ms),
            checkpoint_every: self.checkpoint_ticks,
            starting_credits: self.starting_credits,
            max_name_length: self.max_name_length,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: Some("grindbot.log".to_string()),
        }
    }
}

impl LoggingConfig {
    /// Parsed level; unknown strings fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load and validate configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the current values back to `path`.
    pub async fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;
        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;
        Ok(())
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        Config::default().save(path).await
    }

    pub fn validate(&self) -> Result<()> {
        if self.game.tick_ms == 0 {
            bail!("game.tick_ms must be greater than zero");
        }
        if self.game.checkpoint_ticks == 0 {
            bail!("game.checkpoint_ticks must be greater than zero");
        }
        if self.bot.command_prefix.trim().is_empty() {
            bail!("bot.command_prefix cannot be empty");
        }
        if self.game.max_name_length == 0 {
            bail!("game.max_name_length must be greater than zero");
        }
        Ok(())
    }
}
