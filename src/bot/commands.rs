//! Prefix command parsing and dispatch.
//!
//! [`CommandParser`] turns a chat line such as `!ship buy sparrow` into a
//! [`BotCommand`]; text without the prefix is not a command at all.
//! [`CommandProcessor`] runs a command against the [`GameEngine`] and
//! renders a plain-text reply for the requester.

use log::{error, trace};

use crate::config::AdminConfig;
use crate::game::{blueprint_info_card, format_uptime, GameEngine, GameError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShipCommand {
    /// `ship` on its own: the boarded ship.
    Show,
    List,
    Name(String),
    Board(String),
    /// `ship buy` without a model lists the catalog.
    Buy(Option<String>),
    Sell(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Help,
    CreateCharacter(String),
    DeleteCharacter,
    Progress,
    Ship(ShipCommand),
    Scoreboard,
    Uptime,
    Admins,
    /// Read (`None`) or set the checkpoint period in ticks.
    CheckpointPeriod(Option<u32>),
    Shutdown,
    /// Recognized verb with bad arguments; carries the usage hint.
    Invalid(String),
    Unknown(String),
}

pub struct CommandParser {
    prefix: String,
}

impl CommandParser {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `None` when the line does not start with the prefix.
    pub fn parse(&self, raw: &str) -> Option<BotCommand> {
        let trimmed = raw.trim();
        let body = trimmed.strip_prefix(self.prefix.as_str())?.trim();
        let (verb, rest) = match body.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (body, ""),
        };
        let command = match verb.to_ascii_lowercase().as_str() {
            "help" | "?" => BotCommand::Help,
            "create_character" | "create" => {
                if rest.is_empty() {
                    BotCommand::Invalid(format!("Usage: {}create_character <name>", self.prefix))
                } else {
                    BotCommand::CreateCharacter(rest.to_string())
                }
            }
            "delete_character" | "delete" => BotCommand::DeleteCharacter,
            "progress" | "sheet" => BotCommand::Progress,
            "ship" => self.parse_ship(rest),
            "scoreboard" => BotCommand::Scoreboard,
            "uptime" => BotCommand::Uptime,
            "admins" => BotCommand::Admins,
            "db_commit_wait" | "checkpoint" => {
                if rest.is_empty() {
                    BotCommand::CheckpointPeriod(None)
                } else {
                    match rest.parse::<u32>() {
                        Ok(n) => BotCommand::CheckpointPeriod(Some(n)),
                        Err(_) => BotCommand::Invalid(format!(
                            "Usage: {}db_commit_wait [ticks]",
                            self.prefix
                        )),
                    }
                }
            }
            "shutdown" => BotCommand::Shutdown,
            other => BotCommand::Unknown(other.to_string()),
        };
        trace!("Parsed {:?} from '{}'", command, raw);
        Some(command)
    }

    fn parse_ship(&self, rest: &str) -> BotCommand {
        let (sub, arg) = match rest.split_once(char::is_whitespace) {
            Some((sub, arg)) => (sub, arg.trim()),
            None => (rest, ""),
        };
        let needs_arg = |usage: &str, make: fn(String) -> ShipCommand| {
            if arg.is_empty() {
                BotCommand::Invalid(format!("Usage: {}ship {}", self.prefix, usage))
            } else {
                BotCommand::Ship(make(arg.to_string()))
            }
        };
        match sub.to_ascii_lowercase().as_str() {
            "" => BotCommand::Ship(ShipCommand::Show),
            "list" => BotCommand::Ship(ShipCommand::List),
            "name" | "rename" => needs_arg("name <new name>", ShipCommand::Name),
            "board" => needs_arg("board <ship name>", ShipCommand::Board),
            "sell" => needs_arg("sell <ship name>", ShipCommand::Sell),
            "buy" => BotCommand::Ship(ShipCommand::Buy(
                (!arg.is_empty()).then(|| arg.to_string()),
            )),
            _ => BotCommand::Invalid(format!(
                "Usage: {}ship [list|name|board|buy|sell]",
                self.prefix
            )),
        }
    }
}

/// What the server should do after a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    pub reply: String,
    /// New checkpoint period to persist in the config file.
    pub checkpoint_changed: Option<u32>,
    pub shutdown: bool,
}

impl CommandOutcome {
    fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: text.into(),
            ..Self::default()
        }
    }
}

pub struct CommandProcessor {
    prefix: String,
    admins: Vec<AdminConfig>,
}

const NO_CHARACTER: &str = "Create a character first.";
const NOT_ALLOWED: &str = "Only admins can do that.";

impl CommandProcessor {
    pub fn new(prefix: &str, admins: Vec<AdminConfig>) -> Self {
        Self {
            prefix: prefix.to_string(),
            admins,
        }
    }

    pub fn is_admin(&self, author_id: &str) -> bool {
        self.admins.iter().any(|a| a.id == author_id)
    }

    pub fn process(&self, engine: &mut GameEngine, author_id: &str, command: BotCommand) -> CommandOutcome {
        let needs_character = matches!(
            command,
            BotCommand::DeleteCharacter | BotCommand::Progress | BotCommand::Ship(_)
        );
        if needs_character && engine.character(author_id).is_none() {
            return CommandOutcome::reply(NO_CHARACTER);
        }
        let admin_only = matches!(command, BotCommand::CheckpointPeriod(_) | BotCommand::Shutdown);
        if admin_only && !self.is_admin(author_id) {
            return CommandOutcome::reply(NOT_ALLOWED);
        }

        match command {
            BotCommand::Help => CommandOutcome::reply(self.help_text()),
            BotCommand::CreateCharacter(name) => match engine.create_character(author_id, &name) {
                Ok(c) => CommandOutcome::reply(format!(
                    "Welcome, {}! You start with {} credits. Your first mission begins shortly.",
                    c.name, c.credits
                )),
                Err(e) => CommandOutcome::reply(user_message(&e)),
            },
            BotCommand::DeleteCharacter => match engine.delete_character(author_id) {
                Ok(c) => CommandOutcome::reply(format!("{} is no more.", c.name)),
                Err(e) => CommandOutcome::reply(user_message(&e)),
            },
            BotCommand::Progress => CommandOutcome::reply(
                engine
                    .character_sheet(author_id)
                    .unwrap_or_else(|e| user_message(&e)),
            ),
            BotCommand::Ship(sub) => CommandOutcome::reply(self.ship(engine, author_id, sub)),
            BotCommand::Scoreboard => CommandOutcome::reply(engine.scoreboard()),
            BotCommand::Uptime => {
                CommandOutcome::reply(format!("Uptime: {}", format_uptime(engine.uptime())))
            }
            BotCommand::Admins => {
                if self.admins.is_empty() {
                    CommandOutcome::reply("No admins are configured.")
                } else {
                    let names: Vec<&str> = self.admins.iter().map(|a| a.name.as_str()).collect();
                    CommandOutcome::reply(format!("Admins: {}", names.join(", ")))
                }
            }
            BotCommand::CheckpointPeriod(None) => CommandOutcome::reply(format!(
                "Characters are saved every {} ticks.",
                engine.checkpoint_every()
            )),
            BotCommand::CheckpointPeriod(Some(ticks)) => {
                if ticks == 0 {
                    return CommandOutcome::reply("The checkpoint period must be at least 1 tick.");
                }
                engine.set_checkpoint_every(ticks);
                CommandOutcome {
                    reply: format!("Characters will now be saved every {} ticks.", ticks),
                    checkpoint_changed: Some(ticks),
                    shutdown: false,
                }
            }
            BotCommand::Shutdown => CommandOutcome {
                reply: "Saving and shutting down.".to_string(),
                checkpoint_changed: None,
                shutdown: true,
            },
            BotCommand::Invalid(usage) => CommandOutcome::reply(usage),
            BotCommand::Unknown(verb) => CommandOutcome::reply(format!(
                "Unknown command '{}'. Try {}help.",
                verb, self.prefix
            )),
        }
    }

    fn ship(&self, engine: &mut GameEngine, author_id: &str, command: ShipCommand) -> String {
        let result = match command {
            ShipCommand::Show => engine.current_ship(author_id).map(|ship| match ship {
                Some(ship) => {
                    let bp = engine.hangar().find_blueprint(&ship.blueprint);
                    ship.info_card(bp)
                }
                None => format!(
                    "You are not aboard a ship. Try {}ship list or {}ship buy.",
                    self.prefix, self.prefix
                ),
            }),
            ShipCommand::List => engine.ships(author_id).map(|ships| {
                if ships.is_empty() {
                    return "You do not own any ships.".to_string();
                }
                let current = engine.character(author_id).and_then(|c| c.current_ship);
                let mut lines = vec!["Your ships:".to_string()];
                for ship in ships {
                    let marker = if Some(ship.id) == current { "*" } else { " " };
                    lines.push(format!(
                        "{} {} ({}, {})",
                        marker,
                        ship.name,
                        ship.blueprint,
                        ship.flight_status.label()
                    ));
                }
                lines.join("\n")
            }),
            ShipCommand::Name(name) => engine
                .rename_current_ship(author_id, &name)
                .map(|ship| format!("Your ship is now called '{}'.", ship.name)),
            ShipCommand::Board(name) => engine
                .board_ship(author_id, &name)
                .map(|ship| format!("You board '{}'.", ship.name)),
            ShipCommand::Buy(None) => Ok(engine.hangar().listing()),
            ShipCommand::Buy(Some(model)) => engine.buy_ship(author_id, &model).map(|ship| {
                let cost = engine
                    .hangar()
                    .find_blueprint(&ship.blueprint)
                    .map(|bp| bp.cost)
                    .unwrap_or(0);
                let credits = engine.character(author_id).map(|c| c.credits).unwrap_or(0);
                let card = engine
                    .hangar()
                    .find_blueprint(&ship.blueprint)
                    .map(blueprint_info_card)
                    .unwrap_or_default();
                format!(
                    "You bought a {} named '{}' for {} credits. {} credits remain.\n{}",
                    ship.blueprint, ship.name, cost, credits, card
                )
            }),
            ShipCommand::Sell(name) => engine
                .sell_ship(author_id, &name)
                .map(|sale| format!("You sold '{}' for {} credits.", sale.ship.name, sale.refund)),
        };
        result.unwrap_or_else(|e| user_message(&e))
    }

    pub fn help_text(&self) -> String {
        let p = &self.prefix;
        [
            "Commands:".to_string(),
            format!("  {p}create_character <name>   start playing"),
            format!("  {p}delete_character          retire your character"),
            format!("  {p}progress                  character sheet"),
            format!("  {p}ship [list|name|board|buy|sell] ..."),
            format!("  {p}scoreboard                everyone by XP"),
            format!("  {p}uptime                    how long the world has run"),
            format!("  {p}admins                    who runs this bot"),
            format!("  {p}db_commit_wait [n]        show or set the save period (admin)"),
            format!("  {p}shutdown                  save and stop (admin)"),
        ]
        .join("\n")
    }
}

/// Plain-text rendering of a failed command.
pub fn user_message(err: &GameError) -> String {
    match err {
        GameError::InsufficientFunds { cost, balance } => format!(
            "You cannot afford that: it costs {} credits and you have {}. You need {} more.",
            cost,
            balance,
            cost.saturating_sub(*balance)
        ),
        GameError::NotFound(what) => format!("Not found: {}.", what),
        GameError::AlreadyExists(what) => format!("Sorry, {}.", what),
        GameError::InvalidName(why) => format!("That name will not do: {}.", why),
        other => {
            error!("Command failed: {}", other);
            "Something went wrong; please try again later.".to_string()
        }
    }
}
