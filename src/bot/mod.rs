//! Chat surface: command parsing, transports and the server loop.

pub mod commands;
pub mod server;
pub mod transport;

pub use commands::{BotCommand, CommandOutcome, CommandParser, CommandProcessor, ShipCommand};
pub use server::BotServer;
pub use transport::{format_reply, parse_console_line, Channel, ChatEvent, OutgoingMessage};
