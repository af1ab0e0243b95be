//! # GrindBot - an idle space-trading game for chat channels
//!
//! Players create a character, are handed timed missions that tick forward
//! once per second, earn experience for finishing them and spend credits on
//! ships. Missions form a forest: finishing one offers its branches, a leaf
//! sends the character back to the root set.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grindbot::bot::BotServer;
//! use grindbot::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let mut server = BotServer::new(config).await?;
//!     server.connect_console();
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - characters, missions, ships, storage and the tick engine
//! - [`bot`] - command parsing, transports and the server loop
//! - [`config`] - TOML configuration
//! - [`logutil`] - log-safe rendering of chat text
//!
//! ```text
//! ┌─────────────────┐
//! │   Bot Server    │ ← tick loop, commands, shutdown
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Game Engine   │ ← missions, rewards, hangar
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Game Store    │ ← sled trees
//! └─────────────────┘
//! ```

pub mod bot;
pub mod config;
pub mod game;
pub mod logutil;
