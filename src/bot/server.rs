//! The bot's event loop.
//!
//! [`BotServer::run`] owns the [`GameEngine`] and multiplexes, on a single
//! task, the tick interval, inbound chat events, a shutdown signal and
//! Ctrl-C. Commands and ticks never interleave mid-step, so the engine
//! needs no lock. On the way out the server writes a final checkpoint and
//! flushes whatever notifications are still queued.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, info, trace, warn};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::bot::commands::{CommandParser, CommandProcessor};
use crate::bot::transport::{format_reply, ChatEvent, ConsoleReader, ConsoleWriter, OutgoingMessage};
use crate::config::Config;
use crate::game::{sync_catalog, GameEngine, GameStore};
use crate::logutil::escape_log;

pub struct BotServer {
    config: Config,
    /// Where admin changes to the config are written back.
    config_path: Option<String>,
    engine: GameEngine,
    parser: CommandParser,
    processor: CommandProcessor,
    inbound_rx: Option<mpsc::UnboundedReceiver<ChatEvent>>,
    outbound_tx: Option<mpsc::UnboundedSender<OutgoingMessage>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl BotServer {
    /// Open the store, reconcile the catalog and load every character.
    pub async fn new(config: Config) -> Result<Self> {
        let db_path = config.storage.resolved_db_path();
        let store = GameStore::open(&db_path)
            .with_context(|| format!("opening game store at {}", db_path.display()))?;
        let catalog = sync_catalog(&store, &config.game.catalog_paths())
            .context("loading catalog")?;
        let engine = GameEngine::new(store, catalog, config.game.engine_settings())?;
        Ok(Self::with_engine(config, engine))
    }

    /// Wrap an already-built engine.
    pub fn with_engine(config: Config, engine: GameEngine) -> Self {
        let parser = CommandParser::new(&config.bot.command_prefix);
        let processor = CommandProcessor::new(&config.bot.command_prefix, config.bot.admins.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            config,
            config_path: None,
            engine,
            parser,
            processor,
            inbound_rx: None,
            outbound_tx: None,
            shutdown_tx,
            shutdown_rx,
        }
    }

    pub fn set_config_path(&mut self, path: &str) {
        self.config_path = Some(path.to_string());
    }

    /// Attach a transport. Returns the sender for inbound events and the
    /// receiver for outgoing messages.
    pub fn connect(&mut self) -> (mpsc::UnboundedSender<ChatEvent>, mpsc::UnboundedReceiver<OutgoingMessage>) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        self.inbound_rx = Some(in_rx);
        self.outbound_tx = Some(out_tx);
        (in_tx, out_rx)
    }

    /// Attach the stdin/stdout transport and spawn its tasks.
    pub fn connect_console(&mut self) {
        let (in_tx, out_rx) = self.connect();
        let reader = ConsoleReader::new(in_tx);
        let writer = ConsoleWriter::new(out_rx);
        tokio::spawn(async move {
            if let Err(e) = reader.run().await {
                error!("Console reader failed: {}", e);
            }
        });
        tokio::spawn(async move {
            if let Err(e) = writer.run().await {
                error!("Console writer failed: {}", e);
            }
        });
        info!("Console transport attached");
    }

    /// Send `true` on this to stop [`run`](Self::run).
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown_tx.clone()
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn show_status(&self) {
        println!("{} status", self.config.bot.name);
        println!("  characters:        {}", self.engine.character_count());
        println!("  missions:          {}", self.engine.missions().len());
        println!("  ship models:       {}", self.engine.hangar().blueprints().len());
        println!("  weapons:           {}", self.engine.weapons().len());
        println!("  tick period:       {} ms", self.engine.tick_period().as_millis());
        println!("  checkpoint every:  {} ticks", self.engine.checkpoint_every());
    }

    pub async fn run(&mut self) -> Result<()> {
        info!(
            "{} started: {} characters, command prefix '{}'",
            self.config.bot.name,
            self.engine.character_count(),
            self.parser.prefix()
        );
        let mut ticker = tokio::time::interval(self.engine.tick_period().max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; a period should pass first.
        ticker.tick().await;

        let mut shutdown_rx = self.shutdown_rx.clone();
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.engine.tick() {
                        Ok(report) => trace!("{:?}", report),
                        Err(e) => error!("Tick {} failed: {}", self.engine.ticks(), e),
                    }
                    self.flush_outbox();
                }

                event = async {
                    if let Some(ref mut rx) = self.inbound_rx {
                        rx.recv().await
                    } else {
                        std::future::pending().await
                    }
                } => {
                    match event {
                        Some(event) => {
                            if self.handle_event(event).await {
                                info!("Shutdown requested by admin");
                                break;
                            }
                        }
                        None => {
                            debug!("Inbound channel closed");
                            self.inbound_rx = None;
                        }
                    }
                }

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Shutdown signal received");
                        break;
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl-C");
                    break;
                }
            }
        }

        self.engine.shutdown().context("final checkpoint")?;
        self.flush_outbox();
        info!("Final checkpoint written after {} ticks", self.engine.ticks());
        Ok(())
    }

    /// Returns true when the command asked the server to stop.
    async fn handle_event(&mut self, event: ChatEvent) -> bool {
        let Some(command) = self.parser.parse(&event.content) else {
            return false;
        };
        debug!(
            "Command from {} ({}): {}",
            event.author_name,
            event.author_id,
            escape_log(&event.content)
        );
        let outcome = self.processor.process(&mut self.engine, &event.author_id, command);
        self.send(OutgoingMessage::direct(&event.author_id, outcome.reply));

        if let Some(ticks) = outcome.checkpoint_changed {
            self.config.game.checkpoint_ticks = ticks;
            if let Some(path) = &self.config_path {
                if let Err(e) = self.config.save(path).await {
                    warn!("Could not save checkpoint period to {}: {}", path, e);
                }
            }
        }
        outcome.shutdown
    }

    fn flush_outbox(&mut self) {
        for msg in self.engine.drain_outbox() {
            self.send(msg);
        }
    }

    fn send(&mut self, msg: OutgoingMessage) {
        let Some(tx) = &self.outbound_tx else {
            trace!("No transport attached; dropping message to {:?}", msg.to);
            return;
        };
        let msg = OutgoingMessage {
            content: format_reply(&msg.content, self.config.bot.code_blocks),
            ..msg
        };
        if tx.send(msg).is_err() {
            warn!("Transport closed; further messages will be dropped");
            self.outbound_tx = None;
        }
    }
}
