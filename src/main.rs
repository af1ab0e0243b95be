//! Binary entrypoint for the GrindBot CLI.
//!
//! Commands:
//! - `start` - run the bot on the console transport
//! - `init` - write a starter `config.toml` and the sample catalog
//! - `status` - print a short summary of the game state
//! - `check-catalog` - validate the catalog files without touching the database
//!
//! See the library crate docs for module-level details: `grindbot::`.
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use grindbot::bot::BotServer;
use grindbot::config::Config;
use grindbot::game::catalog::{
    flatten_missions, load_missions_from_json, load_ships_from_json, load_weapons_from_json,
    validate_mission_seeds,
};
use grindbot::game::MissionTree;

const SAMPLE_MISSIONS: &str = include_str!("../data/catalog/missions.json");
const SAMPLE_SHIPS: &str = include_str!("../data/catalog/ships.json");
const SAMPLE_WEAPONS: &str = include_str!("../data/catalog/weapons.json");

#[derive(Parser)]
#[command(name = "grindbot")]
#[command(about = "An idle space-trading game bot for chat channels")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Start,
    /// Write a default configuration and the sample catalog
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
    /// Show game status
    Status,
    /// Validate catalog files without opening the database
    CheckCatalog,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => {
            let config = Config::load(&cli.config).await?;
            init_logging(Some(&config), cli.verbose);
            info!("Starting GrindBot v{}", env!("CARGO_PKG_VERSION"));
            let mut server = BotServer::new(config).await?;
            server.set_config_path(&cli.config);
            server.connect_console();
            server.run().await?;
        }
        Commands::Init { force } => {
            init_logging(None, cli.verbose);
            if Path::new(&cli.config).exists() && !force {
                anyhow::bail!("{} already exists (use --force to overwrite)", cli.config);
            }
            let cfg = Config::default();
            cfg.save(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);

            tokio::fs::create_dir_all(&cfg.storage.data_dir)
                .await
                .with_context(|| format!("creating {}", cfg.storage.data_dir))?;
            for (path, contents) in [
                (&cfg.game.missions_file, SAMPLE_MISSIONS),
                (&cfg.game.ships_file, SAMPLE_SHIPS),
                (&cfg.game.weapons_file, SAMPLE_WEAPONS),
            ] {
                write_if_missing(path, contents).await?;
            }
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(Some(&config), cli.verbose);
            let server = BotServer::new(config).await?;
            server.show_status();
        }
        Commands::CheckCatalog => {
            let config = Config::load(&cli.config).await?;
            init_logging(Some(&config), cli.verbose);
            let paths = config.game.catalog_paths();
            let seeds = load_missions_from_json(&paths.missions)
                .with_context(|| format!("reading {}", paths.missions.display()))?;
            let count = validate_mission_seeds(&seeds)?;
            let tree = MissionTree::from_templates(flatten_missions(&seeds))?;
            println!(
                "missions: {} ({} root{})",
                count,
                tree.roots().len(),
                if tree.roots().len() == 1 { "" } else { "s" }
            );
            if paths.ships.exists() {
                println!("ships:    {}", load_ships_from_json(&paths.ships)?.len());
            } else {
                println!("ships:    {} not found", paths.ships.display());
            }
            if paths.weapons.exists() {
                println!("weapons:  {}", load_weapons_from_json(&paths.weapons)?.len());
            } else {
                println!("weapons:  {} not found", paths.weapons.display());
            }
        }
    }

    Ok(())
}

async fn write_if_missing(path: &str, contents: &str) -> Result<()> {
    let path = Path::new(path);
    if path.exists() {
        info!("Keeping existing {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote sample catalog {}", path.display());
    Ok(())
}

fn init_logging(config: Option<&Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .map(|c| c.logging.level_filter())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);
    // sled is chatty at debug
    builder.filter_module("sled", log::LevelFilter::Warn);

    let log_file = config
        .and_then(|c| c.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .ok()
        });

    match log_file {
        Some(f) => {
            let file = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Echo to the console only when someone is watching it
            let is_tty = atty::is(atty::Stream::Stdout);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = file.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if is_tty {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
