//! raindrop-sync command line.
//!
//! Inspects what the next sync pass would do: which favourites are new, what
//! the tracking store holds and whether the access token still works.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, info_span};
use uuid::Uuid;

use raindrop_sync::logging;
use raindrop_sync::managers::tracking_store::{TrackingStore, TrackingStoreTrait};
use raindrop_sync::services::config_engine::{ConfigEngine, ConfigEngineTrait};
use raindrop_sync::services::raindrop_client::{Fetcher, RaindropClient};
use raindrop_sync::services::raindrop_processor::RaindropProcessor;
use raindrop_sync::types::config::SyncConfig;

const EXIT_STALE_TOKEN: u8 = 2;

/// Sync favourited Raindrop.io bookmarks into tasks, exactly once.
#[derive(Parser)]
#[command(name = "raindrop-sync", version, about)]
struct Cli {
    /// Path to the JSON config file.
    #[arg(short, long, global = true, env = "RAINDROP_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the collection and list favourites not yet tracked.
    Pending,
    /// Show the current snapshot and how many raindrops it tracks.
    Status,
    /// Check the API; exits with status 2 if the access token is stale.
    CheckToken,
    /// Show or edit the config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Set a value by dotted key, e.g. `api.page_size 25`.
    Set {
        key: String,
        /// JSON value; bare words are taken as strings.
        value: String,
    },
    /// Restore defaults.
    Reset,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Pending => "pending",
            Command::Status => "status",
            Command::CheckToken => "check-token",
            Command::Config { .. } => "config",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut engine = ConfigEngine::new(cli.config.clone());
    let config = match engine.load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "raindrop-sync: {} ({})",
                e,
                engine.get_config_path().display()
            );
            return ExitCode::FAILURE;
        }
    };

    let _guard = logging::init(config.logging.log_dir.as_deref(), cli.verbose);
    let span = info_span!("run", run_id = %Uuid::new_v4());
    let _entered = span.enter();

    let started = Instant::now();
    info!(command = cli.command.name(), "Run started");

    let result = dispatch(cli.command, &mut engine, &config);
    let elapsed_secs = started.elapsed().as_secs_f64();

    match result {
        Ok(code) => {
            info!(elapsed_secs, "Run completed");
            code
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), elapsed_secs, "Run terminated");
            eprintln!("raindrop-sync: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(command: Command, engine: &mut ConfigEngine, config: &SyncConfig) -> Result<ExitCode> {
    match command {
        Command::Pending => pending(config),
        Command::Status => status(config),
        Command::CheckToken => check_token(config),
        Command::Config { action } => manage_config(engine, action),
    }
}

fn pending(config: &SyncConfig) -> Result<ExitCode> {
    let client = RaindropClient::from_config(config).context("Failed to build HTTP client")?;
    if client.token_is_stale()? {
        bail!("Access token is stale; refresh it before syncing");
    }

    let store = TrackingStore::new(&config.store);
    let all = client.fetch_all()?;
    let new_items = RaindropProcessor::new(&store).extract_new_favourites(&all)?;

    if new_items.is_empty() {
        println!("No new favourites.");
    }
    for item in &new_items {
        println!("{}\t{}\t{}", item.id, item.title, item.link);
    }
    Ok(ExitCode::SUCCESS)
}

fn status(config: &SyncConfig) -> Result<ExitCode> {
    let store = TrackingStore::new(&config.store);
    let path = store.current_snapshot_path()?;
    let snapshot = store.latest_snapshot()?;
    println!("snapshot: {}", path.display());
    println!("tracked:  {}", snapshot.len());
    Ok(ExitCode::SUCCESS)
}

fn check_token(config: &SyncConfig) -> Result<ExitCode> {
    let client = RaindropClient::from_config(config).context("Failed to build HTTP client")?;
    if client.token_is_stale()? {
        println!("Access token is stale.");
        return Ok(ExitCode::from(EXIT_STALE_TOKEN));
    }
    println!("Access token is valid.");
    Ok(ExitCode::SUCCESS)
}

fn manage_config(engine: &mut ConfigEngine, action: ConfigAction) -> Result<ExitCode> {
    match action {
        ConfigAction::Show => {
            println!("# {}", engine.get_config_path().display());
            println!("{}", serde_json::to_string_pretty(engine.get_config())?);
        }
        ConfigAction::Set { key, value } => {
            let value = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
            engine.set_value(&key, value)?;
            println!("Updated {}", key);
        }
        ConfigAction::Reset => {
            engine.reset()?;
            println!("Config reset to defaults.");
        }
    }
    Ok(ExitCode::SUCCESS)
}
