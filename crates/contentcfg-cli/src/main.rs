//! Content Configuration CLI
//!
//! Thin wrapper around contentcfg-core functions for command-line usage.
//!
//! ## Usage
//!
//! ```bash
//! # Canonicalize a payload without touching any state
//! contentcfg normalize popups --file popups.json
//!
//! # Show the cached configuration of a kind
//! contentcfg show banners
//!
//! # What a mobile viewer sees at a given instant
//! contentcfg active banners --device mobile --at 2024-05-01T09:00:00Z
//!
//! # Pull every kind from the remote
//! contentcfg pull
//!
//! # Save a new configuration
//! contentcfg push slots --file slots.json
//!
//! # Dismiss a popup for three days
//! contentcfg --user u-42 dismiss spring-event --days 3
//!
//! # Order a tag strip
//! contentcfg tags action romance comedy
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use contentcfg_core::sanitize::{is_default_config, normalize, normalize_str};
use contentcfg_core::showcase;
use contentcfg_core::{
    CanonicalConfig, ConfigKind, ContentEngine, Device, Dismissal, EngineConfig, FsRemote,
    LoadOutcome, SaveOutcome, Timestamp,
};

/// Content Configuration - banners, popups, slots and tag ordering
#[derive(Parser)]
#[command(name = "contentcfg")]
#[command(version = "0.1.0")]
#[command(about = "Content Configuration - banners, popups, slots and tag ordering")]
#[command(
    long_about = "Manage home-surface content configuration in a local cache reconciled against a shared remote directory."
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Data directory (default: ~/.contentcfg/data)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Remote directory holding one <kind>.json per kind (default: <data-dir>/remote)
    #[arg(short, long, global = true)]
    remote_dir: Option<PathBuf>,

    /// Engine configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// User scope for popup dismissals (overrides the config file)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical form of a payload (stdin when no file is given)
    Normalize {
        /// banners, popups, slots or tag_display
        kind: ConfigKind,

        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print the cached configuration of a kind
    Show { kind: ConfigKind },

    /// List what is shown at an instant
    Active {
        kind: ConfigKind,

        /// Milliseconds since the epoch or an RFC 3339 time (default: now)
        #[arg(long)]
        at: Option<String>,

        /// pc or mobile (default: unknown device)
        #[arg(long)]
        device: Option<Device>,
    },

    /// Reconcile the cache with the remote
    Pull {
        /// Only this kind (default: all)
        #[arg(short, long)]
        kind: Option<ConfigKind>,
    },

    /// Save a configuration to the remote and the cache
    Push {
        kind: ConfigKind,

        #[arg(short, long)]
        file: PathBuf,
    },

    /// Stop showing a popup
    Dismiss {
        popup_id: String,

        /// Days to suppress; 0 for this session only (default: the popup's own setting)
        #[arg(long)]
        days: Option<i64>,
    },

    /// Check whether a popup is dismissed
    Dismissed { popup_id: String },

    /// Order tag slugs by the configured tag display
    Tags {
        #[arg(required = true)]
        slugs: Vec<String>,
    },

    /// Show cache status for every kind
    Status,
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Get the default data directory (~/.contentcfg/data)
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".contentcfg")
        .join("data")
}

/// Parse milliseconds or an RFC 3339 time
fn parse_instant(s: &str) -> Result<Timestamp> {
    if let Ok(ms) = s.trim().parse::<i64>() {
        return Ok(ms);
    }
    chrono::DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.timestamp_millis())
        .map_err(|e| anyhow::anyhow!("Invalid time '{}': {}", s, e))
}

fn format_instant(ms: Timestamp) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ms.to_string())
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => std::io::read_to_string(std::io::stdin()).context("Failed to read stdin"),
    }
}

fn print_json(config: &CanonicalConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&config.to_value())?);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(user) = &cli.user {
        config.user_scope = user.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    // Pure transformation, no state involved.
    if let Commands::Normalize { kind, file } = &cli.command {
        let text = read_input(file.as_deref())?;
        let now = chrono::Utc::now().timestamp_millis();
        return print_json(&normalize_str(*kind, &text, now));
    }

    let config = load_config(&cli)?;
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let remote_dir = cli
        .remote_dir
        .clone()
        .unwrap_or_else(|| data_dir.join("remote"));
    let engine = ContentEngine::open(&data_dir, Arc::new(FsRemote::new(&remote_dir)), config)?;

    match cli.command {
        Commands::Normalize { .. } => {}

        Commands::Show { kind } => {
            print_json(&engine.current(kind))?;
        }

        Commands::Active { kind, at, device } => {
            let at = match at {
                Some(s) => parse_instant(&s)?,
                None => engine.now_ms(),
            };

            let rows: Vec<(String, String)> = match kind {
                ConfigKind::Banners => {
                    let banners = engine.banners();
                    showcase::visible_banners(&banners, at, device)
                        .into_iter()
                        .map(|b| (b.id.clone(), b.title.clone()))
                        .collect()
                }
                ConfigKind::Popups => {
                    let popups = engine.popup_config();
                    showcase::popups_to_show(&popups, engine.tracker(), at, device)
                        .into_iter()
                        .map(|p| (p.id.clone(), p.title.clone()))
                        .collect()
                }
                ConfigKind::Slots => {
                    let slots = engine.slots();
                    showcase::active_slots(&slots, at)
                        .into_iter()
                        .map(|s| (s.id.clone(), s.title.clone()))
                        .collect()
                }
                ConfigKind::TagDisplay => {
                    anyhow::bail!("tag_display has no activation window; use `tags` instead")
                }
            };

            if rows.is_empty() {
                println!("No active {} at {}.", kind, format_instant(at));
            } else {
                println!("Active {} at {} ({}):", kind, format_instant(at), rows.len());
                for (id, title) in rows {
                    println!("  {}  {}", id, title);
                }
            }
        }

        Commands::Pull { kind } => {
            let outcomes = match kind {
                Some(kind) => vec![(kind, engine.load(kind).await)],
                None => engine.load_all().await,
            };
            for (kind, outcome) in outcomes {
                match outcome {
                    LoadOutcome::Applied(_) => println!("{}: applied remote config", kind),
                    LoadOutcome::KeptLocal => {
                        println!("{}: remote is unconfigured, kept local edits", kind)
                    }
                    LoadOutcome::FetchFailed(e) => println!("{}: fetch failed ({})", kind, e),
                    LoadOutcome::CacheWriteFailed(e) => {
                        println!("{}: could not cache remote config ({})", kind, e)
                    }
                }
            }
        }

        Commands::Push { kind, file } => {
            let text = read_input(Some(&file))?;
            let raw: serde_json::Value = serde_json::from_str(&text)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;
            let draft = normalize(kind, &raw, engine.now_ms());

            let outcome = engine.save(&draft).await;
            match outcome {
                SaveOutcome::Invalid(_) | SaveOutcome::NotPersisted { .. } => {
                    anyhow::bail!("{}", outcome.describe())
                }
                _ => println!("{}", outcome.describe()),
            }
        }

        Commands::Dismiss { popup_id, days } => {
            let dismissal = match days {
                Some(days) => engine.tracker().dismiss(&popup_id, days)?,
                None => engine.dismiss_popup(&popup_id)?,
            };
            match dismissal {
                Dismissal::Session => println!("Dismissed {} for this session", popup_id),
                Dismissal::Until(at) => {
                    println!("Dismissed {} until {}", popup_id, format_instant(at))
                }
            }
        }

        Commands::Dismissed { popup_id } => {
            if engine.tracker().is_dismissed(&popup_id) {
                println!("{}: dismissed", popup_id);
            } else {
                println!("{}: not dismissed", popup_id);
            }
        }

        Commands::Tags { slugs } => {
            for slug in engine.ordered_tags(&slugs) {
                println!("{}", slug);
            }
        }

        Commands::Status => {
            println!("Content Configuration v0.1.0");
            println!();
            println!("Data directory: {}", data_dir.display());
            println!("Remote directory: {}", remote_dir.display());
            println!("User: {}", engine.config().user_scope);
            println!();
            println!("Cache:");
            for kind in ConfigKind::ALL {
                let status = match engine.cache().read(kind) {
                    Ok(Some(config)) if is_default_config(&config) => "default".to_string(),
                    Ok(Some(_)) => "custom".to_string(),
                    Ok(None) => "empty".to_string(),
                    Err(e) => format!("unreadable ({})", e),
                };
                println!("  {}: {}", kind, status);
            }
        }
    }

    Ok(())
}
