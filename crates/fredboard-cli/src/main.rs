//! fredboard - a terminal dashboard for FRED economic series.
//!
//! Tracks a list of series with display preferences, keeps the last
//! fetched observations on disk and prints charts-as-tables, summary
//! statistics and change tables.

mod commands;
mod fetcher;
mod format;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use fredboard_core::models::SeriesId;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{PreferenceArgs, Session, ShowArgs};

#[derive(Parser)]
#[command(name = "fredboard", author, version, about = "Track FRED economic series from the terminal")]
struct Cli {
    /// Also write logs to a daily log file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Directory holding saved_metrics.json (overrides the config file)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the FRED API key in the OS keychain
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    #[command(flatten)]
    Series(SeriesCommand),
}

/// Commands that work on the tracked series.
#[derive(Subcommand)]
enum SeriesCommand {
    /// List tracked series
    List {
        /// Only show series in this group ("" for ungrouped)
        #[arg(long)]
        group: Option<String>,
    },

    /// List group labels
    Groups,

    /// Start tracking a series
    Add {
        series: SeriesId,
        #[command(flatten)]
        preference: PreferenceArgs,
    },

    /// Stop tracking a series
    Remove { series: SeriesId },

    /// Change how a tracked series is drawn
    Set {
        series: SeriesId,
        #[command(flatten)]
        preference: PreferenceArgs,
    },

    /// Refetch one series, or every tracked series
    Refresh { series: Option<SeriesId> },

    /// Show observations and statistics for a series
    Show(ShowArgs),

    /// Latest value and changes for every tracked series
    Summary {
        /// Report absolute instead of percentage changes
        #[arg(long)]
        absolute: bool,

        /// Only include series in this group
        #[arg(long)]
        group: Option<String>,
    },

    /// Track the bundled starter catalog of industry series
    Seed,
}

impl SeriesCommand {
    /// Reading or editing saved preferences works without an API key.
    fn needs_network(&self) -> bool {
        !matches!(
            self,
            SeriesCommand::List { .. }
                | SeriesCommand::Groups
                | SeriesCommand::Remove { .. }
                | SeriesCommand::Set { .. }
        )
    }
}

#[derive(Subcommand)]
enum KeyAction {
    /// Store an API key (prompted when omitted)
    Set { key: Option<String> },
    /// Remove the stored API key
    Clear,
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // RUST_LOG controls the level (e.g., RUST_LOG=fredboard_core=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "fredboard.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_dir.as_deref());
    info!("fredboard starting");

    match cli.command {
        Command::Key { action } => match action {
            KeyAction::Set { key } => commands::key_set(key),
            KeyAction::Clear => commands::key_clear(),
        },
        Command::Series(command) => {
            let mut session = Session::open(cli.data_dir, command.needs_network())?;
            match command {
                SeriesCommand::List { group } => commands::list(&session, group.as_deref()),
                SeriesCommand::Groups => commands::groups(&session),
                SeriesCommand::Add { series, preference } => {
                    commands::add(&mut session, series, &preference).await
                }
                SeriesCommand::Remove { series } => commands::remove(&mut session, &series),
                SeriesCommand::Set { series, preference } => {
                    commands::set(&mut session, &series, &preference)
                }
                SeriesCommand::Refresh { series } => {
                    commands::refresh(&mut session, series.as_ref()).await
                }
                SeriesCommand::Show(args) => commands::show(&mut session, &args).await,
                SeriesCommand::Summary { absolute, group } => {
                    commands::summary(&mut session, absolute, group.as_deref()).await
                }
                SeriesCommand::Seed => commands::seed(&mut session).await,
            }
        }
    }
}
