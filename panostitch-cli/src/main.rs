//! Panostitch CLI - download and assemble panoramic tile imagery.

mod commands;
mod error;
mod progress;

use clap::{Parser, Subcommand};
use commands::assemble::Dimensions;
use error::CliError;
use panostitch::config::{load_settings_or_default, Settings};
use panostitch::logging::{default_log_dir, default_log_file, init_logging};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Parser)]
#[command(name = "panostitch")]
#[command(about = "Download and assemble panoramic tile imagery", long_about = None)]
#[command(version = panostitch::VERSION)]
struct Cli {
    /// Path to the INI configuration file
    #[arg(long, default_value = "panostitch.ini", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve, fetch, and assemble one or more panoramas
    Process {
        /// Panorama identifiers
        #[arg(required_unless_present = "queue")]
        identifiers: Vec<String>,

        /// Drain the work queue instead of taking identifiers
        #[arg(long, conflicts_with = "identifiers")]
        queue: bool,
    },

    /// Download a panorama's tiles into the cache without assembling
    Fetch {
        /// Panorama identifier
        identifier: String,
    },

    /// Assemble a composite from cached tiles, without network access
    Assemble {
        /// Panorama identifier
        identifier: String,

        /// Full panorama width in pixels (with --height and --tile-size)
        #[arg(long, requires = "height", requires = "tile_size")]
        width: Option<u32>,

        /// Full panorama height in pixels
        #[arg(long, requires = "width")]
        height: Option<u32>,

        /// Tile size in pixels
        #[arg(long, requires = "width")]
        tile_size: Option<u32>,
    },

    /// Manage the work queue
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
}

#[derive(Subcommand)]
enum QueueCommands {
    /// Add identifiers to the queue
    Add {
        /// Panorama identifiers
        #[arg(required = true)]
        identifiers: Vec<String>,
    },
    /// Show the queue contents
    List,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _logging_guard = match init_logging(default_log_dir(), default_log_file()) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e.to_string()).exit(),
    };

    let settings = match load_settings_or_default(&cli.config) {
        Ok(settings) => settings,
        Err(e) => CliError::from(e).exit(),
    };
    debug!(config = %cli.config.display(), "Settings loaded");

    if let Err(e) = dispatch(cli.command, &settings).await {
        e.exit();
    }
}

async fn dispatch(command: Commands, settings: &Settings) -> Result<(), CliError> {
    match command {
        Commands::Process { identifiers, queue } => {
            let cancel = cancel_on_ctrl_c();
            commands::process::run(settings, identifiers, queue, cancel).await
        }
        Commands::Fetch { identifier } => {
            let cancel = cancel_on_ctrl_c();
            commands::fetch::run(settings, &identifier, cancel).await
        }
        Commands::Assemble {
            identifier,
            width,
            height,
            tile_size,
        } => {
            let dimensions = match (width, height, tile_size) {
                (Some(width), Some(height), Some(tile_size)) => Some(Dimensions {
                    width,
                    height,
                    tile_size,
                }),
                (None, None, None) => None,
                _ => {
                    return Err(CliError::InvalidArgument(
                        "--width, --height, and --tile-size must be given together".to_string(),
                    ))
                }
            };
            commands::assemble::run(settings, &identifier, dimensions).await
        }
        Commands::Queue { command } => match command {
            QueueCommands::Add { identifiers } => commands::queue::add(settings, &identifiers),
            QueueCommands::List => commands::queue::list(settings),
        },
    }
}

/// Cancellation token wired to Ctrl-C.
///
/// The first Ctrl-C cancels in-flight work; accepted results are still
/// assembled before exit.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted: finishing accepted tiles, then assembling...");
            token.cancel();
        }
    });
    cancel
}
