mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "notedir")]
#[command(about = "Turn calendar events into meeting notes and daily-note links in your vault")]
struct Cli {
    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create and update meeting notes, then link them from the daily note
    Sync {
        /// Vault root directory
        #[arg(long)]
        vault: PathBuf,

        /// Calendar events as JSON ({"events": [...]} or a bare array)
        #[arg(long)]
        events: PathBuf,

        /// Daily note to update (YYYY-MM-DD, "today", "tomorrow", ...)
        #[arg(long)]
        date: Option<String>,

        /// Show what would change without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Only process the first N events
        #[arg(long)]
        limit: Option<usize>,

        /// JSON object mapping event id to "skip", "link" or "full"
        #[arg(long)]
        decisions: Option<PathBuf>,

        /// Ask for a tier for every event that was classified by a judgment rule
        #[arg(short, long)]
        interactive: bool,
    },
    /// Print the tier and reason for each event without touching the vault
    Classify {
        /// Vault root directory
        #[arg(long)]
        vault: PathBuf,

        /// Calendar events as JSON
        #[arg(long)]
        events: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Sync {
            vault,
            events,
            date,
            dry_run,
            limit,
            decisions,
            interactive,
        } => {
            let args = commands::sync::SyncArgs {
                vault,
                events,
                date,
                dry_run,
                limit,
                decisions,
                interactive,
            };
            commands::sync::run(args, cli.verbose).await
        }
        Commands::Classify { vault, events } => commands::classify::run(&vault, &events),
    }
}

/// Logs go to stderr so the summary on stdout stays clean.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
