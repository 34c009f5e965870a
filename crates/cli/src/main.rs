use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use spread_watch_core::{AppConfig, ConfigLoader};

mod commands;
mod dashboard;
mod portfolio;

use commands::{PositionsArgs, RecordArgs, WatchArgs};

#[derive(Parser)]
#[command(name = "spread-watch")]
#[command(about = "Live strategy dashboard and portfolio exporter for tastytrade option spreads", long_about = None)]
struct Cli {
    /// Config file path (defaults to config/spread-watch.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log file path (logs to file instead of stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor watchlist strategies with a live refreshing dashboard
    Watch(WatchArgs),
    /// Show brokerage positions with streamer symbols, optionally export a watchlist
    Positions(PositionsArgs),
    /// Record strategy marks and position quotes to daily CSV files
    Record(RecordArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging is off for the dashboard unless a log file is given
    match (&cli.command, &cli.log_file) {
        (_, Some(path)) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        (Commands::Watch(_), None) => {}
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                )
                .with_writer(std::io::stderr)
                .init();
        }
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Watch(args) => commands::run_watch(args, &config).await?,
        Commands::Positions(args) => commands::run_positions(args, &config).await?,
        Commands::Record(args) => commands::run_record(args, &config).await?,
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}
