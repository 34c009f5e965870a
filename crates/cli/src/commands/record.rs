//! Headless quote recorder.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use spread_watch_core::{
    load_watchlist, lookup_quotes, unique_symbols, AppConfig, MarketDataSource, Position,
    QuoteRecorder,
};
use spread_watch_tastytrade::{TastytradeError, TastytradeQuotes};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Arguments for the record command.
#[derive(Args, Debug)]
pub struct RecordArgs {
    /// Watchlist CSV (defaults to the configured path)
    #[arg(short, long)]
    pub watchlist: Option<PathBuf>,

    /// Seconds between snapshots
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Directory for the daily CSV files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// Looks up quotes once and appends a snapshot.
async fn record_tick(
    source: &dyn MarketDataSource,
    recorder: &QuoteRecorder,
    positions: &[Position],
    symbols: &[String],
) -> Result<()> {
    let book = lookup_quotes(source, symbols).await?;
    let summary = recorder.record(Utc::now(), positions, &book)?;
    info!(
        strategies = summary.strategies,
        positions = summary.positions,
        priced = book.len(),
        "Recorded snapshot"
    );
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, stopping recorder"),
        _ = sigint.recv() => info!("Received SIGINT (Ctrl+C), stopping recorder"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    info!("Received Ctrl+C, stopping recorder");
    Ok(())
}

/// Records snapshots on a fixed interval until SIGINT or SIGTERM.
///
/// # Errors
/// Returns error if the watchlist cannot be loaded, login fails, or the
/// signal handlers cannot be installed. Failed ticks are logged and skipped.
pub async fn run_record(args: RecordArgs, config: &AppConfig) -> Result<()> {
    let watchlist = args.watchlist.unwrap_or_else(|| config.watchlist.path.clone());
    let period = Duration::from_secs(args.interval.unwrap_or(config.recorder.interval_secs));

    let mut recorder = QuoteRecorder::new(&config.recorder);
    if let Some(dir) = args.output_dir {
        recorder = recorder.with_output_dir(dir);
    }

    let positions = load_watchlist(&watchlist)
        .with_context(|| format!("Failed to load watchlist: {}", watchlist.display()))?;
    let symbols = unique_symbols(&positions);
    info!(
        path = %watchlist.display(),
        positions = positions.len(),
        symbols = symbols.len(),
        interval_secs = period.as_secs(),
        "Starting quote recorder"
    );

    let (client, session) = super::connect(&config.tastytrade).await?;
    let source = TastytradeQuotes::new(client, session);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result?;
                break;
            }
            _ = ticker.tick() => {
                if let Err(e) = record_tick(&source, &recorder, &positions, &symbols).await {
                    let transient = e
                        .downcast_ref::<TastytradeError>()
                        .is_some_and(TastytradeError::is_transient);
                    error!(error = %e, transient, "Snapshot failed, retrying next tick");
                }
            }
        }
    }

    info!("Quote recorder stopped");
    Ok(())
}
