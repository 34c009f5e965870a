//! Live strategy dashboard.
//!
//! Loads the watchlist, logs in, then redraws the strategy and position
//! tables every second and refreshes quotes on the configured interval
//! until Ctrl+C.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Args;
use ratatui::{backend::CrosstermBackend, Terminal};
use spread_watch_core::{
    compute_strategy_metrics, load_watchlist, lookup_quotes, position_details, unique_symbols,
    AppConfig, MarketDataSource, Position, PriceHistory,
};
use spread_watch_tastytrade::TastytradeQuotes;
use tracing::info;

use crate::dashboard::{self, DashboardState, DisplayMode};

/// Arguments for the watch command.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Show only the per-position detail table.
    #[arg(long)]
    pub details: bool,

    /// Show only the per-strategy summary table.
    #[arg(long)]
    pub strategies: bool,

    /// Watchlist CSV (defaults to the configured path).
    #[arg(short, long)]
    pub watchlist: Option<PathBuf>,

    /// Quote refresh interval in seconds (1-60).
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..=60))]
    pub interval: Option<u64>,
}

/// Redraw cadence for the clock and "last update" counter.
const REDRAW_INTERVAL: Duration = Duration::from_secs(1);

/// Per-session dashboard state carried across ticks.
struct Monitor {
    positions: Vec<Position>,
    symbols: Vec<String>,
    history: PriceHistory,
    state: DashboardState,
}

impl Monitor {
    fn new(source: String, positions: Vec<Position>) -> Self {
        let symbols = unique_symbols(&positions);
        Self {
            positions,
            symbols,
            history: PriceHistory::new(),
            state: DashboardState {
                source,
                ..DashboardState::default()
            },
        }
    }

    async fn refresh(&mut self, source: &dyn MarketDataSource) -> Result<()> {
        let book = lookup_quotes(source, &self.symbols).await?;

        self.state.metrics = compute_strategy_metrics(&self.positions, &book);
        self.state.details = position_details(&self.positions, &book, &self.history);
        self.state.last_update = Some(Local::now());
        self.history.record(&self.symbols, &book);
        Ok(())
    }
}

/// Runs the dashboard until interrupted.
///
/// # Errors
/// Returns error if the watchlist cannot be loaded, login fails, or a quote
/// request fails as a whole.
pub async fn run_watch(args: WatchArgs, config: &AppConfig) -> Result<()> {
    let watchlist = args.watchlist.unwrap_or_else(|| config.watchlist.path.clone());
    let interval = Duration::from_secs(args.interval.unwrap_or(config.refresh.interval_secs));
    let mode = DisplayMode::from_flags(args.strategies, args.details);

    let positions = load_watchlist(&watchlist)
        .with_context(|| format!("Failed to load watchlist: {}", watchlist.display()))?;
    info!(
        path = %watchlist.display(),
        positions = positions.len(),
        "Loaded watchlist"
    );

    let (client, session) = super::connect(&config.tastytrade).await?;
    let source = TastytradeQuotes::new(client, session);
    let mut monitor = Monitor::new(watchlist.display().to_string(), positions);

    // Inline redraws on the main screen so the last frame stays visible on exit
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let result = run_loop(
        &mut terminal,
        &mut monitor,
        &source,
        mode,
        interval,
        tokio::signal::ctrl_c(),
    )
    .await;

    terminal.show_cursor()?;
    println!();
    result
}

/// Draws and refreshes until `shutdown` resolves.
///
/// `shutdown` is created once and stays polled during refreshes too.
async fn run_loop<B, S>(
    terminal: &mut Terminal<B>,
    monitor: &mut Monitor,
    source: &dyn MarketDataSource,
    mode: DisplayMode,
    interval: Duration,
    shutdown: S,
) -> Result<()>
where
    B: ratatui::backend::Backend,
    S: Future<Output = io::Result<()>>,
{
    tokio::pin!(shutdown);
    let mut last_refresh: Option<Instant> = None;

    loop {
        if last_refresh.map_or(true, |at| at.elapsed() >= interval) {
            tokio::select! {
                result = &mut shutdown => return stopped(result),
                refreshed = monitor.refresh(source) => refreshed?,
            }
            last_refresh = Some(Instant::now());
        }

        terminal.draw(|f| dashboard::draw(f, &monitor.state, mode, Local::now()))?;

        tokio::select! {
            result = &mut shutdown => return stopped(result),
            () = tokio::time::sleep(REDRAW_INTERVAL) => {}
        }
    }
}

fn stopped(signal: io::Result<()>) -> Result<()> {
    signal.context("Failed to listen for Ctrl+C")?;
    info!("Received Ctrl+C, stopping dashboard");
    Ok(())
}
