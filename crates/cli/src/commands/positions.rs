//! Brokerage positions table and watchlist export.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use spread_watch_core::{write_watchlist, AppConfig, Position};
use spread_watch_tastytrade::BrokeragePosition;
use tracing::{info, warn};

use crate::portfolio;

/// Arguments for the positions command.
#[derive(Args, Debug)]
pub struct PositionsArgs {
    /// Also write the positions as a watchlist CSV
    #[arg(long)]
    pub export_csv: bool,

    /// Export path (defaults to the configured export path)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Account number (defaults to the first account on the login)
    #[arg(short, long)]
    pub account: Option<String>,
}

/// Watchlist legs for every position that has a streamer symbol.
fn watchlist_positions(positions: &[BrokeragePosition]) -> Vec<Position> {
    positions
        .iter()
        .filter_map(|p| {
            let leg = p.to_watchlist_position();
            if leg.is_none() {
                warn!(symbol = %p.symbol, instrument = ?p.instrument_type, "No streamer symbol, not exported");
            }
            leg
        })
        .collect()
}

/// Fetches account positions, prints them, and optionally exports them.
///
/// # Errors
/// Returns error if login, the account lookup, the positions request, or
/// the CSV write fails.
pub async fn run_positions(args: PositionsArgs, config: &AppConfig) -> Result<()> {
    let (client, session) = super::connect(&config.tastytrade).await?;

    let account = match args.account.as_deref() {
        Some(number) => client.find_account(&session, number).await?,
        None => client.default_account(&session).await?,
    };
    info!(account = %account.account_number, "Fetching positions");

    let positions = client
        .get_positions(&session, &account.account_number)
        .await
        .context("Failed to fetch positions")?;
    info!(count = positions.len(), "Fetched positions");

    portfolio::print_table(&portfolio::portfolio_rows(&positions), &account.account_number);

    if args.export_csv {
        let path = args.output.unwrap_or_else(|| config.export.path.clone());
        let written = write_watchlist(&path, &watchlist_positions(&positions))
            .with_context(|| format!("Failed to export watchlist: {}", path.display()))?;
        info!(path = %path.display(), rows = written, "Exported watchlist");
        println!("Exported {} positions to {}", written, path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use spread_watch_tastytrade::InstrumentType;

    #[test]
    fn futures_are_not_exported() {
        let positions = vec![
            BrokeragePosition {
                account_number: "5WT00001".to_string(),
                symbol: "SPY   250117P00500000".to_string(),
                instrument_type: InstrumentType::EquityOption,
                underlying_symbol: "SPY".to_string(),
                quantity: dec!(-1),
                average_open_price: Some(dec!(4.1)),
            },
            BrokeragePosition {
                account_number: "5WT00001".to_string(),
                symbol: "/ESH5".to_string(),
                instrument_type: InstrumentType::Future,
                underlying_symbol: "/ES".to_string(),
                quantity: dec!(1),
                average_open_price: None,
            },
        ];

        let legs = watchlist_positions(&positions);

        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].group, "SPY");
        assert_eq!(legs[0].streamer_symbol, ".SPY250117P500");
        assert_eq!(legs[0].open_price, Some(dec!(4.1)));
    }
}
