//! [`MarketDataSource`] backed by the tastytrade market-data endpoint.
//!
//! Watchlists speak streamer symbols; the API is keyed by brokerage
//! symbols. Options are translated to OCC on the way out and quotes are
//! mapped back on the way in. Equity symbols pass through unchanged.

use std::collections::HashMap;

use async_trait::async_trait;
use spread_watch_core::symbology::{is_streamer_option, streamer_to_occ};
use spread_watch_core::{MarketDataSource, Quote};
use tracing::warn;

use crate::auth::Session;
use crate::client::TastytradeClient;
use crate::types::{InstrumentType, MarketQuote};

/// Quotes for a logged-in session.
#[derive(Debug)]
pub struct TastytradeQuotes {
    client: TastytradeClient,
    session: Session,
}

impl TastytradeQuotes {
    #[must_use]
    pub fn new(client: TastytradeClient, session: Session) -> Self {
        Self { client, session }
    }
}

/// Brokerage request symbols plus the way back to streamer symbols.
fn request_symbols(symbols: &[String]) -> (Vec<(InstrumentType, String)>, HashMap<String, String>) {
    let mut request = Vec::with_capacity(symbols.len());
    let mut back = HashMap::with_capacity(symbols.len());

    for streamer in symbols {
        let (kind, brokerage) = if is_streamer_option(streamer) {
            match streamer_to_occ(streamer) {
                Ok(occ) => (InstrumentType::EquityOption, occ),
                Err(e) => {
                    warn!(symbol = %streamer, error = %e, "Cannot translate symbol, leaving unpriced");
                    continue;
                }
            }
        } else {
            (InstrumentType::Equity, streamer.clone())
        };

        back.insert(brokerage.clone(), streamer.clone());
        request.push((kind, brokerage));
    }

    (request, back)
}

fn to_quote(streamer_symbol: String, quote: MarketQuote) -> Quote {
    Quote {
        symbol: streamer_symbol,
        bid: quote.bid,
        ask: quote.ask,
        bid_size: quote.bid_size,
        ask_size: quote.ask_size,
        last: quote.last,
    }
}

#[async_trait]
impl MarketDataSource for TastytradeQuotes {
    async fn fetch_quotes(&self, symbols: &[String]) -> anyhow::Result<Vec<Quote>> {
        let (request, back) = request_symbols(symbols);
        if request.is_empty() {
            return Ok(Vec::new());
        }

        let quotes = self.client.get_market_data(&self.session, &request).await?;

        Ok(quotes
            .into_iter()
            .filter_map(|quote| {
                let streamer = back.get(&quote.symbol)?;
                Some(to_quote(streamer.clone(), quote))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "tastytrade"
    }
}
