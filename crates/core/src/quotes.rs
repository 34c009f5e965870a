//! Market quotes and per-tick price lookup.

use std::collections::HashMap;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::traits::MarketDataSource;

/// Top-of-book snapshot for one symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub bid_size: Option<Decimal>,
    pub ask_size: Option<Decimal>,
    pub last: Option<Decimal>,
}

impl Quote {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bid: None,
            ask: None,
            bid_size: None,
            ask_size: None,
            last: None,
        }
    }

    #[must_use]
    pub fn with_bid_ask(mut self, bid: Decimal, ask: Decimal) -> Self {
        self.bid = Some(bid);
        self.ask = Some(ask);
        self
    }

    #[must_use]
    pub fn with_sizes(mut self, bid_size: Decimal, ask_size: Decimal) -> Self {
        self.bid_size = Some(bid_size);
        self.ask_size = Some(ask_size);
        self
    }

    /// Bid/ask midpoint. `None` unless both sides are quoted.
    #[must_use]
    pub fn price(&self) -> Option<Decimal> {
        match (self.bid, self.ask) {
            (Some(bid), Some(ask)) => Some((bid + ask) / Decimal::TWO),
            _ => None,
        }
    }
}

/// Quotes received in one refresh tick, keyed by streamer symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteBook {
    quotes: HashMap<String, Quote>,
}

impl QuoteBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, quote: Quote) {
        self.quotes.insert(quote.symbol.clone(), quote);
    }

    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.get(symbol)
    }

    /// Mid price for `symbol`, if it was quoted on both sides.
    #[must_use]
    pub fn price(&self, symbol: &str) -> Option<Decimal> {
        self.get(symbol).and_then(Quote::price)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Symbols from `symbols` that have no usable price.
    #[must_use]
    pub fn unpriced<'a>(&self, symbols: &'a [String]) -> Vec<&'a str> {
        symbols
            .iter()
            .filter(|s| self.price(s).is_none())
            .map(String::as_str)
            .collect()
    }
}

impl FromIterator<Quote> for QuoteBook {
    fn from_iter<I: IntoIterator<Item = Quote>>(iter: I) -> Self {
        let mut book = Self::new();
        for quote in iter {
            book.insert(quote);
        }
        book
    }
}

/// Requests quotes for `symbols` with one call to `source`.
///
/// Duplicates are requested once. Symbols the source does not return, or
/// returns without a two-sided market, are logged and left unpriced.
///
/// # Errors
/// Propagates a failure of the request as a whole.
pub async fn lookup_quotes(source: &dyn MarketDataSource, symbols: &[String]) -> Result<QuoteBook> {
    let mut unique: Vec<String> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        if !unique.contains(symbol) {
            unique.push(symbol.clone());
        }
    }

    if unique.is_empty() {
        return Ok(QuoteBook::new());
    }

    let book: QuoteBook = source.fetch_quotes(&unique).await?.into_iter().collect();

    let unpriced = book.unpriced(&unique);
    if !unpriced.is_empty() {
        warn!(source = source.name(), symbols = ?unpriced, "No price for some symbols");
    }
    debug!(
        source = source.name(),
        requested = unique.len(),
        received = book.len(),
        "Quotes refreshed"
    );

    Ok(book)
}
