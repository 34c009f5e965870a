use crate::quotes::Quote;
use anyhow::Result;
use async_trait::async_trait;

/// Source of live quotes for streamer symbols.
///
/// Implementations return whatever subset of `symbols` they could price.
/// An `Err` means the request as a whole failed.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>>;
    fn name(&self) -> &str;
}
