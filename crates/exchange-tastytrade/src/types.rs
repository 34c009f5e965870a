//! Data models for the tastytrade integration.
//!
//! All financial values use `rust_decimal::Decimal`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use spread_watch_core::symbology::occ_to_streamer;
use spread_watch_core::Position;

// =============================================================================
// Account Types
// =============================================================================

/// A trading account linked to the login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account number (e.g., "5WT00001").
    pub account_number: String,

    pub nickname: Option<String>,

    /// Account type (e.g., "Individual", "Roth IRA").
    pub account_type: Option<String>,
}

// =============================================================================
// Position Types
// =============================================================================

/// Instrument class of a position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentType {
    Equity,
    EquityOption,
    Future,
    FutureOption,
    Cryptocurrency,
    Other(String),
}

impl InstrumentType {
    /// Parses the API's display name ("Equity Option", ...).
    #[must_use]
    pub fn from_api(value: &str) -> Self {
        match value {
            "Equity" => Self::Equity,
            "Equity Option" => Self::EquityOption,
            "Future" => Self::Future,
            "Future Option" => Self::FutureOption,
            "Cryptocurrency" => Self::Cryptocurrency,
            other => Self::Other(other.to_string()),
        }
    }

    /// Query parameter name for `GET /market-data/by-type`.
    #[must_use]
    pub fn market_data_key(&self) -> Option<&'static str> {
        match self {
            Self::Equity => Some("equity"),
            Self::EquityOption => Some("equity-option"),
            _ => None,
        }
    }
}

/// Whether a position is long or short. The API reports unsigned quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantityDirection {
    Long,
    Short,
    Zero,
}

impl QuantityDirection {
    #[must_use]
    pub fn from_api(value: &str) -> Self {
        match value {
            "Short" => Self::Short,
            "Zero" => Self::Zero,
            _ => Self::Long,
        }
    }
}

/// A position held in a brokerage account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokeragePosition {
    pub account_number: String,

    /// Brokerage symbol; OCC format for equity options.
    pub symbol: String,

    pub instrument_type: InstrumentType,

    pub underlying_symbol: String,

    /// Signed quantity: negative for short positions.
    pub quantity: Decimal,

    /// Average price paid or received per unit.
    pub average_open_price: Option<Decimal>,
}

impl BrokeragePosition {
    #[must_use]
    pub fn signed_quantity(quantity: Decimal, direction: QuantityDirection) -> Decimal {
        match direction {
            QuantityDirection::Short => -quantity.abs(),
            QuantityDirection::Long => quantity.abs(),
            QuantityDirection::Zero => Decimal::ZERO,
        }
    }

    /// Market-data symbol for this position.
    ///
    /// Equities stream under their ticker and equity options under the
    /// translated OCC symbol. Other instruments and malformed option symbols
    /// have none.
    #[must_use]
    pub fn streamer_symbol(&self) -> Option<String> {
        match self.instrument_type {
            InstrumentType::Equity => Some(self.symbol.clone()),
            InstrumentType::EquityOption => occ_to_streamer(&self.symbol).ok(),
            _ => None,
        }
    }

    /// Watchlist leg grouped under the underlying, if the position has a
    /// streamer symbol.
    #[must_use]
    pub fn to_watchlist_position(&self) -> Option<Position> {
        let streamer_symbol = self.streamer_symbol()?;
        let mut position = Position::new(&self.underlying_symbol, streamer_symbol, self.quantity)
            .with_symbol(&self.symbol);
        position.open_price = self.average_open_price;
        Some(position)
    }
}

// =============================================================================
// Market Data Types
// =============================================================================

/// Quote returned by `GET /market-data/by-type`, keyed by brokerage symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub symbol: String,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub bid_size: Option<Decimal>,
    pub ask_size: Option<Decimal>,
    pub last: Option<Decimal>,
    pub mark: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn option_position(symbol: &str, quantity: Decimal) -> BrokeragePosition {
        BrokeragePosition {
            account_number: "5WT00001".to_string(),
            symbol: symbol.to_string(),
            instrument_type: InstrumentType::EquityOption,
            underlying_symbol: symbol.split_whitespace().next().unwrap_or_default().to_string(),
            quantity,
            average_open_price: Some(dec!(2.45)),
        }
    }

    #[test]
    fn test_instrument_type_from_api() {
        assert_eq!(InstrumentType::from_api("Equity Option"), InstrumentType::EquityOption);
        assert_eq!(InstrumentType::from_api("Equity"), InstrumentType::Equity);
        assert_eq!(
            InstrumentType::from_api("Bond"),
            InstrumentType::Other("Bond".to_string())
        );
    }

    #[test]
    fn test_signed_quantity() {
        assert_eq!(
            BrokeragePosition::signed_quantity(dec!(2), QuantityDirection::Short),
            dec!(-2)
        );
        assert_eq!(
            BrokeragePosition::signed_quantity(dec!(3), QuantityDirection::Long),
            dec!(3)
        );
    }

    #[test]
    fn test_option_streamer_symbol() {
        let position = option_position("AAPL  250117C00245000", dec!(-1));
        assert_eq!(position.streamer_symbol().as_deref(), Some(".AAPL250117C245"));
    }

    #[test]
    fn test_equity_uses_ticker() {
        let mut position = option_position("MSFT", dec!(100));
        position.instrument_type = InstrumentType::Equity;
        assert_eq!(position.streamer_symbol().as_deref(), Some("MSFT"));
    }

    #[test]
    fn test_future_has_no_streamer_symbol() {
        let mut position = option_position("/ESZ5", dec!(1));
        position.instrument_type = InstrumentType::Future;
        assert_eq!(position.streamer_symbol(), None);
        assert!(position.to_watchlist_position().is_none());
    }

    #[test]
    fn test_to_watchlist_position() {
        let position = option_position("BHP   250117C00052500", dec!(-3))
            .to_watchlist_position()
            .unwrap();

        assert_eq!(position.group, "BHP");
        assert_eq!(position.streamer_symbol, ".BHP250117C52.5");
        assert_eq!(position.symbol.as_deref(), Some("BHP   250117C00052500"));
        assert_eq!(position.quantity, dec!(-3));
        assert_eq!(position.open_price, Some(dec!(2.45)));
    }
}
