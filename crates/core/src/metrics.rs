//! Per-strategy aggregation: net credit/debit, P&L and per-leg detail rows.

use std::collections::HashMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::position::{group_positions, Position, StrategyGroup};
use crate::quotes::QuoteBook;

/// P&L percentage, or "n/a" when the open value is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PnlPercent {
    Value(Decimal),
    NotApplicable,
}

impl PnlPercent {
    #[must_use]
    pub fn value(self) -> Option<Decimal> {
        match self {
            Self::Value(v) => Some(v),
            Self::NotApplicable => None,
        }
    }
}

impl fmt::Display for PnlPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{:.2}%", crate::format::cents(*v)),
            Self::NotApplicable => write!(f, "n/a"),
        }
    }
}

/// Profit or loss of a strategy against its open value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pnl {
    pub amount: Decimal,
    pub percent: PnlPercent,
}

impl Pnl {
    #[must_use]
    pub fn new(net_value: Decimal, net_open: Decimal) -> Self {
        let amount = net_value - net_open;
        Self {
            amount,
            percent: pnl_percent(amount, net_open),
        }
    }
}

/// `amount / |net_open| * 100`, or `NotApplicable` for a zero open value.
#[must_use]
pub fn pnl_percent(amount: Decimal, net_open: Decimal) -> PnlPercent {
    if net_open.is_zero() {
        return PnlPercent::NotApplicable;
    }
    amount
        .checked_div(net_open.abs())
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map_or(PnlPercent::NotApplicable, PnlPercent::Value)
}

/// Summary row for one strategy group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrategyMetrics {
    pub group: String,
    /// Σ quantity × price over priced legs. Positive is a net debit.
    /// `None` when no leg has a price.
    pub net_value: Option<Decimal>,
    /// Σ quantity × open price, when every leg has an open price.
    pub net_open: Option<Decimal>,
    /// Net open value per long contract.
    pub net_open_price: Option<Decimal>,
    /// Present only when every leg is priced and has an open price.
    pub pnl: Option<Pnl>,
    pub legs: usize,
    pub unpriced_legs: usize,
}

impl StrategyMetrics {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.unpriced_legs == 0
    }
}

/// Aggregates one group against the current quotes.
#[must_use]
pub fn strategy_metrics(group: &StrategyGroup<'_>, book: &QuoteBook) -> StrategyMetrics {
    let mut net_value: Option<Decimal> = None;
    let mut unpriced_legs = 0;

    for position in &group.positions {
        match book.price(&position.streamer_symbol) {
            Some(price) => {
                *net_value.get_or_insert(Decimal::ZERO) += position.quantity * price;
            }
            None => unpriced_legs += 1,
        }
    }

    let net_open = group
        .positions
        .iter()
        .map(|p| p.open_price.map(|open| p.quantity * open))
        .sum::<Option<Decimal>>();

    let long_quantity: Decimal = group
        .positions
        .iter()
        .filter(|p| p.is_long())
        .map(|p| p.quantity)
        .sum();

    let net_open_price = net_open.and_then(|open| open.checked_div(long_quantity));

    let pnl = match (net_value, net_open) {
        (Some(value), Some(open)) if unpriced_legs == 0 => Some(Pnl::new(value, open)),
        _ => None,
    };

    StrategyMetrics {
        group: group.name.to_string(),
        net_value,
        net_open,
        net_open_price,
        pnl,
        legs: group.positions.len(),
        unpriced_legs,
    }
}

/// Aggregates every group in first-seen order.
#[must_use]
pub fn compute_strategy_metrics(positions: &[Position], book: &QuoteBook) -> Vec<StrategyMetrics> {
    group_positions(positions)
        .iter()
        .map(|group| strategy_metrics(group, book))
        .collect()
}

/// Direction of a price since the previous tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceTrend {
    Up,
    Down,
    Unchanged,
}

/// Last known price per symbol, carried across ticks.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    previous: HashMap<String, Decimal>,
}

impl PriceHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn trend(&self, symbol: &str, price: Option<Decimal>) -> PriceTrend {
        match (price, self.previous.get(symbol)) {
            (Some(now), Some(before)) if now > *before => PriceTrend::Up,
            (Some(now), Some(before)) if now < *before => PriceTrend::Down,
            _ => PriceTrend::Unchanged,
        }
    }

    /// Remembers the prices of `symbols` from `book`. Unpriced symbols keep
    /// their previous value.
    pub fn record(&mut self, symbols: &[String], book: &QuoteBook) {
        for symbol in symbols {
            if let Some(price) = book.price(symbol) {
                self.previous.insert(symbol.clone(), price);
            }
        }
    }
}

/// Detail row for one leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionDetail {
    pub group: String,
    pub streamer_symbol: String,
    pub quantity: Decimal,
    pub price: Option<Decimal>,
    pub trend: PriceTrend,
}

/// Builds detail rows grouped like the summary table.
///
/// Trends compare against `history`, which is not updated here.
#[must_use]
pub fn position_details(
    positions: &[Position],
    book: &QuoteBook,
    history: &PriceHistory,
) -> Vec<PositionDetail> {
    group_positions(positions)
        .into_iter()
        .flat_map(|group| group.positions)
        .map(|position| {
            let price = book.price(&position.streamer_symbol);
            PositionDetail {
                group: position.group.clone(),
                streamer_symbol: position.streamer_symbol.clone(),
                quantity: position.quantity,
                price,
                trend: history.trend(&position.streamer_symbol, price),
            }
        })
        .collect()
}
