use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One leg of a watched strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Strategy group this leg belongs to.
    pub group: String,
    /// Brokerage (OCC) symbol, when the source provided one.
    pub symbol: Option<String>,
    /// Symbol used for market-data lookups.
    pub streamer_symbol: String,
    /// Signed quantity: positive = long, negative = short.
    pub quantity: Decimal,
    /// Price per contract recorded when the leg was opened.
    pub open_price: Option<Decimal>,
}

impl Position {
    pub fn new(
        group: impl Into<String>,
        streamer_symbol: impl Into<String>,
        quantity: Decimal,
    ) -> Self {
        Self {
            group: group.into(),
            symbol: None,
            streamer_symbol: streamer_symbol.into(),
            quantity,
            open_price: None,
        }
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn with_open_price(mut self, open_price: Decimal) -> Self {
        self.open_price = Some(open_price);
        self
    }

    #[must_use]
    pub fn is_long(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    #[must_use]
    pub fn is_short(&self) -> bool {
        self.quantity < Decimal::ZERO
    }

    /// "Long" or "Short", as shown in the portfolio table and export.
    #[must_use]
    pub fn position_type(&self) -> &'static str {
        if self.is_short() {
            "Short"
        } else {
            "Long"
        }
    }
}

/// Positions sharing a group name, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyGroup<'a> {
    pub name: &'a str,
    pub positions: Vec<&'a Position>,
}

/// Groups positions by name, ordering groups by first appearance.
///
/// Every position lands in exactly one group and keeps its relative order.
#[must_use]
pub fn group_positions(positions: &[Position]) -> Vec<StrategyGroup<'_>> {
    let mut groups: Vec<StrategyGroup<'_>> = Vec::new();

    for position in positions {
        match groups.iter_mut().find(|g| g.name == position.group) {
            Some(group) => group.positions.push(position),
            None => groups.push(StrategyGroup {
                name: &position.group,
                positions: vec![position],
            }),
        }
    }

    groups
}

/// Distinct streamer symbols in first-seen order.
#[must_use]
pub fn unique_symbols(positions: &[Position]) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::with_capacity(positions.len());
    for position in positions {
        if !symbols.contains(&position.streamer_symbol) {
            symbols.push(position.streamer_symbol.clone());
        }
    }
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn leg(group: &str, symbol: &str, qty: Decimal) -> Position {
        Position::new(group, symbol, qty)
    }

    #[test]
    fn groups_keep_first_seen_order() {
        let positions = vec![
            leg("SPY", ".SPY250117P500", dec!(-1)),
            leg("AAPL", ".AAPL250117C245", dec!(1)),
            leg("SPY", ".SPY250117P495", dec!(1)),
        ];

        let groups = group_positions(&positions);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "SPY");
        assert_eq!(groups[1].name, "AAPL");
        let spy: Vec<&str> = groups[0]
            .positions
            .iter()
            .map(|p| p.streamer_symbol.as_str())
            .collect();
        assert_eq!(spy, vec![".SPY250117P500", ".SPY250117P495"]);
    }

    #[test]
    fn every_position_in_exactly_one_group() {
        let positions = vec![
            leg("A", ".X", dec!(1)),
            leg("B", ".Y", dec!(-2)),
            leg("A", ".Z", dec!(3)),
            leg("C", ".X", dec!(-1)),
        ];

        let groups = group_positions(&positions);
        let total: usize = groups.iter().map(|g| g.positions.len()).sum();
        assert_eq!(total, positions.len());
    }

    #[test]
    fn unique_symbols_drops_duplicates() {
        let positions = vec![
            leg("A", ".X", dec!(1)),
            leg("B", ".Y", dec!(-2)),
            leg("C", ".X", dec!(-1)),
        ];
        assert_eq!(unique_symbols(&positions), vec![".X", ".Y"]);
    }

    #[test]
    fn position_type_follows_sign() {
        assert_eq!(leg("A", ".X", dec!(-1)).position_type(), "Short");
        assert_eq!(leg("A", ".X", dec!(2)).position_type(), "Long");
        assert!(leg("A", ".X", dec!(2)).is_long());
    }
}
