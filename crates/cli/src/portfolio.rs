//! One-shot brokerage positions table.

use rust_decimal::Decimal;
use spread_watch_core::format::{self, NOT_AVAILABLE};
use spread_watch_tastytrade::BrokeragePosition;

const RULE_WIDTH: usize = 76;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioRow {
    pub index: usize,
    pub symbol: String,
    pub streamer_symbol: Option<String>,
    pub quantity: Decimal,
    pub position_type: &'static str,
}

impl PortfolioRow {
    fn cells(&self) -> [String; 5] {
        [
            self.index.to_string(),
            self.symbol.clone(),
            self.streamer_symbol
                .clone()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            format::quantity(self.quantity),
            self.position_type.to_string(),
        ]
    }
}

/// Rows sorted by brokerage symbol and numbered from 1.
#[must_use]
pub fn portfolio_rows(positions: &[BrokeragePosition]) -> Vec<PortfolioRow> {
    let mut sorted: Vec<&BrokeragePosition> = positions.iter().collect();
    sorted.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, p)| PortfolioRow {
            index: i + 1,
            symbol: p.symbol.clone(),
            streamer_symbol: p.streamer_symbol(),
            quantity: p.quantity,
            position_type: if p.quantity < Decimal::ZERO {
                "Short"
            } else {
                "Long"
            },
        })
        .collect()
}

fn table_line(cells: &[&str; 5]) -> String {
    format!(
        "{:>4}  {:<24} {:<22} {:>8}  {:<13}",
        cells[0], cells[1], cells[2], cells[3], cells[4]
    )
    .trim_end()
    .to_string()
}

/// Report lines: title, column header, one line per row.
#[must_use]
pub fn table_lines(rows: &[PortfolioRow], account_number: &str) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 6);

    lines.push("=".repeat(RULE_WIDTH));
    lines.push(format!("POSITIONS ({account_number})"));
    lines.push("=".repeat(RULE_WIDTH));
    lines.push(table_line(&["#", "Symbol", "Streamer Symbol", "Qty", "Position Type"]));
    lines.push("-".repeat(RULE_WIDTH));

    for row in rows {
        let [index, symbol, streamer, qty, kind] = row.cells();
        lines.push(table_line(&[
            index.as_str(),
            symbol.as_str(),
            streamer.as_str(),
            qty.as_str(),
            kind.as_str(),
        ]));
    }

    lines.push("=".repeat(RULE_WIDTH));
    lines
}

/// Prints every row to stdout; long accounts scroll.
pub fn print_table(rows: &[PortfolioRow], account_number: &str) {
    println!();
    for line in table_lines(rows, account_number) {
        println!("{line}");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use spread_watch_tastytrade::InstrumentType;

    fn position(symbol: &str, kind: InstrumentType, quantity: Decimal) -> BrokeragePosition {
        BrokeragePosition {
            account_number: "5WT00001".to_string(),
            symbol: symbol.to_string(),
            instrument_type: kind,
            underlying_symbol: symbol.split_whitespace().next().unwrap_or_default().to_string(),
            quantity,
            average_open_price: None,
        }
    }

    fn sample() -> Vec<BrokeragePosition> {
        vec![
            position("SPY   250117P00500000", InstrumentType::EquityOption, dec!(-2)),
            position("AAPL", InstrumentType::Equity, dec!(100)),
            position("/ESH5", InstrumentType::Future, dec!(1)),
        ]
    }

    #[test]
    fn rows_sorted_and_numbered() {
        let rows = portfolio_rows(&sample());

        let symbols: Vec<_> = rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, ["/ESH5", "AAPL", "SPY   250117P00500000"]);
        assert_eq!(rows.iter().map(|r| r.index).collect::<Vec<_>>(), [1, 2, 3]);
    }

    #[test]
    fn row_cells() {
        let rows = portfolio_rows(&sample());

        assert_eq!(
            rows[2].cells(),
            [
                "3".to_string(),
                "SPY   250117P00500000".to_string(),
                ".SPY250117P500".to_string(),
                "-2".to_string(),
                "Short".to_string(),
            ]
        );
        assert_eq!(rows[1].cells()[2], "AAPL");
        assert_eq!(rows[1].cells()[4], "Long");
        assert_eq!(rows[0].cells()[2], "N/A");
    }

    #[test]
    fn table_has_header_and_aligned_rows() {
        let lines = table_lines(&portfolio_rows(&sample()), "5WT00001");

        assert_eq!(lines[1], "POSITIONS (5WT00001)");
        assert!(lines[3].contains("Streamer Symbol"));
        assert_eq!(
            lines[7],
            "   3  SPY   250117P00500000    .SPY250117P500               -2  Short"
        );
        // Streamer column starts at the same offset on every row
        let offset = lines[3].find("Streamer Symbol").unwrap();
        assert_eq!(lines[7].find(".SPY250117P500"), Some(offset));
    }

    #[test]
    fn large_account_prints_every_row() {
        let positions: Vec<_> = (0..150)
            .map(|i| position(&format!("T{i:03}"), InstrumentType::Equity, dec!(1)))
            .collect();

        let lines = table_lines(&portfolio_rows(&positions), "5WT00001");

        // 5 header lines and a closing rule around the rows
        assert_eq!(lines.len(), 150 + 6);
        assert!(lines[5].contains("T000"));
        assert!(lines[154].starts_with(" 150  T149"));
    }
}
