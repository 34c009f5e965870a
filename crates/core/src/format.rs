//! Text formatting shared by the dashboard, portfolio table and recorder.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::metrics::PnlPercent;

/// Shown in place of values that could not be computed.
pub const PLACEHOLDER: &str = "-";

/// Shown when a brokerage symbol has no streamer form.
pub const NOT_AVAILABLE: &str = "N/A";

/// Two-decimal money value, or the placeholder.
#[must_use]
pub fn money(value: Option<Decimal>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{:.2}", cents(v)))
}

/// Rounds half away from zero to two decimals.
#[must_use]
pub fn cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// P&L percentage with a `%` suffix, `n/a` for a zero open value, or the
/// placeholder when no P&L was computed.
#[must_use]
pub fn percent(value: Option<PnlPercent>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |p| p.to_string())
}

/// Quantity without trailing zeros: `-1`, `100`, `0.5`.
#[must_use]
pub fn quantity(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Plain decimal for CSV output; empty when missing.
#[must_use]
pub fn csv_decimal(value: Option<Decimal>) -> String {
    value.map(|v| v.normalize().to_string()).unwrap_or_default()
}
