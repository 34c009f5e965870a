//! Option symbol formats.
//!
//! The brokerage identifies equity options by their OCC symbol: the root
//! left-aligned in a 6-character space-padded field, the expiration as
//! `YYMMDD`, `C`/`P`, and the strike multiplied by 1000 as 8 zero-padded
//! digits:
//!
//! ```text
//! AAPL  250117C00245000   -> AAPL, 2025-01-17, call, 245
//! BHP   250117C00052500   -> BHP,  2025-01-17, call, 52.5
//! ```
//!
//! The market-data feed uses the compact streamer form of the same contract:
//! a leading `.`, the root, `YYMMDD`, `C`/`P` and the strike as a plain
//! decimal with trailing zeros removed (`.AAPL250117C245`, `.BHP250117C52.5`).

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width of the space-padded root field in an OCC symbol.
const OCC_ROOT_WIDTH: usize = 6;

/// Length of the contract part of an OCC symbol (`YYMMDD` + right + strike).
const OCC_CONTRACT_LEN: usize = 15;

/// OCC strikes are stored in thousandths.
const OCC_STRIKE_SCALE: u32 = 3;

/// Errors raised when a symbol does not follow the expected format.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    #[error("malformed OCC symbol '{symbol}': {reason}")]
    Occ { symbol: String, reason: String },

    #[error("malformed streamer symbol '{symbol}': {reason}")]
    Streamer { symbol: String, reason: String },
}

impl SymbolError {
    fn occ(symbol: &str, reason: impl Into<String>) -> Self {
        Self::Occ {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    fn streamer(symbol: &str, reason: impl Into<String>) -> Self {
        Self::Streamer {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }
}

/// Options contract right (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionRight {
    Call,
    Put,
}

impl OptionRight {
    fn from_code(code: char) -> Option<Self> {
        match code {
            'C' => Some(Self::Call),
            'P' => Some(Self::Put),
            _ => None,
        }
    }
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "C"),
            Self::Put => write!(f, "P"),
        }
    }
}

/// A single listed option contract, independent of symbol format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionContract {
    pub root: String,
    pub expiry: NaiveDate,
    pub right: OptionRight,
    pub strike: Decimal,
}

impl OptionContract {
    /// Parses a brokerage OCC symbol such as `"AAPL  250117C00245000"`.
    ///
    /// Roots without padding (`"AAPL250117C00245000"`) are accepted since the
    /// contract always occupies the last 15 characters.
    ///
    /// # Errors
    /// Returns [`SymbolError::Occ`] when the symbol is too short, the root is
    /// missing or too long, or any of the date, right or strike fields is
    /// malformed.
    pub fn from_occ(symbol: &str) -> Result<Self, SymbolError> {
        let trimmed = symbol.trim_end();
        if !trimmed.is_ascii() {
            return Err(SymbolError::occ(symbol, "non-ASCII characters"));
        }
        if trimmed.len() <= OCC_CONTRACT_LEN {
            return Err(SymbolError::occ(symbol, "too short"));
        }

        let (root_field, contract) = trimmed.split_at(trimmed.len() - OCC_CONTRACT_LEN);
        let root = root_field.trim();
        if root.is_empty() {
            return Err(SymbolError::occ(symbol, "missing root"));
        }
        if root.len() > OCC_ROOT_WIDTH || root.contains(' ') {
            return Err(SymbolError::occ(symbol, "invalid root"));
        }

        let expiry = parse_yymmdd(&contract[..6])
            .ok_or_else(|| SymbolError::occ(symbol, "invalid expiration"))?;

        let right = contract[6..7]
            .chars()
            .next()
            .and_then(OptionRight::from_code)
            .ok_or_else(|| SymbolError::occ(symbol, "right must be C or P"))?;

        let strike_digits = &contract[7..];
        if !strike_digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SymbolError::occ(symbol, "strike must be 8 digits"));
        }
        let thousandths: i64 = strike_digits
            .parse()
            .map_err(|_| SymbolError::occ(symbol, "strike must be 8 digits"))?;
        let strike = Decimal::new(thousandths, OCC_STRIKE_SCALE).normalize();

        Ok(Self {
            root: root.to_string(),
            expiry,
            right,
            strike,
        })
    }

    /// Parses a streamer symbol such as `".BHP250117C52.5"`.
    ///
    /// # Errors
    /// Returns [`SymbolError::Streamer`] when the leading dot, root,
    /// expiration, right or strike is missing or malformed.
    pub fn from_streamer(symbol: &str) -> Result<Self, SymbolError> {
        let body = symbol
            .strip_prefix('.')
            .ok_or_else(|| SymbolError::streamer(symbol, "missing leading '.'"))?;
        if !body.is_ascii() {
            return Err(SymbolError::streamer(symbol, "non-ASCII characters"));
        }

        // The right is the last C/P that is followed only by strike characters.
        let right_pos = body
            .rfind(['C', 'P'])
            .ok_or_else(|| SymbolError::streamer(symbol, "missing right"))?;
        if right_pos < 7 {
            return Err(SymbolError::streamer(symbol, "missing root or expiration"));
        }

        let root = &body[..right_pos - 6];
        let expiry = parse_yymmdd(&body[right_pos - 6..right_pos])
            .ok_or_else(|| SymbolError::streamer(symbol, "invalid expiration"))?;
        let right = OptionRight::from_code(body.as_bytes()[right_pos] as char)
            .ok_or_else(|| SymbolError::streamer(symbol, "right must be C or P"))?;

        let strike_text = &body[right_pos + 1..];
        if strike_text.is_empty()
            || !strike_text.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        {
            return Err(SymbolError::streamer(symbol, "invalid strike"));
        }
        let strike: Decimal = strike_text
            .parse()
            .map_err(|_| SymbolError::streamer(symbol, "invalid strike"))?;

        if root.is_empty() || root.len() > OCC_ROOT_WIDTH {
            return Err(SymbolError::streamer(symbol, "invalid root"));
        }

        Ok(Self {
            root: root.to_string(),
            expiry,
            right,
            strike: strike.normalize(),
        })
    }

    /// Streamer symbol for this contract (`.AAPL250117C245`).
    #[must_use]
    pub fn streamer_symbol(&self) -> String {
        format!(
            ".{}{}{}{}",
            self.root,
            self.expiry.format("%y%m%d"),
            self.right,
            format_strike(self.strike)
        )
    }

    /// Fixed-width OCC symbol for this contract (`AAPL  250117C00245000`).
    #[must_use]
    pub fn occ_symbol(&self) -> String {
        let thousandths = (self.strike * Decimal::from(1000))
            .trunc()
            .to_i64()
            .unwrap_or_default();
        format!(
            "{:<width$}{}{}{:08}",
            self.root,
            self.expiry.format("%y%m%d"),
            self.right,
            thousandths,
            width = OCC_ROOT_WIDTH
        )
    }
}

/// Translates a brokerage OCC symbol into the streamer symbol.
///
/// # Errors
/// Returns [`SymbolError`] if `occ` is not a well-formed OCC symbol.
pub fn occ_to_streamer(occ: &str) -> Result<String, SymbolError> {
    OptionContract::from_occ(occ).map(|c| c.streamer_symbol())
}

/// Translates a streamer symbol back into the brokerage OCC symbol.
///
/// # Errors
/// Returns [`SymbolError`] if `streamer` is not a well-formed streamer symbol.
pub fn streamer_to_occ(streamer: &str) -> Result<String, SymbolError> {
    OptionContract::from_streamer(streamer).map(|c| c.occ_symbol())
}

/// True when the symbol names an option in streamer form.
#[must_use]
pub fn is_streamer_option(symbol: &str) -> bool {
    symbol.starts_with('.')
}

fn parse_yymmdd(text: &str) -> Option<NaiveDate> {
    if text.len() != 6 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(&format!("20{text}"), "%Y%m%d").ok()
}

fn format_strike(strike: Decimal) -> String {
    // normalize() drops trailing zeros, so 245.000 prints as "245"
    strike.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn occ_to_streamer_whole_strike() {
        assert_eq!(occ_to_streamer("AAPL  250117C00245000").unwrap(), ".AAPL250117C245");
    }

    #[test]
    fn occ_to_streamer_trims_fractional_zeros() {
        assert_eq!(occ_to_streamer("BHP   250117C00052500").unwrap(), ".BHP250117C52.5");
    }

    #[test]
    fn occ_to_streamer_put_and_small_strike() {
        assert_eq!(occ_to_streamer("SPY   240621P00000500").unwrap(), ".SPY240621P0.5");
        assert_eq!(occ_to_streamer("F     250321P00012125").unwrap(), ".F250321P12.125");
    }

    #[test]
    fn occ_accepts_six_character_root() {
        let contract = OptionContract::from_occ("SPXW  251219P05800000").unwrap();
        assert_eq!(contract.root, "SPXW");
        let contract = OptionContract::from_occ("GOOGL1250117C00150000").unwrap();
        assert_eq!(contract.root, "GOOGL1");
        assert_eq!(contract.streamer_symbol(), ".GOOGL1250117C150");
    }

    #[test]
    fn occ_accepts_unpadded_root() {
        let contract = OptionContract::from_occ("AAPL250117C00245000").unwrap();
        assert_eq!(contract.root, "AAPL");
        assert_eq!(contract.strike, dec!(245));
    }

    #[test]
    fn occ_parses_all_fields() {
        let contract = OptionContract::from_occ("BHP   250117P00052500").unwrap();
        assert_eq!(contract.root, "BHP");
        assert_eq!(contract.expiry, NaiveDate::from_ymd_opt(2025, 1, 17).unwrap());
        assert_eq!(contract.right, OptionRight::Put);
        assert_eq!(contract.strike, dec!(52.5));
    }

    #[test]
    fn occ_rejects_malformed_symbols() {
        assert!(OptionContract::from_occ("AAPL").is_err());
        assert!(OptionContract::from_occ("      250117C00245000").is_err());
        assert!(OptionContract::from_occ("AAPL  251317C00245000").is_err());
        assert!(OptionContract::from_occ("AAPL  250117X00245000").is_err());
        assert!(OptionContract::from_occ("AAPL  250117C0024500A").is_err());
        assert!(OptionContract::from_occ("TOOLONGR250117C00245000").is_err());
    }

    #[test]
    fn streamer_to_occ_pads_root_and_strike() {
        assert_eq!(streamer_to_occ(".AAPL250117C245").unwrap(), "AAPL  250117C00245000");
        assert_eq!(streamer_to_occ(".BHP250117C52.5").unwrap(), "BHP   250117C00052500");
    }

    #[test]
    fn streamer_parses_root_containing_right_letters() {
        let contract = OptionContract::from_streamer(".CPRT250117P45").unwrap();
        assert_eq!(contract.root, "CPRT");
        assert_eq!(contract.right, OptionRight::Put);
        assert_eq!(contract.strike, dec!(45));
    }

    #[test]
    fn streamer_rejects_malformed_symbols() {
        assert!(OptionContract::from_streamer("AAPL250117C245").is_err());
        assert!(OptionContract::from_streamer(".AAPL250117C").is_err());
        assert!(OptionContract::from_streamer(".250117C245").is_err());
        assert!(OptionContract::from_streamer(".AAPL259917C245").is_err());
    }

    #[test]
    fn streamer_symbol_detection() {
        assert!(is_streamer_option(".AAPL250117C245"));
        assert!(!is_streamer_option("AAPL"));
    }
}
