//! Watchlist CSV files.
//!
//! A watchlist declares one strategy leg per row:
//!
//! ```text
//! group_name,streamer_symbol,quantity,open_price
//! SPY,.SPY250117P500,-1,4.10
//! SPY,.SPY250117P495,1,3.05
//! ```
//!
//! The header is optional. When present, columns are matched by name and
//! unknown columns are ignored, which lets the portfolio export
//! (`group_name,streamer_symbol,quantity,position_type`) be read back
//! directly. Without a header the columns are positional: group, symbol,
//! quantity and an optional open price. Brokerage OCC symbols are accepted
//! in the symbol column and translated to streamer symbols on load.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::{Result, WatchlistError};
use crate::position::Position;
use crate::symbology::{is_streamer_option, OptionContract};

/// Header written by [`write_watchlist`].
pub const EXPORT_HEADER: [&str; 4] = ["group_name", "streamer_symbol", "quantity", "position_type"];

/// Column indices for the fields we read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    group: usize,
    symbol: usize,
    quantity: usize,
    open_price: Option<usize>,
}

const GROUP_NAMES: [&str; 2] = ["group_name", "group"];
const SYMBOL_NAMES: [&str; 2] = ["streamer_symbol", "symbol"];
const QUANTITY_NAMES: [&str; 2] = ["quantity", "qty"];
const OPEN_PRICE_NAMES: [&str; 2] = ["open_price", "price"];

fn position_of(record: &StringRecord, names: &[&str]) -> Option<usize> {
    names.iter().find_map(|name| {
        record
            .iter()
            .position(|field| field.eq_ignore_ascii_case(name))
    })
}

impl Columns {
    const POSITIONAL: Self = Self {
        group: 0,
        symbol: 1,
        quantity: 2,
        open_price: Some(3),
    };

    /// A quantity column name, or both group and symbol column names.
    fn is_header(record: &StringRecord) -> bool {
        position_of(record, &QUANTITY_NAMES).is_some()
            || (position_of(record, &GROUP_NAMES).is_some()
                && position_of(record, &SYMBOL_NAMES).is_some())
    }

    fn from_header(record: &StringRecord) -> Result<Self> {
        Ok(Self {
            group: position_of(record, &GROUP_NAMES)
                .ok_or(WatchlistError::MissingColumn("group_name"))?,
            symbol: position_of(record, &SYMBOL_NAMES)
                .ok_or(WatchlistError::MissingColumn("streamer_symbol"))?,
            quantity: position_of(record, &QUANTITY_NAMES)
                .ok_or(WatchlistError::MissingColumn("quantity"))?,
            open_price: position_of(record, &OPEN_PRICE_NAMES),
        })
    }
}

/// Loads a watchlist file.
///
/// # Errors
/// Returns [`WatchlistError::Io`] if the file cannot be read, or a parse
/// error naming the offending line.
pub fn load_watchlist(path: impl AsRef<Path>) -> Result<Vec<Position>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| WatchlistError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let positions = parse_watchlist(&text)?;
    debug!(path = %path.display(), count = positions.len(), "Loaded watchlist");
    Ok(positions)
}

/// Parses watchlist text.
///
/// Blank lines are skipped. Rows keep their input order. Line numbers in
/// errors are 1-based and count blank lines.
///
/// # Errors
/// Returns [`WatchlistError::Parse`] when a row misses the group, symbol or
/// quantity, or when the quantity or open price is not a number.
pub fn parse_watchlist(text: &str) -> Result<Vec<Position>> {
    let mut columns: Option<Columns> = None;
    let mut positions = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx as u64 + 1;
        let record = split_line(raw, line)?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let cols = match columns {
            Some(cols) => cols,
            None if Columns::is_header(&record) => {
                columns = Some(Columns::from_header(&record)?);
                continue;
            }
            None => {
                columns = Some(Columns::POSITIONAL);
                Columns::POSITIONAL
            }
        };

        positions.push(parse_row(&record, cols, line)?);
    }

    Ok(positions)
}

fn split_line(raw: &str, line: u64) -> Result<StringRecord> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => Ok(record),
        Some(Err(source)) => Err(WatchlistError::Csv { line, source }),
        None => Ok(StringRecord::new()),
    }
}

fn parse_row(record: &StringRecord, cols: Columns, line: u64) -> Result<Position> {
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let group = field(cols.group);
    if group.is_empty() {
        return Err(WatchlistError::parse(line, "missing group name"));
    }

    let symbol = field(cols.symbol);
    if symbol.is_empty() {
        return Err(WatchlistError::parse(line, "missing symbol"));
    }

    let quantity_text = field(cols.quantity);
    if quantity_text.is_empty() {
        return Err(WatchlistError::parse(line, "missing quantity"));
    }
    let quantity = Decimal::from_str(quantity_text).map_err(|_| {
        WatchlistError::parse(line, format!("quantity '{quantity_text}' is not a number"))
    })?;

    let open_price = match cols.open_price.map(field) {
        Some(text) if !text.is_empty() => Some(Decimal::from_str(text).map_err(|_| {
            WatchlistError::parse(line, format!("open price '{text}' is not a number"))
        })?),
        _ => None,
    };

    let mut position = match OptionContract::from_occ(symbol) {
        Ok(contract) if !is_streamer_option(symbol) => {
            Position::new(group, contract.streamer_symbol(), quantity).with_symbol(symbol)
        }
        _ => Position::new(group, symbol, quantity),
    };
    position.open_price = open_price;

    Ok(position)
}

/// Writes positions as a watchlist, replacing any existing file.
///
/// Parent directories are created as needed. Returns the number of rows
/// written.
///
/// # Errors
/// Returns [`WatchlistError::Io`] if the file cannot be created and
/// [`WatchlistError::Write`] if serialization fails.
pub fn write_watchlist(path: impl AsRef<Path>, positions: &[Position]) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| WatchlistError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let file = File::create(path).map_err(|source| WatchlistError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let written = write_watchlist_to(file, positions).map_err(|e| WatchlistError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    debug!(path = %path.display(), rows = written, "Wrote watchlist");
    Ok(written)
}

/// Writes the export header and one row per position to `writer`.
///
/// Positions without a streamer symbol are skipped. Returns the number of
/// rows written.
///
/// # Errors
/// Returns the underlying CSV error if a row cannot be written.
pub fn write_watchlist_to<W: Write>(writer: W, positions: &[Position]) -> csv::Result<usize> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(EXPORT_HEADER)?;

    let mut written = 0;
    for position in positions {
        if position.streamer_symbol.is_empty() {
            warn!(group = %position.group, "Skipping position without streamer symbol");
            continue;
        }
        let quantity = position.quantity.normalize().to_string();
        writer.write_record([
            position.group.as_str(),
            position.streamer_symbol.as_str(),
            quantity.as_str(),
            position.position_type(),
        ])?;
        written += 1;
    }

    writer.flush()?;
    Ok(written)
}
