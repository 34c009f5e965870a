//! Daily CSV logs of strategy marks and position quotes.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use csv::Writer;
use tracing::debug;

use crate::config::RecorderConfig;
use crate::format::csv_decimal;
use crate::metrics::compute_strategy_metrics;
use crate::position::Position;
use crate::quotes::QuoteBook;

pub const STRATEGY_HEADER: [&str; 3] = ["timestamp", "group_name", "net_value"];

pub const POSITIONS_HEADER: [&str; 10] = [
    "timestamp",
    "group_name",
    "streamer_symbol",
    "quantity",
    "open_price",
    "market_price",
    "bid_price",
    "ask_price",
    "bid_size",
    "ask_size",
];

/// Rows appended by one [`QuoteRecorder::record`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordSummary {
    pub strategies: usize,
    pub positions: usize,
}

/// Appends one snapshot per tick to dated CSV files.
#[derive(Debug, Clone)]
pub struct QuoteRecorder {
    output_dir: PathBuf,
    strategy_template: String,
    positions_template: String,
}

impl QuoteRecorder {
    #[must_use]
    pub fn new(config: &RecorderConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            strategy_template: config.strategy_template.clone(),
            positions_template: config.positions_template.clone(),
        }
    }

    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    #[must_use]
    pub fn strategy_path(&self, date: NaiveDate) -> PathBuf {
        self.output_dir.join(file_name(&self.strategy_template, date))
    }

    #[must_use]
    pub fn positions_path(&self, date: NaiveDate) -> PathBuf {
        self.output_dir.join(file_name(&self.positions_template, date))
    }

    /// Appends the strategy marks and position quotes observed at `at`.
    ///
    /// Files are named after the UTC date of `at` and get a header when
    /// created.
    ///
    /// # Errors
    /// Returns error if the output directory or files cannot be written.
    pub fn record(
        &self,
        at: DateTime<Utc>,
        positions: &[Position],
        book: &QuoteBook,
    ) -> Result<RecordSummary> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory: {}", self.output_dir.display())
        })?;

        let timestamp = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let date = at.date_naive();

        let metrics = compute_strategy_metrics(positions, book);
        let strategy_path = self.strategy_path(date);
        let mut writer = open_append(&strategy_path, &STRATEGY_HEADER)?;
        for m in &metrics {
            writer.write_record([
                timestamp.as_str(),
                m.group.as_str(),
                csv_decimal(m.net_value).as_str(),
            ])?;
        }
        writer.flush()?;

        let positions_path = self.positions_path(date);
        let mut writer = open_append(&positions_path, &POSITIONS_HEADER)?;
        for position in positions {
            let quote = book.get(&position.streamer_symbol);
            writer.write_record(&[
                timestamp.clone(),
                position.group.clone(),
                position.streamer_symbol.clone(),
                csv_decimal(Some(position.quantity)),
                csv_decimal(position.open_price),
                csv_decimal(quote.and_then(|q| q.price())),
                csv_decimal(quote.and_then(|q| q.bid)),
                csv_decimal(quote.and_then(|q| q.ask)),
                csv_decimal(quote.and_then(|q| q.bid_size)),
                csv_decimal(quote.and_then(|q| q.ask_size)),
            ])?;
        }
        writer.flush()?;

        let summary = RecordSummary {
            strategies: metrics.len(),
            positions: positions.len(),
        };
        debug!(
            strategies = summary.strategies,
            positions = summary.positions,
            file = %strategy_path.display(),
            "Recorded snapshot"
        );
        Ok(summary)
    }
}

/// Expands `{date}` in `template` to `YYYYMMDD`.
#[must_use]
pub fn file_name(template: &str, date: NaiveDate) -> String {
    template.replace("{date}", &date.format("%Y%m%d").to_string())
}

fn open_append(path: &Path, header: &[&str]) -> Result<Writer<File>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let is_new = file
        .metadata()
        .with_context(|| format!("Failed to stat CSV file: {}", path.display()))?
        .len()
        == 0;

    let mut writer = Writer::from_writer(file);
    if is_new {
        writer.write_record(header)?;
    }
    Ok(writer)
}
