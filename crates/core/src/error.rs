//! Error types for watchlist files.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing watchlist CSV files.
#[derive(Debug, Error)]
pub enum WatchlistError {
    /// The file could not be opened or created.
    #[error("cannot access watchlist {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV layer failed (unterminated quote, invalid UTF-8, ...).
    #[error("CSV error on line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },

    /// A row is missing a field or carries an invalid value.
    #[error("parse error on line {line}: {reason}")]
    Parse { line: u64, reason: String },

    /// The header row lacks a required column.
    #[error("watchlist header is missing required column '{0}'")]
    MissingColumn(&'static str),

    /// Writing the exported watchlist failed.
    #[error("failed to write watchlist {path}: {reason}")]
    Write { path: PathBuf, reason: String },
}

impl WatchlistError {
    pub fn parse(line: u64, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }

    /// Line number the error points at, when there is one.
    #[must_use]
    pub const fn line(&self) -> Option<u64> {
        match self {
            Self::Csv { line, .. } | Self::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchlistError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_names_line() {
        let err = WatchlistError::parse(7, "quantity 'abc' is not a number");
        assert_eq!(err.line(), Some(7));
        assert!(err.to_string().contains("line 7"));
    }

    #[test]
    fn missing_column_has_no_line() {
        let err = WatchlistError::MissingColumn("quantity");
        assert_eq!(err.line(), None);
        assert!(err.to_string().contains("quantity"));
    }
}
