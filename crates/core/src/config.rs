use std::path::PathBuf;

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// Refresh intervals accepted for the dashboard, in seconds.
pub const REFRESH_INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 1..=60;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub watchlist: WatchlistConfig,
    pub refresh: RefreshConfig,
    pub export: ExportConfig,
    pub recorder: RecorderConfig,
    pub tastytrade: TastytradeConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    pub output_dir: PathBuf,
    pub interval_secs: u64,
    /// File name for strategy marks; `{date}` becomes `YYYYMMDD`.
    pub strategy_template: String,
    /// File name for per-position quotes; `{date}` becomes `YYYYMMDD`.
    pub positions_template: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TastytradeConfig {
    pub api_url: String,
    /// Environment variable holding the login name.
    pub username_env: String,
    /// Environment variable holding the password.
    pub password_env: String,
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/positions-watchlist.csv"),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_secs: 5 }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/positions-watchlist.csv"),
        }
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            interval_secs: 60,
            strategy_template: "strategy-mtm-{date}.csv".to_string(),
            positions_template: "positions-quotes-{date}.csv".to_string(),
        }
    }
}

impl Default for TastytradeConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.tastyworks.com".to_string(),
            username_env: "TASTY_USER".to_string(),
            password_env: "TASTY_PASS".to_string(),
            timeout_secs: 30,
            requests_per_minute: 120,
        }
    }
}

impl AppConfig {
    /// Checks values that deserialization alone cannot.
    ///
    /// # Errors
    /// Returns an error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        validate_refresh_interval(self.refresh.interval_secs)?;
        ensure!(
            self.recorder.interval_secs > 0,
            "recorder.interval_secs must be positive"
        );
        ensure!(
            !self.tastytrade.api_url.trim().is_empty(),
            "tastytrade.api_url must not be empty"
        );
        ensure!(
            self.tastytrade.requests_per_minute > 0,
            "tastytrade.requests_per_minute must be positive"
        );
        Ok(())
    }
}

/// # Errors
/// Returns an error if `secs` is outside 1..=60.
pub fn validate_refresh_interval(secs: u64) -> Result<()> {
    ensure!(
        REFRESH_INTERVAL_RANGE.contains(&secs),
        "refresh interval must be between {} and {} seconds, got {secs}",
        REFRESH_INTERVAL_RANGE.start(),
        REFRESH_INTERVAL_RANGE.end()
    );
    Ok(())
}
