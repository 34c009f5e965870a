//! Error types for the tastytrade integration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TastytradeError {
    /// Rejected credentials or an expired session token.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Non-success status other than 401/429.
    #[error("tastytrade API returned {status_code}: {message}")]
    Api { status_code: u16, message: String },

    #[error("rate limited by tastytrade, retry after {retry_after_secs}s")]
    RateLimit { retry_after_secs: u64 },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout: {0}")]
    Timeout(String),

    /// Missing credentials or an unusable client setting.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Response body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Serialization(String),

    #[error("no accounts linked to this login")]
    NoAccounts,

    #[error("account {account_number} is not linked to this login")]
    AccountNotFound { account_number: String },

    /// Account numbers are interpolated into request paths.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

impl TastytradeError {
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    pub fn rate_limit(retry_after_secs: u64) -> Self {
        Self::RateLimit { retry_after_secs }
    }

    pub fn account_not_found(account_number: impl Into<String>) -> Self {
        Self::AccountNotFound {
            account_number: account_number.into(),
        }
    }

    /// The identical request may succeed if sent again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::RateLimit { .. }
        )
    }

    /// Retryable, or a server-side failure that is likely to clear.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.is_retryable() || matches!(self, Self::Api { status_code, .. } if *status_code >= 500)
    }
}

impl From<reqwest::Error> for TastytradeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Serialization(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("cannot reach tastytrade: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TastytradeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TastytradeError>;
