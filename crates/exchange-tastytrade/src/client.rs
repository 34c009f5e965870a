//! tastytrade REST API client with rate limiting.
//!
//! # Example
//!
//! ```ignore
//! use spread_watch_tastytrade::{Credentials, CredentialsConfig, TastytradeClient, TastytradeClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = TastytradeClient::new(TastytradeClientConfig::default())?;
//!     let session = client.login(&Credentials::from_env(&CredentialsConfig::default())?).await?;
//!
//!     let account = client.default_account(&session).await?;
//!     let positions = client.get_positions(&session, &account.account_number).await?;
//!     println!("{} positions", positions.len());
//!     Ok(())
//! }
//! ```

use crate::auth::{Credentials, Session};
use crate::error::{Result, TastytradeError};
use crate::types::{Account, BrokeragePosition, InstrumentType, MarketQuote, QuantityDirection};
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use spread_watch_core::TastytradeConfig;
use std::num::NonZeroU32;
use std::sync::Arc;

// =============================================================================
// Constants
// =============================================================================

/// tastytrade production API base URL.
pub const TASTYTRADE_PROD_URL: &str = "https://api.tastyworks.com";

/// tastytrade certification (sandbox) API base URL.
pub const TASTYTRADE_SANDBOX_URL: &str = "https://api.cert.tastyworks.com";

/// Most symbols accepted by one market-data request.
pub const MAX_SYMBOLS_PER_REQUEST: usize = 100;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the tastytrade client.
#[derive(Debug, Clone)]
pub struct TastytradeClientConfig {
    /// Base URL for the API.
    pub base_url: String,

    /// Requests per minute limit.
    pub requests_per_minute: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TastytradeClientConfig {
    fn default() -> Self {
        Self {
            base_url: TASTYTRADE_PROD_URL.to_string(),
            requests_per_minute: nonzero!(120u32),
            timeout_secs: 30,
        }
    }
}

impl From<&TastytradeConfig> for TastytradeClientConfig {
    fn from(config: &TastytradeConfig) -> Self {
        let defaults = Self::default();
        Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            requests_per_minute: NonZeroU32::new(config.requests_per_minute)
                .unwrap_or(defaults.requests_per_minute),
            timeout_secs: config.timeout_secs,
        }
    }
}

impl TastytradeClientConfig {
    /// Creates a configuration for the sandbox environment.
    #[must_use]
    pub fn sandbox() -> Self {
        Self {
            base_url: TASTYTRADE_SANDBOX_URL.to_string(),
            ..Default::default()
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_minute: NonZeroU32) -> Self {
        self.requests_per_minute = requests_per_minute;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

// =============================================================================
// API Response Types
// =============================================================================

/// Every tastytrade response wraps its payload in `data`.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ItemList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct LoginRequest<'a> {
    login: &'a str,
    password: &'a str,
    remember_me: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawSession {
    session_token: String,
}

#[derive(Debug, Deserialize)]
struct RawAccountEntry {
    account: RawAccount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawAccount {
    account_number: String,
    nickname: Option<String>,
    account_type_name: Option<String>,
}

impl From<RawAccount> for Account {
    fn from(raw: RawAccount) -> Self {
        Self {
            account_number: raw.account_number,
            nickname: raw.nickname,
            account_type: raw.account_type_name,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawPosition {
    account_number: Option<String>,
    symbol: String,
    instrument_type: String,
    underlying_symbol: Option<String>,
    quantity: Decimal,
    quantity_direction: Option<String>,
    average_open_price: Option<Decimal>,
}

impl From<RawPosition> for BrokeragePosition {
    fn from(raw: RawPosition) -> Self {
        let direction = raw
            .quantity_direction
            .as_deref()
            .map_or(QuantityDirection::Long, QuantityDirection::from_api);

        Self {
            account_number: raw.account_number.unwrap_or_default(),
            underlying_symbol: raw.underlying_symbol.unwrap_or_else(|| raw.symbol.clone()),
            symbol: raw.symbol,
            instrument_type: InstrumentType::from_api(&raw.instrument_type),
            quantity: BrokeragePosition::signed_quantity(raw.quantity, direction),
            average_open_price: raw.average_open_price,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawQuote {
    symbol: String,
    #[serde(default)]
    bid: Option<Decimal>,
    #[serde(default)]
    ask: Option<Decimal>,
    #[serde(default)]
    bid_size: Option<Decimal>,
    #[serde(default)]
    ask_size: Option<Decimal>,
    #[serde(default)]
    last: Option<Decimal>,
    #[serde(default)]
    mark: Option<Decimal>,
}

impl From<RawQuote> for MarketQuote {
    fn from(raw: RawQuote) -> Self {
        Self {
            symbol: raw.symbol,
            bid: raw.bid,
            ask: raw.ask,
            bid_size: raw.bid_size,
            ask_size: raw.ask_size,
            last: raw.last,
            mark: raw.mark,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawErrorEnvelope {
    error: RawError,
}

#[derive(Debug, Deserialize)]
struct RawError {
    message: Option<String>,
    code: Option<String>,
}

/// Pulls the human-readable message out of an error body, falling back to
/// the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<RawErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error.message.or(env.error.code))
        .unwrap_or_else(|| body.to_string())
}

// =============================================================================
// TastytradeClient
// =============================================================================

/// tastytrade REST API client.
///
/// All requests are rate-limited. Authenticated calls take a [`Session`].
pub struct TastytradeClient {
    /// Configuration.
    config: TastytradeClientConfig,

    /// HTTP client.
    http: Client,

    /// Rate limiter.
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl std::fmt::Debug for TastytradeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TastytradeClient")
            .field("base_url", &self.config.base_url)
            .field("requests_per_minute", &self.config.requests_per_minute)
            .finish_non_exhaustive()
    }
}

impl TastytradeClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the base URL is empty or the HTTP client cannot be
    /// built.
    pub fn new(config: TastytradeClientConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(TastytradeError::Configuration(
                "base URL must not be empty".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("spread-watch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TastytradeError::Network(format!("failed to build HTTP client: {e}")))?;

        let quota = Quota::per_minute(config.requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            config,
            http,
            rate_limiter,
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Validates an account number before it is placed in a URL path.
    fn validate_account_number(account_number: &str) -> Result<&str> {
        if account_number.is_empty() {
            return Err(TastytradeError::InvalidIdentifier(
                "account number cannot be empty".to_string(),
            ));
        }

        if account_number.len() > 32 || !account_number.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(TastytradeError::InvalidIdentifier(format!(
                "account number must be alphanumeric: {account_number}"
            )));
        }

        Ok(account_number)
    }

    /// Waits for rate limiter and makes an authenticated GET request.
    async fn get<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!("GET {} params={}", url, query.len());

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .header("Authorization", session.authorization())
            .query(query)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handles API response, converting errors appropriately.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(TastytradeError::rate_limit(retry_after));
        }

        if status.as_u16() == 401 {
            let text = response.text().await.unwrap_or_default();
            return Err(TastytradeError::Authentication(error_message(&text)));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TastytradeError::api(status.as_u16(), error_message(&text)));
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }

    // =========================================================================
    // Session Endpoints
    // =========================================================================

    /// Exchanges credentials for a session (`POST /sessions`).
    ///
    /// # Errors
    /// Returns [`TastytradeError::Authentication`] if the login is rejected.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/sessions", self.config.base_url);
        tracing::debug!("POST {}", url);

        let body = LoginRequest {
            login: credentials.username(),
            password: credentials.password(),
            remember_me: false,
        };

        let response = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() && status.as_u16() != 429 {
            let text = response.text().await.unwrap_or_default();
            return Err(TastytradeError::Authentication(error_message(&text)));
        }

        let envelope: DataEnvelope<RawSession> = self.handle_response(response).await?;
        tracing::info!(user = credentials.username(), "Logged in to tastytrade");

        Ok(Session::new(
            SecretString::from(envelope.data.session_token),
            credentials.username(),
        ))
    }

    // =========================================================================
    // Account Endpoints
    // =========================================================================

    /// Lists the accounts linked to the session.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn get_accounts(&self, session: &Session) -> Result<Vec<Account>> {
        let envelope: DataEnvelope<ItemList<RawAccountEntry>> =
            self.get(session, "/customers/me/accounts", &[]).await?;

        Ok(envelope
            .data
            .items
            .into_iter()
            .map(|entry| Account::from(entry.account))
            .collect())
    }

    /// Returns the first linked account.
    ///
    /// # Errors
    /// Returns [`TastytradeError::NoAccounts`] if none is linked.
    pub async fn default_account(&self, session: &Session) -> Result<Account> {
        self.get_accounts(session)
            .await?
            .into_iter()
            .next()
            .ok_or(TastytradeError::NoAccounts)
    }

    /// Returns the linked account with the given number.
    ///
    /// # Errors
    /// Returns [`TastytradeError::AccountNotFound`] if it is not linked.
    pub async fn find_account(&self, session: &Session, account_number: &str) -> Result<Account> {
        self.get_accounts(session)
            .await?
            .into_iter()
            .find(|a| a.account_number == account_number)
            .ok_or_else(|| TastytradeError::account_not_found(account_number))
    }

    /// Gets the open positions of an account.
    ///
    /// # Errors
    /// Returns error if the account number is invalid or the API call fails.
    pub async fn get_positions(
        &self,
        session: &Session,
        account_number: &str,
    ) -> Result<Vec<BrokeragePosition>> {
        let account_number = Self::validate_account_number(account_number)?;
        let path = format!("/accounts/{account_number}/positions");

        let envelope: DataEnvelope<ItemList<RawPosition>> = self.get(session, &path, &[]).await?;

        Ok(envelope
            .data
            .items
            .into_iter()
            .map(BrokeragePosition::from)
            .collect())
    }

    // =========================================================================
    // Market Data Endpoints
    // =========================================================================

    /// Gets quotes for brokerage symbols (`GET /market-data/by-type`).
    ///
    /// Symbols are sent in batches of [`MAX_SYMBOLS_PER_REQUEST`]. Symbols
    /// the API does not know are simply absent from the result.
    ///
    /// # Errors
    /// Returns error if any batch fails.
    pub async fn get_market_data(
        &self,
        session: &Session,
        symbols: &[(InstrumentType, String)],
    ) -> Result<Vec<MarketQuote>> {
        let params: Vec<(&str, &str)> = symbols
            .iter()
            .filter_map(|(kind, symbol)| kind.market_data_key().map(|key| (key, symbol.as_str())))
            .collect();

        let mut quotes = Vec::with_capacity(params.len());
        for batch in params.chunks(MAX_SYMBOLS_PER_REQUEST) {
            let envelope: DataEnvelope<ItemList<RawQuote>> =
                self.get(session, "/market-data/by-type", batch).await?;
            quotes.extend(envelope.data.items.into_iter().map(MarketQuote::from));
        }

        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> TastytradeClient {
        TastytradeClient::new(TastytradeClientConfig::default().with_base_url(server.uri())).unwrap()
    }

    fn session() -> Session {
        Session::new(SecretString::from("tok-123".to_string()), "trader")
    }

    // ==================== Config Tests ====================

    #[test]
    fn test_client_config_default() {
        let config = TastytradeClientConfig::default();
        assert_eq!(config.base_url, TASTYTRADE_PROD_URL);
        assert_eq!(config.requests_per_minute.get(), 120);
    }

    #[test]
    fn test_client_config_from_app_config() {
        let app = TastytradeConfig {
            api_url: "http://localhost:9000/".to_string(),
            requests_per_minute: 0,
            timeout_secs: 5,
            ..TastytradeConfig::default()
        };

        let config = TastytradeClientConfig::from(&app);
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.requests_per_minute.get(), 120);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let result = TastytradeClient::new(TastytradeClientConfig::default().with_base_url(" "));
        assert!(matches!(result, Err(TastytradeError::Configuration(_))));
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_validate_account_number() {
        assert!(TastytradeClient::validate_account_number("5WT00001").is_ok());
        assert!(TastytradeClient::validate_account_number("").is_err());
        assert!(TastytradeClient::validate_account_number("../admin").is_err());
        assert!(TastytradeClient::validate_account_number("5WT 0001").is_err());
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error":{"code":"invalid_credentials","message":"Invalid login, please check your username and password"}}"#;
        assert!(error_message(body).starts_with("Invalid login"));
        assert_eq!(error_message("plain text"), "plain text");
    }

    // ==================== Session Tests ====================

    #[tokio::test]
    async fn test_login_returns_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .and(body_json(json!({
                "login": "trader",
                "password": "hunter2",
                "remember-me": false
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": {
                    "session-token": "tok-abc",
                    "user": { "username": "trader" }
                },
                "context": "/sessions"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let credentials = Credentials::new("trader", SecretString::from("hunter2".to_string()));
        let session = client.login(&credentials).await.unwrap();

        assert_eq!(session.username(), "trader");
        assert_eq!(session.authorization(), "tok-abc");
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "code": "invalid_credentials", "message": "Invalid login" }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let credentials = Credentials::new("trader", SecretString::from("wrong".to_string()));
        let err = client.login(&credentials).await.unwrap_err();

        assert!(matches!(err, TastytradeError::Authentication(ref m) if m == "Invalid login"));
    }

    // ==================== Account Tests ====================

    #[tokio::test]
    async fn test_accounts_sent_with_session_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customers/me/accounts"))
            .and(header("Authorization", "tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "items": [
                        { "account": { "account-number": "5WT00001", "nickname": "main", "account-type-name": "Individual" }, "authority-level": "owner" },
                        { "account": { "account-number": "5WT00002" }, "authority-level": "owner" }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let accounts = client.get_accounts(&session()).await.unwrap();

        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[0].account_number, "5WT00001");
        assert_eq!(accounts[0].account_type.as_deref(), Some("Individual"));

        let found = client.find_account(&session(), "5WT00002").await.unwrap();
        assert_eq!(found.account_number, "5WT00002");
        let missing = client.find_account(&session(), "5WT00009").await.unwrap_err();
        assert!(matches!(missing, TastytradeError::AccountNotFound { .. }));
    }

    #[tokio::test]
    async fn test_no_accounts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/customers/me/accounts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "items": [] } })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.default_account(&session()).await.unwrap_err();
        assert!(matches!(err, TastytradeError::NoAccounts));
    }

    // ==================== Position Tests ====================

    #[tokio::test]
    async fn test_positions_are_signed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/5WT00001/positions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "items": [
                        {
                            "account-number": "5WT00001",
                            "symbol": "AAPL  250117C00245000",
                            "instrument-type": "Equity Option",
                            "underlying-symbol": "AAPL",
                            "quantity": "1",
                            "quantity-direction": "Short",
                            "average-open-price": "3.15",
                            "multiplier": 100
                        },
                        {
                            "account-number": "5WT00001",
                            "symbol": "MSFT",
                            "instrument-type": "Equity",
                            "underlying-symbol": "MSFT",
                            "quantity": 100,
                            "quantity-direction": "Long",
                            "average-open-price": "410.5"
                        }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let positions = client.get_positions(&session(), "5WT00001").await.unwrap();

        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].quantity, dec!(-1));
        assert_eq!(positions[0].instrument_type, InstrumentType::EquityOption);
        assert_eq!(positions[0].average_open_price, Some(dec!(3.15)));
        assert_eq!(positions[1].quantity, dec!(100));
        assert_eq!(positions[1].streamer_symbol().as_deref(), Some("MSFT"));
    }

    #[tokio::test]
    async fn test_expired_session_is_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/accounts/5WT00001/positions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.get_positions(&session(), "5WT00001").await.unwrap_err();
        assert!(matches!(err, TastytradeError::Authentication(_)));
    }

    // ==================== Market Data Tests ====================

    #[tokio::test]
    async fn test_market_data_by_type() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/market-data/by-type"))
            .and(query_param("equity-option", "SPY   250117P00500000"))
            .and(query_param("equity", "SPY"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "items": [
                        {
                            "symbol": "SPY   250117P00500000",
                            "instrument-type": "Equity Option",
                            "bid": "4.05",
                            "ask": "4.15",
                            "bid-size": "12",
                            "ask-size": "8",
                            "last": "4.1",
                            "mark": "4.1"
                        },
                        { "symbol": "SPY", "instrument-type": "Equity", "bid": "590.1", "ask": "590.2" }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let quotes = client
            .get_market_data(
                &session(),
                &[
                    (InstrumentType::EquityOption, "SPY   250117P00500000".to_string()),
                    (InstrumentType::Equity, "SPY".to_string()),
                ],
            )
            .await
            .unwrap();

        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].bid, Some(dec!(4.05)));
        assert_eq!(quotes[0].ask_size, Some(dec!(8)));
        assert_eq!(quotes[1].bid_size, None);
    }

    #[tokio::test]
    async fn test_rate_limited_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/market-data/by-type"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .get_market_data(&session(), &[(InstrumentType::Equity, "SPY".to_string())])
            .await
            .unwrap_err();

        assert!(matches!(err, TastytradeError::RateLimit { retry_after_secs: 7 }));
    }
}
