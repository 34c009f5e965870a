//! tastytrade integration for spread-watch.
//!
//! This crate provides:
//! - Session login from environment credentials
//! - REST client with rate limiting for accounts, positions and market data
//! - A [`MarketDataSource`](spread_watch_core::MarketDataSource) that prices
//!   watchlist streamer symbols
//!
//! # Authentication
//!
//! Set `TASTY_USER` and `TASTY_PASS` (names configurable through
//! [`CredentialsConfig`]). The credentials are exchanged once for a
//! [`Session`], which every authenticated call receives explicitly.
//!
//! # API Endpoints
//!
//! - `POST /sessions` - Log in
//! - `GET /customers/me/accounts` - Linked accounts
//! - `GET /accounts/{account_number}/positions` - Open positions
//! - `GET /market-data/by-type` - Quotes by instrument type

pub mod auth;
pub mod client;
pub mod error;
pub mod quotes;
pub mod types;

pub use auth::{Credentials, CredentialsConfig, Session};
pub use client::{
    TastytradeClient, TastytradeClientConfig, MAX_SYMBOLS_PER_REQUEST, TASTYTRADE_PROD_URL,
    TASTYTRADE_SANDBOX_URL,
};
pub use error::{Result, TastytradeError};
pub use quotes::TastytradeQuotes;
pub use types::{Account, BrokeragePosition, InstrumentType, MarketQuote, QuantityDirection};
