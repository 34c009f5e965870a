//! CLI commands for spread-watch.

pub mod positions;
pub mod record;
pub mod watch;

pub use positions::{run_positions, PositionsArgs};
pub use record::{run_record, RecordArgs};
pub use watch::{run_watch, WatchArgs};

use anyhow::{Context, Result};
use spread_watch_core::TastytradeConfig;
use spread_watch_tastytrade::{
    Credentials, CredentialsConfig, Session, TastytradeClient, TastytradeClientConfig,
};
use tracing::info;

/// Reads credentials from the environment and logs in.
///
/// # Errors
/// Returns error if credentials are missing or the login is rejected.
pub async fn connect(config: &TastytradeConfig) -> Result<(TastytradeClient, Session)> {
    let credentials = Credentials::from_env(
        &CredentialsConfig::default()
            .with_env_vars(&config.username_env, &config.password_env),
    )
    .context("tastytrade credentials not configured")?;

    let client = TastytradeClient::new(TastytradeClientConfig::from(config))?;
    info!(base_url = client.base_url(), "Connecting to tastytrade");

    let session = client
        .login(&credentials)
        .await
        .context("tastytrade login failed")?;

    Ok((client, session))
}
