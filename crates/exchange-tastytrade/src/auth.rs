//! Login credentials and API sessions.
//!
//! Credentials are read once from the environment and exchanged for a
//! [`Session`] by [`TastytradeClient::login`](crate::TastytradeClient::login).
//! Every authenticated call takes the session explicitly.
//!
//! # Security
//!
//! - The password and session token are held in [`SecretString`]
//! - Neither is ever logged; `Debug` output is redacted

use crate::error::{Result, TastytradeError};
use secrecy::{ExposeSecret, SecretString};

// =============================================================================
// Configuration
// =============================================================================

/// Names of the environment variables holding the login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialsConfig {
    /// Environment variable name for the username.
    pub username_env: String,

    /// Environment variable name for the password.
    pub password_env: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            username_env: "TASTY_USER".to_string(),
            password_env: "TASTY_PASS".to_string(),
        }
    }
}

impl CredentialsConfig {
    /// Sets custom environment variable names.
    #[must_use]
    pub fn with_env_vars(
        mut self,
        username_env: impl Into<String>,
        password_env: impl Into<String>,
    ) -> Self {
        self.username_env = username_env.into();
        self.password_env = password_env.into();
        self
    }
}

// =============================================================================
// Credentials
// =============================================================================

/// Username and password for `POST /sessions`.
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// Reads credentials from the environment variables named in `config`.
    ///
    /// # Errors
    /// Returns [`TastytradeError::Configuration`] if either variable is
    /// missing or empty.
    pub fn from_env(config: &CredentialsConfig) -> Result<Self> {
        let username = read_env(&config.username_env)?;
        let password = read_env(&config.password_env)?;
        Ok(Self::new(username, SecretString::from(password)))
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

fn read_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(TastytradeError::Configuration(format!(
            "missing environment variable: {name}"
        ))),
    }
}

// =============================================================================
// Session
// =============================================================================

/// An authenticated API session.
pub struct Session {
    token: SecretString,
    username: String,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl Session {
    pub fn new(token: SecretString, username: impl Into<String>) -> Self {
        Self {
            token,
            username: username.into(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Value for the `Authorization` header.
    pub(crate) fn authorization(&self) -> &str {
        self.token.expose_secret()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_config_default() {
        let config = CredentialsConfig::default();
        assert_eq!(config.username_env, "TASTY_USER");
        assert_eq!(config.password_env, "TASTY_PASS");
    }

    #[test]
    fn test_credentials_from_env() {
        std::env::set_var("SW_TEST_USER_OK", "trader");
        std::env::set_var("SW_TEST_PASS_OK", "hunter2");

        let config = CredentialsConfig::default().with_env_vars("SW_TEST_USER_OK", "SW_TEST_PASS_OK");
        let credentials = Credentials::from_env(&config).unwrap();

        assert_eq!(credentials.username(), "trader");
        assert_eq!(credentials.password(), "hunter2");
    }

    #[test]
    fn test_credentials_from_env_missing_password() {
        std::env::set_var("SW_TEST_USER_ONLY", "trader");
        std::env::remove_var("SW_TEST_PASS_MISSING");

        let config =
            CredentialsConfig::default().with_env_vars("SW_TEST_USER_ONLY", "SW_TEST_PASS_MISSING");
        let err = Credentials::from_env(&config).unwrap_err();

        assert!(err.to_string().contains("missing environment variable"));
        assert!(err.to_string().contains("SW_TEST_PASS_MISSING"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials = Credentials::new("trader", SecretString::from("hunter2".to_string()));
        let session = Session::new(SecretString::from("tok-abc".to_string()), "trader");

        let debug_output = format!("{credentials:?} {session:?}");
        assert!(debug_output.contains("trader"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains("tok-abc"));
    }
}
