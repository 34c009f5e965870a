use std::path::Path;

use crate::config::AppConfig;
use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};

/// Config file read when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/spread-watch.toml";

/// Prefix for environment overrides, e.g. `SPREAD_WATCH_REFRESH__INTERVAL_SECS`.
pub const ENV_PREFIX: &str = "SPREAD_WATCH_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from the default file (if present) and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or a value is invalid.
    pub fn load() -> Result<AppConfig> {
        Self::extract(Figment::new().merge(Toml::file(DEFAULT_CONFIG_PATH)))
    }

    /// Loads configuration from an explicit file, which must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, cannot be parsed, or a value
    /// is invalid.
    pub fn load_from(path: &Path) -> Result<AppConfig> {
        if !path.is_file() {
            bail!("config file not found: {}", path.display());
        }
        Self::extract(Figment::new().merge(Toml::file(path)))
    }

    fn extract(figment: Figment) -> Result<AppConfig> {
        let config: AppConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load().map_err(|e| e.to_string())?;
            assert_eq!(config, AppConfig::default());
            Ok(())
        });
    }

    #[test]
    fn file_then_env_precedence() {
        Jail::expect_with(|jail| {
            std::fs::create_dir_all("config").map_err(|e| e.to_string())?;
            jail.create_file(
                DEFAULT_CONFIG_PATH,
                r#"
                [refresh]
                interval_secs = 10

                [watchlist]
                path = "my-watchlist.csv"
                "#,
            )?;
            jail.set_env("SPREAD_WATCH_REFRESH__INTERVAL_SECS", "15");

            let config = ConfigLoader::load().map_err(|e| e.to_string())?;
            assert_eq!(config.refresh.interval_secs, 15);
            assert_eq!(config.watchlist.path, Path::new("my-watchlist.csv"));
            assert_eq!(config.recorder.interval_secs, 60);
            Ok(())
        });
    }

    #[test]
    fn out_of_range_interval_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("SPREAD_WATCH_REFRESH__INTERVAL_SECS", "90");
            assert!(ConfigLoader::load().is_err());
            Ok(())
        });
    }

    #[test]
    fn explicit_file_must_exist() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[tastytrade]\napi_url = \"http://localhost:9000\"\n")?;

            let config = ConfigLoader::load_from(Path::new("custom.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config.tastytrade.api_url, "http://localhost:9000");
            assert!(ConfigLoader::load_from(Path::new("missing.toml")).is_err());
            Ok(())
        });
    }
}
