//! Runtime settings loaded from environment variables.
//!
//! Secrets such as the bot token are read directly before use and never stored
//! here. Everything else has a default so the service starts with an empty `.env`.

use crate::errors::{Error, Result};
use std::net::SocketAddr;

const DEFAULT_API_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Settings shared by the bot and the HTTP API.
#[derive(Debug, Clone)]
pub struct Settings {
    /// `SeaORM` connection string
    pub database_url: String,
    /// Address the customer API listens on
    pub api_bind_addr: SocketAddr,
    /// Discord channel that receives the kitchen feed, if any
    pub kitchen_channel_id: Option<u64>,
    /// Path of the TOML seed file
    pub config_path: String,
}

impl Settings {
    /// Reads settings from the process environment.
    ///
    /// Reads `DATABASE_URL`, `API_BIND_ADDR`, `KITCHEN_CHANNEL_ID` and `CONFIG_PATH`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .unwrap_or_else(|| super::database::DEFAULT_DATABASE_URL.to_string());

        let bind = lookup("API_BIND_ADDR").unwrap_or_else(|| DEFAULT_API_BIND_ADDR.to_string());
        let api_bind_addr = bind.parse().map_err(|e| Error::Config {
            message: format!("Invalid API_BIND_ADDR '{bind}': {e}"),
        })?;

        let kitchen_channel_id = match lookup("KITCHEN_CHANNEL_ID") {
            Some(raw) if !raw.trim().is_empty() => {
                Some(raw.trim().parse().map_err(|e| Error::Config {
                    message: format!("Invalid KITCHEN_CHANNEL_ID '{raw}': {e}"),
                })?)
            }
            _ => None,
        };

        let config_path = lookup("CONFIG_PATH").unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        Ok(Self {
            database_url,
            api_bind_addr,
            kitchen_channel_id,
            config_path,
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[("DATABASE_URL", "sqlite::memory:")]))
            .unwrap();
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.api_bind_addr.port(), 8080);
        assert_eq!(settings.kitchen_channel_id, None);
        assert_eq!(settings.config_path, "config.toml");
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite://x.db"),
            ("API_BIND_ADDR", "127.0.0.1:9000"),
            ("KITCHEN_CHANNEL_ID", " 987654321 "),
            ("CONFIG_PATH", "menu.toml"),
        ]))
        .unwrap();
        assert_eq!(settings.api_bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(settings.kitchen_channel_id, Some(987_654_321));
        assert_eq!(settings.config_path, "menu.toml");
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let bad_addr = Settings::from_lookup(lookup_from(&[("API_BIND_ADDR", "nope")]));
        assert!(matches!(bad_addr, Err(Error::Config { .. })));

        let bad_channel = Settings::from_lookup(lookup_from(&[("KITCHEN_CHANNEL_ID", "abc")]));
        assert!(matches!(bad_channel, Err(Error::Config { .. })));
    }

    #[test]
    fn test_blank_channel_is_none() {
        let settings =
            Settings::from_lookup(lookup_from(&[("KITCHEN_CHANNEL_ID", "  ")])).unwrap();
        assert_eq!(settings.kitchen_channel_id, None);
    }
}
