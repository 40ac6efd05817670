//! Configuration module for environment variable parsing.
//!
//! Configuration is read once at startup. The two store settings are required;
//! everything else has a default.

use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Base URL used when a credential record carries no API URL of its own.
pub const DEFAULT_AVITO_API_URL: &str = "https://api.avito.ru";

/// Fatal configuration problems detected at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} is not a valid URL: {value}")]
    InvalidUrl { name: &'static str, value: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Data store base URL (Supabase project URL)
    pub store_url: String,

    /// Administrative key for the data store
    pub store_service_key: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// Fallback Avito API base URL for credentials without one
    pub default_api_url: String,

    /// Timeout for the outbound Avito call in milliseconds
    pub upstream_timeout_ms: u64,

    /// Timeout for data store calls in milliseconds
    pub store_timeout_ms: u64,

    /// Largest accepted send request body in bytes
    pub max_body_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store_url = required(&lookup, "SUPABASE_URL")?;
        if Url::parse(&store_url).is_err() {
            return Err(ConfigError::InvalidUrl {
                name: "SUPABASE_URL",
                value: store_url,
            });
        }

        let store_service_key = required(&lookup, "SUPABASE_SERVICE_ROLE_KEY")?;

        let default_api_url = lookup("AVITO_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_AVITO_API_URL.to_string());

        Ok(Config {
            store_url: store_url.trim_end_matches('/').to_string(),
            store_service_key,
            port: parse_or(&lookup, "PORT", 8080),
            default_api_url,
            upstream_timeout_ms: parse_or(&lookup, "AVITO_REQUEST_TIMEOUT_MS", 10_000),
            store_timeout_ms: parse_or(&lookup, "STORE_REQUEST_TIMEOUT_MS", 5_000),
            max_body_bytes: parse_or(&lookup, "MAX_REQUEST_BODY_BYTES", 2 * 1024 * 1024),
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

/// Read a required variable; empty values count as missing.
fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Parse an optional variable, falling back to `default` when absent or invalid.
fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = match lookup(name) {
        Some(v) => v,
        None => return default,
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_from_lookup_minimal() {
        let config = Config::from_lookup(lookup_from(&[
            ("SUPABASE_URL", "https://project.supabase.co/"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
        ]))
        .unwrap();

        assert_eq!(config.store_url, "https://project.supabase.co");
        assert_eq!(config.store_service_key, "service-key");
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_api_url, DEFAULT_AVITO_API_URL);
        assert_eq!(config.upstream_timeout(), Duration::from_secs(10));
        assert_eq!(config.store_timeout(), Duration::from_secs(5));
        assert_eq!(config.max_body_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_missing_store_url() {
        let result = Config::from_lookup(lookup_from(&[(
            "SUPABASE_SERVICE_ROLE_KEY",
            "service-key",
        )]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("SUPABASE_URL"));
    }

    #[test]
    fn test_empty_service_key_is_missing() {
        let result = Config::from_lookup(lookup_from(&[
            ("SUPABASE_URL", "https://project.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "  "),
        ]));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY")
        );
    }

    #[test]
    fn test_invalid_store_url() {
        let result = Config::from_lookup(lookup_from(&[
            ("SUPABASE_URL", "not a url"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn test_optional_overrides_and_bad_numbers() {
        let config = Config::from_lookup(lookup_from(&[
            ("SUPABASE_URL", "http://localhost:54321"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service-key"),
            ("PORT", "9000"),
            ("AVITO_API_URL", "https://sandbox.avito.test"),
            ("AVITO_REQUEST_TIMEOUT_MS", "abc"),
            ("STORE_REQUEST_TIMEOUT_MS", "750"),
            ("MAX_REQUEST_BODY_BYTES", "4096"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.default_api_url, "https://sandbox.avito.test");
        assert_eq!(config.upstream_timeout_ms, 10_000);
        assert_eq!(config.store_timeout_ms, 750);
        assert_eq!(config.max_body_bytes, 4096);
    }
}
