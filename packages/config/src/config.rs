// ABOUTME: Typed client configuration loaded from environment variables
// ABOUTME: Validates URLs and numeric settings, falling back to documented defaults

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use revdash_core::constants::{DEFAULT_API_BASE_URL, DEFAULT_REDIRECT_URI};
use thiserror::Error;
use tracing::debug;

use crate::constants::*;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_REDIRECT_DELAY_MS: u64 = 3000;
const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}' is not a number")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var} must be greater than zero")]
    ZeroValue { var: &'static str },

    #[error("Invalid URL for {var}: '{value}' (expected http:// or https://)")]
    InvalidUrl { var: &'static str, value: String },
}

/// Settings shared by the session store, gateway, callback flow, and cache
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash
    pub api_base_url: String,
    /// GitHub OAuth application id; login is unavailable without it
    pub github_client_id: Option<String>,
    /// Route GitHub redirects back to after consent
    pub redirect_uri: String,
    /// Directory holding the durable session entries
    pub storage_dir: PathBuf,
    pub http_timeout: Duration,
    /// Interval for auto-refreshing queries
    pub poll_interval: Duration,
    /// How long a failed callback stays visible before returning home
    pub redirect_delay: Duration,
    /// Pause between persisting a new session and reporting success
    pub settle_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            github_client_id: None,
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            storage_dir: default_storage_dir(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            redirect_delay: Duration::from_millis(DEFAULT_REDIRECT_DELAY_MS),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let api_base_url = match non_empty(REVDASH_API_URL) {
            Some(url) => validate_url(REVDASH_API_URL, url)?,
            None => defaults.api_base_url,
        };

        let redirect_uri = match non_empty(REVDASH_REDIRECT_URI) {
            Some(url) => validate_url(REVDASH_REDIRECT_URI, url)?,
            None => defaults.redirect_uri,
        };

        let storage_dir = non_empty(REVDASH_STORAGE_DIR)
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_dir);

        let http_timeout =
            parse_positive(REVDASH_HTTP_TIMEOUT_SECS, non_empty(REVDASH_HTTP_TIMEOUT_SECS))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout);

        let poll_interval =
            parse_positive(REVDASH_POLL_INTERVAL_SECS, non_empty(REVDASH_POLL_INTERVAL_SECS))?
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval);

        // Delays may legitimately be zero
        let redirect_delay =
            parse_number(REVDASH_REDIRECT_DELAY_MS, non_empty(REVDASH_REDIRECT_DELAY_MS))?
                .map(Duration::from_millis)
                .unwrap_or(defaults.redirect_delay);

        let settle_delay =
            parse_number(REVDASH_SETTLE_DELAY_MS, non_empty(REVDASH_SETTLE_DELAY_MS))?
                .map(Duration::from_millis)
                .unwrap_or(defaults.settle_delay);

        let config = Self {
            api_base_url,
            github_client_id: non_empty(REVDASH_GITHUB_CLIENT_ID),
            redirect_uri,
            storage_dir,
            http_timeout,
            poll_interval,
            redirect_delay,
            settle_delay,
        };

        debug!(
            "Loaded client config: api={} storage={}",
            config.api_base_url,
            config.storage_dir.display()
        );
        Ok(config)
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("revdash")
}

fn validate_url(var: &'static str, value: String) -> ConfigResult<String> {
    let trimmed = value.trim().trim_end_matches('/').to_string();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed)
    } else {
        Err(ConfigError::InvalidUrl { var, value })
    }
}

fn parse_number(var: &'static str, value: Option<String>) -> ConfigResult<Option<u64>> {
    value
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber { var, value: v })
        })
        .transpose()
}

fn parse_positive(var: &'static str, value: Option<String>) -> ConfigResult<Option<u64>> {
    match parse_number(var, value)? {
        Some(0) => Err(ConfigError::ZeroValue { var }),
        other => Ok(other),
    }
}
