//! Client configuration: API location, client identification and transport
//! tuning.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ApiError;

pub const API_URL: &str = "https://api.tidalhifi.com/v1/";
pub const DEFAULT_USER_AGENT: &str = "TIDAL_ANDROID/679 okhttp/3.3.1";
pub const DEFAULT_CLIENT_UNIQUE_KEY: &str = "9116f4461454fa12";
pub const DEFAULT_CLIENT_VERSION: &str = "1.12.1";
pub const DEFAULT_ORIGIN: &str = "https://listen.tidal.com";

/// Settings shared by every request a session makes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub client_unique_key: String,
    pub client_version: String,
    /// Sent as `Origin` on stream resolution requests.
    pub origin: String,
    /// Sent as `limit` on paginated requests. The server picks when unset.
    pub page_size: Option<usize>,
    /// Global timeout for the default transport.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            client_unique_key: DEFAULT_CLIENT_UNIQUE_KEY.to_string(),
            client_version: DEFAULT_CLIENT_VERSION.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            page_size: None,
            timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Defaults overlaid with `TIDAL_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let mut config = Self::default();

        if let Some(v) = lookup("TIDAL_API_URL") {
            config.base_url = v;
        }
        if let Some(v) = lookup("TIDAL_USER_AGENT") {
            config.user_agent = v;
        }
        if let Some(v) = lookup("TIDAL_CLIENT_UNIQUE_KEY") {
            config.client_unique_key = v;
        }
        if let Some(v) = lookup("TIDAL_CLIENT_VERSION") {
            config.client_version = v;
        }
        if let Some(v) = lookup("TIDAL_ORIGIN") {
            config.origin = v;
        }
        if let Some(v) = lookup("TIDAL_PAGE_SIZE") {
            config.page_size = Some(parse_number("TIDAL_PAGE_SIZE", &v)?);
        }
        if let Some(v) = lookup("TIDAL_TIMEOUT_SECS") {
            config.timeout = Some(Duration::from_secs(parse_number("TIDAL_TIMEOUT_SECS", &v)?));
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ApiError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ApiError::ConfigError {
        key: key.to_string(),
        reason: format!("`{value}`: {e}"),
    })
}
