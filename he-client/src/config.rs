//! Client configuration

use std::fmt;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Default platform URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:9000";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "HE_API_KEY";
/// Environment variable overriding the base URL
pub const BASE_URL_ENV: &str = "HE_URL";
/// Environment variable overriding the notification channel URL
pub const WS_URL_ENV: &str = "HE_WS_URL";

/// Path of the notification endpoint when no WebSocket URL is configured
const DEFAULT_WS_PATH: &str = "ws";

/// Client configuration for connecting to the platform
#[derive(Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:9000")
    pub base_url: String,

    /// Notification channel URL; derived from `base_url` when unset
    pub ws_url: Option<String>,

    /// API key sent as `X-API-Key`
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds
    pub timeout: u64,

    /// Upper bound on waiting for a job result (None waits indefinitely)
    pub job_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ws_url: None,
            api_key: None,
            timeout: 30,
            job_timeout: None,
        }
    }

    /// Read `HE_API_KEY`, `HE_URL` and `HE_WS_URL` from the environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(base_url);
        config.api_key = lookup(API_KEY_ENV).filter(|key| !key.is_empty());
        config.ws_url = lookup(WS_URL_ENV);
        config
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the notification channel URL
    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = Some(url.into());
        self
    }

    /// Set the HTTP request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Bound every job wait by `timeout`
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = Some(timeout);
        self
    }

    /// Notification channel URL
    ///
    /// Without an explicit URL, `http://host` becomes `ws://host/ws` and
    /// `https://host` becomes `wss://host/ws`.
    pub fn resolve_ws_url(&self) -> ClientResult<String> {
        if let Some(url) = &self.ws_url {
            return Ok(url.clone());
        }

        let base = self.base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            return Err(ClientError::Config(format!(
                "cannot derive WebSocket URL from base URL {base}"
            )));
        };
        Ok(format!("{ws_base}/{DEFAULT_WS_PATH}"))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("ws_url", &self.ws_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("timeout", &self.timeout)
            .field("job_timeout", &self.job_timeout)
            .finish()
    }
}
