//! Provider configuration
//!
//! Credentials come from the orchestrator's configuration document, then
//! from environment variables, then from deprecated aliases.
//!
//! | setting | order |
//! |---|---|
//! | API key | `api_key` → `ACTIVE24_API_KEY` → `username` |
//! | API secret | `api_secret` → `ACTIVE24_API_SECRET` → `password` → `api_token` |
//! | base URL | `base_url` → `ACTIVE24_BASE_URL` → [`DEFAULT_BASE_URL`] |
//! | debug logging | `ACTIVE24_DEBUG` (`1`, `true`, `TRUE`, `yes`, `on`) |
//!
//! Empty strings count as unset.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Active24 REST API v2 base URL
pub const DEFAULT_BASE_URL: &str = "https://rest.active24.cz/v2";

/// Per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Environment variable holding the API key
pub const ENV_API_KEY: &str = "ACTIVE24_API_KEY";

/// Environment variable holding the API secret
pub const ENV_API_SECRET: &str = "ACTIVE24_API_SECRET";

/// Environment variable overriding the base URL
pub const ENV_BASE_URL: &str = "ACTIVE24_BASE_URL";

/// Environment variable enabling request/response logging
pub const ENV_DEBUG: &str = "ACTIVE24_DEBUG";

/// Provider configuration as supplied by the orchestrator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (HTTP Basic username)
    #[serde(default)]
    pub api_key: Option<String>,

    /// API secret used to sign requests
    #[serde(default)]
    pub api_secret: Option<String>,

    /// Base URL override
    #[serde(default)]
    pub base_url: Option<String>,

    /// Deprecated alias for `api_key`
    #[serde(default)]
    pub username: Option<String>,

    /// Deprecated alias for `api_secret`
    #[serde(default)]
    pub password: Option<String>,

    /// Deprecated alias for `api_secret`
    #[serde(default)]
    pub api_token: Option<String>,
}

/// Configuration with every fallback applied
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub api_key: String,
    pub api_secret: String,
    pub base_url: String,
    pub debug: bool,
    pub timeout: Duration,
}

// The secret must not end up in logs
impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("debug", &self.debug)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn set(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

impl ProviderConfig {
    /// Resolve against the process environment
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary environment lookup
    pub fn resolve_with<F>(&self, env: F) -> Result<ResolvedConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_set = |key: &str| env(key).filter(|v| !v.is_empty());

        let api_key = set(&self.api_key)
            .or_else(|| env_set(ENV_API_KEY))
            .or_else(|| set(&self.username))
            .ok_or_else(|| Error::config(format!("missing API key: set api_key or {ENV_API_KEY}")))?;

        let api_secret = set(&self.api_secret)
            .or_else(|| env_set(ENV_API_SECRET))
            .or_else(|| set(&self.password))
            .or_else(|| set(&self.api_token))
            .ok_or_else(|| {
                Error::config(format!("missing API secret: set api_secret or {ENV_API_SECRET}"))
            })?;

        let base_url = set(&self.base_url)
            .or_else(|| env_set(ENV_BASE_URL))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Ok(ResolvedConfig {
            api_key,
            api_secret,
            base_url,
            debug: is_truthy(env(ENV_DEBUG).as_deref()),
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

/// Debug toggle values: `1`, `true`, `TRUE`, `yes`, `on`
pub fn is_truthy(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "TRUE" | "yes" | "on"))
}
