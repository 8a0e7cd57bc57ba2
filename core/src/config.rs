//! Client configuration: one base address and one timeout, fixed at
//! construction.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Timeout applied when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

/// Prefix of the environment variables read by `ClientConfig::from_env`.
pub const ENV_PREFIX: &str = "IMAGEGEN_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct EnvConfig {
    base_url: String,
    timeout_ms: Option<u64>,
}

impl ClientConfig {
    /// Validate and freeze a configuration. A trailing `/` on the base address
    /// is dropped so paths can be joined uniformly.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let trimmed = base_url.trim();
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(base_url.to_string()));
        }
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    /// Same as `new` with `DEFAULT_TIMEOUT`.
    pub fn with_default_timeout(base_url: &str) -> Result<Self, ConfigError> {
        Self::new(base_url, DEFAULT_TIMEOUT)
    }

    /// Read `IMAGEGEN_BASE_URL` and optional `IMAGEGEN_TIMEOUT_MS`, loading a
    /// `.env` file first when one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!(error = %e, "no .env file loaded");
        }
        Self::from_vars(std::env::vars())
    }

    /// Build from explicit `(name, value)` pairs using the same variable names
    /// as `from_env`.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let env: EnvConfig = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        let timeout = env
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT);
        Self::new(&env.base_url, timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
