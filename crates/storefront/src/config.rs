//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `MARKETPLUS_API_BASE_URL` - Auth API base URL (default: http://127.0.0.1:8000/api/auth)
//! - `MARKETPLUS_DATA_DIR` - Directory for the file store (default: .marketplus)
//! - `MARKETPLUS_CORRUPT_DATA` - `reset` or `fail` (default: reset)
//! - `MARKETPLUS_EVENT_CAPACITY` - Change notification buffer size (default: 64)
//! - `MARKETPLUS_HTTP_TIMEOUT_SECS` - Auth API request timeout (default: none)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::collection::CorruptDataPolicy;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/auth";
const DEFAULT_DATA_DIR: &str = ".marketplus";
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Auth API configuration
    pub auth_api: AuthApiConfig,
    /// Directory holding the file store
    pub data_dir: PathBuf,
    /// What to do with undecodable stored data
    pub corrupt_data: CorruptDataPolicy,
    /// Capacity of the change notification channel
    pub event_capacity: usize,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Auth API configuration.
#[derive(Debug, Clone)]
pub struct AuthApiConfig {
    /// Base URL; endpoints are appended as `login/`, `register/`, `logout/`
    pub base_url: Url,
    /// Per-request timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get("MARKETPLUS_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| invalid("MARKETPLUS_API_BASE_URL", e.to_string()))?;

        let timeout = get("MARKETPLUS_HTTP_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| invalid("MARKETPLUS_HTTP_TIMEOUT_SECS", e.to_string()))
            })
            .transpose()?;

        let data_dir = PathBuf::from(
            get("MARKETPLUS_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        );

        let corrupt_data = get("MARKETPLUS_CORRUPT_DATA")
            .map(|raw| raw.parse().map_err(|e| invalid("MARKETPLUS_CORRUPT_DATA", e)))
            .transpose()?
            .unwrap_or_default();

        let event_capacity = match get("MARKETPLUS_EVENT_CAPACITY") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(0) => {
                    return Err(invalid("MARKETPLUS_EVENT_CAPACITY", "must be at least 1".into()));
                }
                Ok(n) => n,
                Err(e) => return Err(invalid("MARKETPLUS_EVENT_CAPACITY", e.to_string())),
            },
            None => DEFAULT_EVENT_CAPACITY,
        };

        Ok(Self {
            auth_api: AuthApiConfig { base_url, timeout },
            data_dir,
            corrupt_data,
            event_capacity,
            sentry_dsn: get("SENTRY_DSN"),
        })
    }
}

fn invalid(key: &str, reason: String) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_string(), reason)
}
