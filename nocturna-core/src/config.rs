//! Client configuration.
//!
//! # Environment Variables
//!
//! [`ClientConfig::from_env`] reads:
//!
//! - `NOCTURNA_API_URL` - REST backend base URL (required)
//! - `NOCTURNA_DEEP_LINK_SCHEME` - custom URL scheme the app is registered for
//! - `NOCTURNA_HTTP_TIMEOUT_SECS` - per-request timeout
//! - `NOCTURNA_PENDING_PAYMENT_TTL_SECS` - validity window of a started checkout
//! - `NOCTURNA_ROLE_CACHE_TTL_SECS` - role list cache lifetime
//!
//! # Example
//!
//! ```rust
//! use nocturna_core::ClientConfig;
//!
//! let config = ClientConfig::new("https://api.example.com")
//!     .with_timeout(10)
//!     .with_deep_link_scheme("nocturna");
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};

use crate::{NocturnaError, Result};

/// Configuration shared by every component of the client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// REST backend base URL (e.g., "https://api.nocturna.app").
    pub api_base_url: String,

    /// URL scheme used for payment return deep links.
    #[serde(default = "default_scheme")]
    pub deep_link_scheme: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How long a started checkout stays reconcilable.
    #[serde(default = "default_pending_payment_ttl")]
    pub pending_payment_ttl_secs: u64,

    /// How long the role list is cached.
    #[serde(default = "default_role_cache_ttl")]
    pub role_cache_ttl_secs: u64,

    /// How long geocoding results are cached.
    #[serde(default = "default_geocode_cache_ttl")]
    pub geocode_cache_ttl_secs: u64,
}

fn default_scheme() -> String {
    "nocturna".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_pending_payment_ttl() -> u64 {
    10 * 60
}

fn default_role_cache_ttl() -> u64 {
    5 * 60
}

fn default_geocode_cache_ttl() -> u64 {
    60 * 60
}

impl ClientConfig {
    /// Create a configuration with default timings.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            deep_link_scheme: default_scheme(),
            timeout_secs: default_timeout(),
            pending_payment_ttl_secs: default_pending_payment_ttl(),
            role_cache_ttl_secs: default_role_cache_ttl(),
            geocode_cache_ttl_secs: default_geocode_cache_ttl(),
        }
    }

    /// Load from environment variables.
    ///
    /// Returns `None` if `NOCTURNA_API_URL` is not set. Unparseable numeric
    /// values fall back to the defaults.
    pub fn from_env() -> Option<Self> {
        let api_base_url = std::env::var("NOCTURNA_API_URL").ok()?;
        let mut config = Self::new(api_base_url);

        if let Ok(scheme) = std::env::var("NOCTURNA_DEEP_LINK_SCHEME") {
            config.deep_link_scheme = scheme;
        }
        if let Some(secs) = env_u64("NOCTURNA_HTTP_TIMEOUT_SECS") {
            config.timeout_secs = secs;
        }
        if let Some(secs) = env_u64("NOCTURNA_PENDING_PAYMENT_TTL_SECS") {
            config.pending_payment_ttl_secs = secs;
        }
        if let Some(secs) = env_u64("NOCTURNA_ROLE_CACHE_TTL_SECS") {
            config.role_cache_ttl_secs = secs;
        }

        Some(config)
    }

    /// Set the deep link scheme.
    pub fn with_deep_link_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.deep_link_scheme = scheme.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the pending payment validity window.
    pub fn with_pending_payment_ttl(mut self, secs: u64) -> Self {
        self.pending_payment_ttl_secs = secs;
        self
    }

    /// Set the role cache lifetime.
    pub fn with_role_cache_ttl(mut self, secs: u64) -> Self {
        self.role_cache_ttl_secs = secs;
        self
    }

    /// Set the geocoding cache lifetime.
    pub fn with_geocode_cache_ttl(mut self, secs: u64) -> Self {
        self.geocode_cache_ttl_secs = secs;
        self
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(NocturnaError::invalid_data(
                "api_base_url",
                "REST URL cannot be empty",
            ));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(NocturnaError::invalid_data(
                "api_base_url",
                "must start with http:// or https://",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(NocturnaError::invalid_data(
                "timeout_secs",
                "must be greater than zero",
            ));
        }
        if self.deep_link_scheme.is_empty() {
            return Err(NocturnaError::invalid_data(
                "deep_link_scheme",
                "cannot be empty",
            ));
        }
        Ok(())
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
