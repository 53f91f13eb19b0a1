//! Duplicate-check configuration.

use serde::Deserialize;
use std::time::Duration;

/// Default lookup endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/duplicates/check";

/// Configuration for live duplicate checking.
///
/// # Environment Variables
///
/// | Variable | Type | Default | Description |
/// |----------|------|---------|-------------|
/// | `CRMCHECK_DUPCHECK_URL` | string | `http://localhost:3000/api/duplicates/check` | Lookup endpoint |
/// | `CRMCHECK_DUPCHECK_DEBOUNCE_MS` | u64 | `500` | Quiet period before a lookup is issued |
/// | `CRMCHECK_DUPCHECK_TIMEOUT_SECS` | u64 | `10` | Per-request timeout |
///
/// # Example
///
/// ```rust
/// use crmcheck::DuplicateCheckConfig;
/// use std::time::Duration;
///
/// let config = DuplicateCheckConfig::default();
/// assert_eq!(config.debounce, Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateCheckConfig {
    /// URL the lookup request is posted to.
    pub endpoint: String,

    /// Quiet period after the last edit before a lookup is issued.
    pub debounce: Duration,

    /// Timeout for a single lookup request.
    pub request_timeout: Duration,

    /// User agent sent with lookup requests.
    pub user_agent: String,
}

impl DuplicateCheckConfig {
    /// Creates a configuration from environment variables.
    ///
    /// Falls back to defaults for any unset or unparsable variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies `CRMCHECK_DUPCHECK_*` environment overrides on top of `self`.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("CRMCHECK_DUPCHECK_URL") {
            if !url.trim().is_empty() {
                self.endpoint = url;
            }
        }

        if let Some(ms) = std::env::var("CRMCHECK_DUPCHECK_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.debounce = Duration::from_millis(ms);
        }

        if let Some(secs) = std::env::var("CRMCHECK_DUPCHECK_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.request_timeout = Duration::from_secs(secs);
        }

        self
    }

    /// Applies values from a config file section.
    #[must_use]
    pub fn with_file_settings(mut self, settings: &DuplicateCheckSettings) -> Self {
        if let Some(ref endpoint) = settings.endpoint {
            self.endpoint.clone_from(endpoint);
        }
        if let Some(ms) = settings.debounce_ms {
            self.debounce = Duration::from_millis(ms);
        }
        if let Some(secs) = settings.timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        self
    }

    /// Builder method to set the endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Builder method to set the debounce window.
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Builder method to set the request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for DuplicateCheckConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            debounce: Duration::from_millis(500),
            request_timeout: Duration::from_secs(10),
            user_agent: format!("crmcheck/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// `[duplicates]` section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DuplicateCheckSettings {
    /// Lookup endpoint.
    pub endpoint: Option<String>,
    /// Debounce window in milliseconds.
    pub debounce_ms: Option<u64>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}
