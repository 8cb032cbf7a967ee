//! Client configuration.
//!
//! Every knob lives in [`ClientConfig`], built through
//! [`ClientConfigBuilder`]. The service location comes from the
//! `ALLERGEN_API_URL` environment variable when the caller does not set it.

use crate::error::ExtractError;
use std::path::PathBuf;

/// Environment variable holding the extraction service base URL.
pub const API_URL_ENV: &str = "ALLERGEN_API_URL";

/// Base URL used when [`API_URL_ENV`] is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Hard upper bound for one extraction request, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the extraction client.
///
/// # Example
/// ```rust
/// use allergen_extract::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .base_url("https://extract.example.com/")
///     .timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url, "https://extract.example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service root without a trailing slash. Default: `$ALLERGEN_API_URL`
    /// or `http://localhost:8000`.
    pub base_url: String,

    /// Request budget measured from request start. Default: 60.
    ///
    /// On expiry the request is abandoned and reported as a timeout even if
    /// the transport would eventually complete.
    pub timeout_secs: u64,

    /// Directory the JSON export is written to. Default: current directory.
    pub export_dir: PathBuf,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            export_dir: PathBuf::from("."),
            user_agent: concat!("allergen-extract/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Defaults with the base URL taken from the environment.
    pub fn from_env() -> Result<Self, ExtractError> {
        Self::builder().base_url_from_env().build()
    }

    /// Full URL of the extraction endpoint.
    pub fn extract_url(&self) -> String {
        format!("{}/extract", self.base_url)
    }

    /// Full URL of the health endpoint.
    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = normalise_base_url(&url.into());
        self
    }

    /// Use `$ALLERGEN_API_URL` if it is set and non-empty.
    pub fn base_url_from_env(self) -> Self {
        match std::env::var(API_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => self.base_url(url),
            _ => self,
        }
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.export_dir = dir.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, ExtractError> {
        let c = &self.config;
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(ExtractError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.timeout_secs == 0 {
            return Err(ExtractError::InvalidConfig(
                "Timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

fn normalise_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
