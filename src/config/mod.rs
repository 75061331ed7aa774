//! Configuration management.

mod file_config;

pub use file_config::{ConfigFile, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::ApiError;
use crate::models::FacetStyle;

/// Public MorphoSource API root
pub const DEFAULT_API_URL: &str = "https://www.morphosource.org/api";

/// Environment variable overriding the API root
pub const API_URL_ENV: &str = "MORPHOSOURCE_API_URL";

/// Environment variable holding the API key used for downloads
pub const API_KEY_ENV: &str = "MORPHOSOURCE_API_KEY";

/// Page size used when a search does not ask for one
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Per-request timeout for JSON calls, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API root, without a trailing slash
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key sent as the raw `Authorization` header on downloads
    #[serde(default)]
    pub api_key: Option<String>,

    /// How facet names are turned into query parameter names
    #[serde(default)]
    pub facet_style: FacetStyle,

    /// Page size when a search does not specify one
    #[serde(default = "default_per_page")]
    pub default_per_page: u32,

    /// Timeout applied to each JSON request
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()),
            facet_style: FacetStyle::default(),
            default_per_page: default_per_page(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Set the API root
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the API key
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the facet naming convention
    pub fn facet_style(mut self, style: FacetStyle) -> Self {
        self.facet_style = style;
        self
    }

    /// API root with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Check values that would only fail later, mid-request
    pub fn validate(&self) -> Result<(), ApiError> {
        url::Url::parse(&self.api_url).map_err(|e| {
            ApiError::InvalidConfig(format!("api_url '{}' is not a URL: {}", self.api_url, e))
        })?;
        if self.default_per_page == 0 {
            return Err(ApiError::InvalidConfig(
                "default_per_page must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ApiError::InvalidConfig(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_api_url() -> String {
    std::env::var(API_URL_ENV)
        .ok()
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string())
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Read a config file with `MORPHOSOURCE_<SECTION>_<KEY>` environment variables on top.
///
/// Only single-word keys can be overridden this way, e.g.
/// `MORPHOSOURCE_API_URL`, `MORPHOSOURCE_API_KEY`, `MORPHOSOURCE_LOGGING_LEVEL`.
pub fn load_config_file(path: &Path) -> Result<ConfigFile, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix("MORPHOSOURCE").separator("_"))
        .build()?;

    settings.try_deserialize()
}

/// Load configuration from a file over the defaults
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    Ok(load_config_file(path)?.apply(Config::default()))
}

/// Look for a config file in the working directory, then the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("morphosource.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("morphosource").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Config {
    Config::default()
}
