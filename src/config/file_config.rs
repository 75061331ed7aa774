//! Configuration file support for morphosource.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! url = "https://www.morphosource.org/api"
//! key = "your-api-key"
//!
//! [search]
//! facet_style = "bracket"
//! per_page = 10
//!
//! [http]
//! timeout_secs = 30
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::Config;
use crate::models::FacetStyle;

/// Configuration file structure
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// API section
    #[serde(default)]
    pub api: ApiSection,

    /// Search section
    #[serde(default)]
    pub search: SearchSection,

    /// HTTP section
    #[serde(default)]
    pub http: HttpSection,

    /// Logging section
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SearchSection {
    #[serde(default)]
    pub facet_style: Option<FacetStyle>,

    #[serde(default)]
    pub per_page: Option<u32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HttpSection {
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub level: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }

    /// Apply the values present in this file over `base`
    pub fn apply(self, base: Config) -> Config {
        let mut config = base;
        if let Some(url) = self.api.url {
            config.api_url = url;
        }
        if let Some(key) = self.api.key {
            config.api_key = Some(key);
        }
        if let Some(style) = self.search.facet_style {
            config.facet_style = style;
        }
        if let Some(per_page) = self.search.per_page {
            config.default_per_page = per_page;
        }
        if let Some(timeout) = self.http.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(agent) = self.http.user_agent {
            config.user_agent = agent;
        }
        config
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}
