//! MorphoSource API operations.
//!
//! - [`fetch`]: page aggregation and single-record envelope unwrapping
//! - [`download`]: the download-URL exchange and bundle byte streaming
//! - [`MorphoSource`]: typed search/get/download facade over both
//!
//! # Errors
//!
//! Every operation returns [`ApiError`]. The same HTTP 404 means different
//! things depending on where it came from: a single-record fetch turns it into
//! [`ApiError::NotFound`], the download exchange into
//! [`ApiError::RestrictedDownload`], and pagination passes it through as
//! [`ApiError::Http`]. Nothing is retried.

mod client;
pub mod download;
pub mod fetch;

pub use client::MorphoSource;

/// Errors that can occur when talking to the MorphoSource API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-success HTTP status not otherwise interpreted
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Connection or body read failure
    #[error("Network error: {0}")]
    Network(String),

    /// Response did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Single record lookup returned 404
    #[error("{0}")]
    NotFound(String),

    /// Download exchange returned 404: the media exists but the key may not download it
    #[error("{0}")]
    RestrictedDownload(String),

    /// Invalid client or download configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error while writing a download
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status code, for transport failures
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn is_http_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(format!("JSON: {}", err))
    }
}
