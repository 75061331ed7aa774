//! # MorphoSource
//!
//! A client for the [MorphoSource](https://www.morphosource.org) REST API:
//! search media and physical objects, fetch single records, and download
//! media bundles.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`api`]: paginated search, record fetch, download exchange and streaming
//! - [`models`]: typed records, search parameters and the download attestation
//! - [`utils`]: the HTTP [`Transport`](utils::Transport) and its test double
//! - [`config`]: configuration management
//!
//! ```rust,no_run
//! use morphosource::{MediaSearch, MorphoSource};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), morphosource::ApiError> {
//! let client = MorphoSource::new()?;
//! let results = client.search_media(&MediaSearch::new("Fruitadens")).await?;
//! for media in &results.items {
//!     println!("{:?} {:?}", media.id, media.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod models;
pub mod utils;

// Re-export commonly used types
pub use api::{ApiError, MorphoSource};
pub use config::Config;
pub use models::{
    DownloadConfig, Media, MediaSearch, ObjectSearch, PhysicalObject, SearchResults,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
