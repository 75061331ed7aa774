//! Utility modules supporting API operations.
//!
//! - [`Transport`]: the HTTP capability every API call goes through
//! - [`HttpClient`]: reqwest-backed [`Transport`]
//! - [`MockTransport`]: recording in-memory [`Transport`] for tests
//!
//! # HTTP Client
//!
//! ```rust,no_run
//! use morphosource::utils::{HttpClient, Transport};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let params = vec![("q".to_string(), "Fruitadens".to_string())];
//! let body = client
//!     .get_json("https://www.morphosource.org/api/media", &params)
//!     .await?;
//! println!("{}", body["response"]["pages"]);
//! # Ok(())
//! # }
//! ```

mod http;
pub mod mock;

pub use http::{ByteStream, HttpClient, QueryParams, Transport};
pub use mock::{MockTransport, RecordedRequest};
