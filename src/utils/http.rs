//! HTTP transport used by every API call.
//!
//! [`Transport`] is the seam between the fetch/download logic and the wire.
//! [`HttpClient`] is the reqwest-backed implementation; tests use
//! [`MockTransport`](crate::utils::MockTransport).

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::api::ApiError;
use crate::config::Config;

/// Body of a streamed GET, yielded in whatever chunk sizes the server sends.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ApiError>>;

/// Query parameters in the order they are sent.
pub type QueryParams = [(String, String)];

/// Minimal HTTP capability the client needs.
///
/// Implementations must turn any non-2xx status into
/// [`ApiError::Http`] carrying the status code, and must not retry.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// GET `url` with query parameters and decode the JSON body.
    async fn get_json(&self, url: &str, params: &QueryParams) -> Result<Value, ApiError>;

    /// POST a JSON body with a raw `Authorization` header and decode the JSON reply.
    async fn post_json(
        &self,
        url: &str,
        authorization: &str,
        body: &Value,
    ) -> Result<Value, ApiError>;

    /// GET `url` with a raw `Authorization` header and stream the body.
    async fn get_stream(&self, url: &str, authorization: &str) -> Result<ByteStream, ApiError>;
}

/// Shared HTTP client with sensible defaults
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    request_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, ApiError> {
        Self::from_config(&Config::default())
    }

    /// Create a client honouring the user agent and timeout in `config`
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        // No overall timeout on the client itself: bundle streams can run long.
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            request_timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    async fn decode(url: &str, response: Response) -> Result<Value, ApiError> {
        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("Invalid JSON from {}: {}", url, e)))
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get_json(&self, url: &str, params: &QueryParams) -> Result<Value, ApiError> {
        let request = self
            .client
            .get(url)
            .query(params)
            .timeout(self.request_timeout);
        let response = self.send(url, request).await?;
        Self::decode(url, response).await
    }

    async fn post_json(
        &self,
        url: &str,
        authorization: &str,
        body: &Value,
    ) -> Result<Value, ApiError> {
        let request = self
            .client
            .post(url)
            .header(AUTHORIZATION, authorization)
            .json(body)
            .timeout(self.request_timeout);
        let response = self.send(url, request).await?;
        Self::decode(url, response).await
    }

    async fn get_stream(&self, url: &str, authorization: &str) -> Result<ByteStream, ApiError> {
        let request = self.client.get(url).header(AUTHORIZATION, authorization);
        let response = self.send(url, request).await?;

        let stream = response.bytes_stream().map(|chunk| {
            chunk
                .map(|bytes| bytes.to_vec())
                .map_err(|e| ApiError::Network(format!("Download stream failed: {}", e)))
        });

        Ok(stream.boxed())
    }
}
