//! In-memory transport for testing purposes.

use async_trait::async_trait;
use futures_util::stream;
use futures_util::StreamExt;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::api::ApiError;
use crate::utils::http::{ByteStream, QueryParams, Transport};

/// A request observed by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedRequest {
    Get {
        url: String,
        params: Vec<(String, String)>,
    },
    Post {
        url: String,
        authorization: String,
        body: Value,
    },
    Stream {
        url: String,
        authorization: String,
    },
}

impl RecordedRequest {
    pub fn url(&self) -> &str {
        match self {
            RecordedRequest::Get { url, .. }
            | RecordedRequest::Post { url, .. }
            | RecordedRequest::Stream { url, .. } => url,
        }
    }

    /// Value of a query parameter on a GET request.
    pub fn param(&self, name: &str) -> Option<&str> {
        match self {
            RecordedRequest::Get { params, .. } => params
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str()),
            _ => None,
        }
    }
}

/// A transport that replays queued responses in order and records every request.
///
/// JSON replies (for `get_json`/`post_json`) and stream replies (for
/// `get_stream`) are kept in separate queues. An exhausted queue yields a
/// [`ApiError::Parse`] naming the URL, never a status the client would map.
#[derive(Debug, Default)]
pub struct MockTransport {
    json_replies: Mutex<VecDeque<Result<Value, ApiError>>>,
    stream_replies: Mutex<VecDeque<Result<Vec<Result<Vec<u8>, ApiError>>, ApiError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON body for the next GET/POST.
    pub fn push_json(&self, body: Value) {
        self.json_replies.lock().unwrap().push_back(Ok(body));
    }

    /// Queue an HTTP failure for the next GET/POST.
    pub fn push_status(&self, status: u16) {
        self.json_replies.lock().unwrap().push_back(Err(ApiError::Http {
            status,
            url: "mock".to_string(),
        }));
    }

    /// Queue the chunks of the next streamed body.
    pub fn push_stream(&self, chunks: Vec<Vec<u8>>) {
        self.stream_replies
            .lock()
            .unwrap()
            .push_back(Ok(chunks.into_iter().map(Ok).collect()));
    }

    /// Queue a streamed body whose items may fail part-way.
    pub fn push_stream_items(&self, items: Vec<Result<Vec<u8>, ApiError>>) {
        self.stream_replies.lock().unwrap().push_back(Ok(items));
    }

    /// Queue an HTTP failure for the next streamed GET.
    pub fn push_stream_status(&self, status: u16) {
        self.stream_replies.lock().unwrap().push_back(Err(ApiError::Http {
            status,
            url: "mock".to_string(),
        }));
    }

    /// Every request issued so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn record(&self, request: RecordedRequest) {
        self.requests.lock().unwrap().push(request);
    }

    fn next_json(&self, url: &str) -> Result<Value, ApiError> {
        self.json_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(no_reply(url)))
    }
}

fn no_reply(url: &str) -> ApiError {
    ApiError::Parse(format!("MockTransport has no reply queued for {}", url))
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_json(&self, url: &str, params: &QueryParams) -> Result<Value, ApiError> {
        self.record(RecordedRequest::Get {
            url: url.to_string(),
            params: params.to_vec(),
        });
        self.next_json(url)
    }

    async fn post_json(
        &self,
        url: &str,
        authorization: &str,
        body: &Value,
    ) -> Result<Value, ApiError> {
        self.record(RecordedRequest::Post {
            url: url.to_string(),
            authorization: authorization.to_string(),
            body: body.clone(),
        });
        self.next_json(url)
    }

    async fn get_stream(&self, url: &str, authorization: &str) -> Result<ByteStream, ApiError> {
        self.record(RecordedRequest::Stream {
            url: url.to_string(),
            authorization: authorization.to_string(),
        });
        let reply = self
            .stream_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(no_reply(url)))?;
        Ok(stream::iter(reply).boxed())
    }
}
