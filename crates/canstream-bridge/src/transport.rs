//! Opening the server push connection.
//!
//! [`Transport`] is the seam between the reconnect loop and the network:
//! the loop only ever sees a buffered byte reader, which keeps the loop
//! testable with in-memory streams.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use canstream_config::schema::StreamConfig;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::StatusCode;
use tokio::io::AsyncBufRead;
use tokio_util::io::StreamReader;
use tracing::debug;

/// Byte stream of an open SSE response body.
pub type EventReader = Pin<Box<dyn AsyncBufRead + Send>>;

const LAST_EVENT_ID: &str = "Last-Event-ID";
const EVENT_STREAM: &str = "text/event-stream";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("connection timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("server returned 204 No Content")]
    NoContent,
    #[error("unexpected content type {0:?}")]
    ContentType(String),
}

impl TransportError {
    /// Whether the reconnect loop should try again after this error.
    /// A 204 is the server telling the client to go away.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NoContent)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Open one streaming connection. `last_event_id` is the id of the
    /// last event seen on a previous connection, if any.
    async fn open(&self, last_event_id: Option<&str>) -> Result<EventReader, TransportError>;
}

/// HTTP(S) transport backed by `reqwest`.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    connect_timeout: Duration,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
            connect_timeout,
        })
    }

    pub fn from_config(config: &StreamConfig) -> Result<Self, TransportError> {
        Self::new(config.url.clone(), config.connect_timeout())
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, last_event_id: Option<&str>) -> Result<EventReader, TransportError> {
        let mut request = self
            .client
            .get(&self.url)
            .header(ACCEPT, EVENT_STREAM)
            .header(CACHE_CONTROL, "no-cache");
        if let Some(id) = last_event_id {
            request = request.header(LAST_EVENT_ID, id);
        }

        // Only the handshake is bounded; the body stays open indefinitely.
        let response = tokio::time::timeout(self.connect_timeout, request.send())
            .await
            .map_err(|_| TransportError::Timeout(self.connect_timeout))?
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Err(TransportError::NoContent);
        }
        if status != StatusCode::OK {
            return Err(TransportError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.to_ascii_lowercase().starts_with(EVENT_STREAM) {
            return Err(TransportError::ContentType(content_type));
        }

        debug!(url = %self.url, resumed = last_event_id.is_some(), "Event stream opened");

        let byte_stream = response
            .bytes_stream()
            .map(|result| result.map_err(std::io::Error::other));
        let reader = tokio::io::BufReader::new(StreamReader::new(byte_stream));
        Ok(Box::pin(reader))
    }
}
