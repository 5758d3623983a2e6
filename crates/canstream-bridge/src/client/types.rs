//! Configuration and event/command enums for the stream client.

use std::time::Duration;

use canstream_common::ConnectionId;
use canstream_config::schema::{ReconnectConfig, StreamConfig};
use canstream_config::CanstreamConfig;
use serde::Serialize;

use crate::sse::DEFAULT_EVENT_TYPE;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Only events of this type reach the bridge.
    pub event_name: String,
    pub reconnect: ReconnectConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            event_name: DEFAULT_EVENT_TYPE.to_string(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(stream: &StreamConfig, reconnect: &ReconnectConfig) -> Self {
        Self {
            event_name: stream.event_name.clone(),
            reconnect: reconnect.clone(),
        }
    }

    pub fn from_config(config: &CanstreamConfig) -> Self {
        Self::new(&config.stream, &config.reconnect)
    }
}

// ---------------------------------------------------------------------------
// Events & Commands
// ---------------------------------------------------------------------------

/// Lifecycle events emitted by the background connection task.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A stream is open. Each connection gets a fresh id.
    Connected { connection: ConnectionId },
    /// An open stream ended.
    Disconnected { reason: String },
    /// Waiting `delay` before dialing attempt number `attempt`.
    Reconnecting { attempt: u32, delay: Duration },
    /// A payload could not be decoded and was skipped.
    DecodeFailed { error: String },
    /// The target was absent under the error policy.
    TargetMissing { element: String },
    /// Opening or reading the stream failed.
    Error { message: String },
    /// The task has exited. Always the last event.
    Stopped,
}

/// Commands sent from [`StreamClient`](super::StreamClient) to the task.
#[derive(Debug)]
pub(crate) enum StreamCommand {
    /// Deliver buffered notifications now that the target may exist.
    ReplayPending,
    Stop,
}
