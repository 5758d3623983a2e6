use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the event stream lives and how to dial it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Full URL of the server push endpoint.
    pub url: String,
    /// SSE event type forwarded to the target. `"message"` also matches
    /// events sent without an `event:` field.
    pub event_name: String,
    /// Give up on a single connection attempt after this many seconds.
    pub connect_timeout_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8050/stream".into(),
            event_name: "message".into(),
            connect_timeout_secs: 15,
        }
    }
}

impl StreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
