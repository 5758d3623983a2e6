use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Reconnect-with-backoff settings for a dropped stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// When false the client stops after the first disconnect.
    pub enabled: bool,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Growth factor applied after every failed attempt.
    pub multiplier: f64,
    /// Fraction of the delay randomised in either direction (0.0-1.0).
    pub jitter: f64,
    /// Consecutive failed attempts before giving up. 0 = never give up.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
            jitter: 0.0,
            max_attempts: 0,
        }
    }
}

impl ReconnectConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn max_attempts(&self) -> Option<u32> {
        (self.max_attempts > 0).then_some(self.max_attempts)
    }
}
