//! Configuration schema types for canstream.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod logging;
mod reconnect;
mod signals;
mod store;
mod stream;
mod target;

pub use logging::*;
pub use reconnect::*;
pub use signals::*;
pub use store::*;
pub use stream::*;
pub use target::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
///
/// Every section has defaults that reproduce the stock dashboard setup:
/// stream at `/stream` on port 8050, target element `can-store`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanstreamConfig {
    pub stream: StreamConfig,
    pub reconnect: ReconnectConfig,
    pub target: TargetConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub signals: Vec<SignalConfig>,
}

impl Default for CanstreamConfig {
    fn default() -> Self {
        Self {
            stream: StreamConfig::default(),
            reconnect: ReconnectConfig::default(),
            target: TargetConfig::default(),
            store: StoreConfig::default(),
            logging: LoggingConfig::default(),
            signals: default_signals(),
        }
    }
}
