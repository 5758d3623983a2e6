use serde::{Deserialize, Serialize};

/// Rolling CAN frame log kept by the UI store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Oldest frames are evicted past this many entries.
    pub max_entries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { max_entries: 1000 }
    }
}
