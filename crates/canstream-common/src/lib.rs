//! Shared error, identifier and CAN helper types for the canstream crates.

pub mod can;
pub mod errors;
pub mod id;

pub use can::{format_can_id, parse_can_id};
pub use errors::{CanstreamError, ConfigError};
pub use id::{new_correlation_id, ConnectionId};

pub type Result<T> = std::result::Result<T, CanstreamError>;
