//! Persistent stream client: one background task per connection that
//! reconnects with backoff and feeds every message through a [`Bridge`].
//!
//! [`Bridge`]: crate::bridge::Bridge

mod connection;
mod handle;
mod types;


pub use handle::StreamClient;
pub use types::{ClientConfig, StreamEvent};
