//! Forwards server-sent events into a UI element's `"input"` notification.
//!
//! A [`StreamClient`] keeps one SSE connection open (reconnecting with
//! backoff), decodes every `message` event as JSON and hands it to a
//! [`Bridge`], which notifies the target element through a [`Sink`].

pub mod backoff;
pub mod bridge;
pub mod client;
pub mod policy;
pub mod sink;
pub mod sse;
pub mod state;
pub mod transport;

pub use backoff::Backoff;
pub use bridge::{Bridge, BridgeError, Outcome};
pub use client::{ClientConfig, StreamClient, StreamEvent};
pub use policy::MissingTargetPolicy;
pub use sink::{ChannelSink, Delivery, InputNotification, Sink, INPUT_EVENT};
pub use sse::{SseEvent, SseItem, SseParser, SseStream};
pub use state::{ConnectionState, ReconnectMachine, Transition};
pub use transport::{EventReader, HttpTransport, Transport, TransportError};
