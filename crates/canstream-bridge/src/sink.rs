//! The "deliver value to UI state" capability the bridge is built against.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

/// Name of the notification the target element receives.
pub const INPUT_EVENT: &str = "input";

/// A generic "input changed" notification for one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputNotification {
    /// Identifier of the element the notification is addressed to.
    pub target: String,
    /// The decoded message, passed through untouched.
    pub detail: Value,
}

impl InputNotification {
    pub fn new(target: impl Into<String>, detail: Value) -> Self {
        Self {
            target: target.into(),
            detail,
        }
    }

    pub fn kind(&self) -> &'static str {
        INPUT_EVENT
    }
}

/// Result of handing a notification to a [`Sink`].
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Delivered,
    /// The target does not exist right now; the notification is handed
    /// back so the caller can apply its missing-target policy.
    TargetAbsent(InputNotification),
}

/// Delivers notifications to the UI.
///
/// Implementations resolve the target on every call; the bridge never
/// caches a reference to it.
pub trait Sink: Send {
    fn deliver(&self, notification: InputNotification) -> Delivery;
}

impl<F> Sink for F
where
    F: Fn(InputNotification) -> Delivery + Send,
{
    fn deliver(&self, notification: InputNotification) -> Delivery {
        self(notification)
    }
}

/// Sink backed by an unbounded channel. The target exists for as long as
/// the receiving half is alive.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<InputNotification>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<InputNotification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Sink for ChannelSink {
    fn deliver(&self, notification: InputNotification) -> Delivery {
        match self.tx.send(notification) {
            Ok(()) => Delivery::Delivered,
            Err(mpsc::error::SendError(notification)) => Delivery::TargetAbsent(notification),
        }
    }
}
