//! Decode-and-notify: the per-message step of the stream bridge.

use std::collections::VecDeque;

use serde_json::Value;
use tracing::{debug, warn};

use crate::policy::MissingTargetPolicy;
use crate::sink::{Delivery, InputNotification, Sink};

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("target element {element:?} not found")]
    TargetMissing { element: String },
}

/// What happened to one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Delivered to the target, after `replayed` held-back messages.
    Delivered { replayed: usize },
    /// Target absent, message discarded.
    Dropped,
    /// Target absent, message held. `pending` is the buffer length.
    Buffered { pending: usize },
}

/// Forwards decoded payloads to one named target through a [`Sink`].
pub struct Bridge {
    target: String,
    sink: Box<dyn Sink>,
    policy: MissingTargetPolicy,
    pending: VecDeque<InputNotification>,
}

impl Bridge {
    pub fn new(target: impl Into<String>, sink: impl Sink + 'static, policy: MissingTargetPolicy) -> Self {
        Self {
            target: target.into(),
            sink: Box::new(sink),
            policy,
            pending: VecDeque::new(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn policy(&self) -> MissingTargetPolicy {
        self.policy
    }

    /// Number of notifications held back under the buffer policy.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Decode `raw` and notify the target.
    ///
    /// A malformed payload delivers nothing and leaves the bridge ready
    /// for the next message.
    pub fn on_message(&mut self, raw: &str) -> Result<Outcome, BridgeError> {
        let detail: Value = serde_json::from_str(raw)?;
        let notification = InputNotification::new(self.target.as_str(), detail);

        let replayed = self.flush_pending();
        if !self.pending.is_empty() {
            // Still absent; keep arrival order behind what is already held.
            return Ok(self.hold(notification));
        }

        match self.sink.deliver(notification) {
            Delivery::Delivered => Ok(Outcome::Delivered { replayed }),
            Delivery::TargetAbsent(notification) => self.on_missing(notification),
        }
    }

    /// Try to deliver held-back notifications now. Returns how many went out.
    pub fn replay_pending(&mut self) -> usize {
        let replayed = self.flush_pending();
        if replayed > 0 {
            debug!(target_id = %self.target, replayed, "Replayed buffered messages");
        }
        replayed
    }

    fn flush_pending(&mut self) -> usize {
        let mut replayed = 0;
        while let Some(notification) = self.pending.pop_front() {
            match self.sink.deliver(notification) {
                Delivery::Delivered => replayed += 1,
                Delivery::TargetAbsent(notification) => {
                    self.pending.push_front(notification);
                    break;
                }
            }
        }
        replayed
    }

    fn on_missing(&mut self, notification: InputNotification) -> Result<Outcome, BridgeError> {
        match self.policy {
            MissingTargetPolicy::Drop => {
                debug!(target_id = %self.target, "Target absent, message dropped");
                Ok(Outcome::Dropped)
            }
            MissingTargetPolicy::Buffer { .. } => Ok(self.hold(notification)),
            MissingTargetPolicy::Error => Err(BridgeError::TargetMissing {
                element: self.target.clone(),
            }),
        }
    }

    fn hold(&mut self, notification: InputNotification) -> Outcome {
        let capacity = match self.policy {
            MissingTargetPolicy::Buffer { capacity } => capacity.max(1),
            _ => 1,
        };
        if self.pending.len() >= capacity {
            self.pending.pop_front();
            warn!(target_id = %self.target, capacity, "Pending buffer full, oldest message evicted");
        }
        self.pending.push_back(notification);
        Outcome::Buffered {
            pending: self.pending.len(),
        }
    }
}
