use serde::{Deserialize, Serialize};

/// What to do with a message when the target element does not exist yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicyKind {
    /// Discard silently.
    #[default]
    Drop,
    /// Hold up to `buffer_capacity` messages and replay them once the
    /// target shows up.
    Buffer,
    /// Report the miss as an error; the stream keeps running.
    Error,
}

/// How notifications reach the target element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// In-process element registry; the built-in CAN log is the target.
    #[default]
    Registry,
    /// One JavaScript dispatch snippet per notification, written to stdout
    /// for the page host to evaluate. Uses `root_selector`.
    Script,
}

/// The UI element that receives input notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub element_id: String,
    /// Selector of the root the element is rendered under.
    pub root_selector: String,
    pub delivery: DeliveryMode,
    pub missing_policy: MissingPolicyKind,
    pub buffer_capacity: u32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            element_id: "can-store".into(),
            root_selector: "[data-dash-react-root]".into(),
            delivery: DeliveryMode::Registry,
            missing_policy: MissingPolicyKind::Drop,
            buffer_capacity: 256,
        }
    }
}
