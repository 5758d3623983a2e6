use canstream_common::{format_can_id, parse_can_id};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Arbitration id as sent: hex text (`"0x1A0"`) or a plain number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameId {
    Number(u32),
    Text(String),
}

impl FrameId {
    pub fn value(&self) -> Option<u32> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => parse_can_id(s),
        }
    }

    /// Key the log groups frames by: canonical hex when the id parses,
    /// the raw text otherwise.
    pub fn key(&self) -> String {
        match (self.value(), self) {
            (Some(id), _) => format_can_id(id),
            (None, Self::Text(s)) => s.clone(),
            (None, Self::Number(n)) => n.to_string(),
        }
    }
}

/// Payload bytes as sent: space-separated hex (`"1A FF"`) or an array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameData {
    Bytes(Vec<u8>),
    Hex(String),
}

impl FrameData {
    pub fn bytes(&self) -> Result<Vec<u8>, String> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::Hex(text) => text
                .split_whitespace()
                .map(|b| u8::from_str_radix(b, 16).map_err(|_| format!("invalid hex byte {b:?}")))
                .collect(),
        }
    }

    /// Uppercase space-separated hex, the form the log table shows.
    pub fn to_hex(&self) -> String {
        match self {
            Self::Hex(text) => text.split_whitespace().collect::<Vec<_>>().join(" "),
            Self::Bytes(bytes) => bytes
                .iter()
                .map(|b| format!("{b:02X}"))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// One CAN frame as carried in a notification. Unknown fields are kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanFrame {
    pub id: FrameId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<FrameData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dlc: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CanFrame {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    pub fn key(&self) -> String {
        self.id.key()
    }
}
