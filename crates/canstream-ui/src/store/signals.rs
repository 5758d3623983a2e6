use std::collections::HashMap;

use canstream_common::parse_can_id;
use canstream_config::schema::{default_signals, SignalConfig, SignalFormat};
use serde::Serialize;
use tracing::warn;

use super::frame::CanFrame;

/// Human-readable decoding of one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub text: String,
    pub value: Option<f64>,
}

impl Interpretation {
    fn note(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: None,
        }
    }
}

/// Signal database keyed by arbitration id.
#[derive(Debug, Clone)]
pub struct SignalMap {
    signals: HashMap<u32, SignalConfig>,
}

impl Default for SignalMap {
    fn default() -> Self {
        Self::from_config(&default_signals())
    }
}

impl SignalMap {
    pub fn from_config(signals: &[SignalConfig]) -> Self {
        let mut map = HashMap::new();
        for signal in signals {
            match parse_can_id(&signal.id) {
                Some(id) => {
                    map.insert(id, signal.clone());
                }
                None => warn!(id = %signal.id, "Skipping signal with unparseable id"),
            }
        }
        Self { signals: map }
    }

    pub fn get(&self, id: u32) -> Option<&SignalConfig> {
        self.signals.get(&id)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Decode the leading bytes of `frame` with its signal definition.
    pub fn interpret(&self, frame: &CanFrame) -> Interpretation {
        let Some(id) = frame.id.value() else {
            return Interpretation::note(format!("(decode error: invalid id {})", frame.id.key()));
        };
        let Some(signal) = self.get(id) else {
            return Interpretation::note("(unknown)");
        };
        let raw = match frame.data.as_ref().map(|d| d.bytes()) {
            Some(Ok(raw)) => raw,
            Some(Err(e)) => return Interpretation::note(format!("(decode error: {e})")),
            None => return Interpretation::note("(decode error: missing data)"),
        };
        if raw.len() < signal.format.size() {
            return Interpretation::note("(short data)");
        }

        let value = decode(signal.format, &raw) * signal.scale;
        Interpretation {
            text: format!("{}: {:.2} {}", signal.signal, value, signal.unit),
            value: Some(value),
        }
    }
}

/// Caller guarantees `raw` holds at least `format.size()` bytes.
fn decode(format: SignalFormat, raw: &[u8]) -> f64 {
    match format {
        SignalFormat::U16be => f64::from(u16::from_be_bytes([raw[0], raw[1]])),
        SignalFormat::I16be => f64::from(i16::from_be_bytes([raw[0], raw[1]])),
        SignalFormat::U8 => f64::from(raw[0]),
        SignalFormat::I8 => f64::from(raw[0] as i8),
    }
}
