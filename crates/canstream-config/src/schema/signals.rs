use serde::{Deserialize, Serialize};

/// Binary layout of a signal at the start of a frame's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalFormat {
    /// Big-endian unsigned 16-bit.
    U16be,
    /// Big-endian signed 16-bit.
    I16be,
    U8,
    I8,
}

impl SignalFormat {
    /// Bytes consumed from the front of the payload.
    pub fn size(self) -> usize {
        match self {
            Self::U16be | Self::I16be => 2,
            Self::U8 | Self::I8 => 1,
        }
    }
}

/// One entry of the CAN signal database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Arbitration id, hex (`0x100`) or decimal.
    pub id: String,
    /// Module name shown on the per-machine view.
    pub name: String,
    pub signal: String,
    pub format: SignalFormat,
    pub scale: f64,
    pub unit: String,
}

impl SignalConfig {
    fn new(id: &str, name: &str, signal: &str, format: SignalFormat, scale: f64, unit: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            signal: signal.into(),
            format,
            scale,
            unit: unit.into(),
        }
    }
}

/// Signal database used when the config file does not define `[[signals]]`.
pub fn default_signals() -> Vec<SignalConfig> {
    vec![
        SignalConfig::new("0x100", "Engine Module", "RPM", SignalFormat::U16be, 0.125, "RPM"),
        SignalConfig::new("0x200", "Battery Module", "Voltage", SignalFormat::U16be, 0.1, "V"),
        SignalConfig::new("0x300", "Cooling Module", "Temperature", SignalFormat::I8, 1.0, "°C"),
    ]
}
