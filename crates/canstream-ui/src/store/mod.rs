//! Rolling CAN frame log fed by input notifications.

mod frame;
mod log;
mod signals;

pub use frame::{CanFrame, FrameData, FrameId};
pub use log::{CanLogStore, StoreUpdate};
pub use signals::{Interpretation, SignalMap};
