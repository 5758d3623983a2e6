//! UI-side targets for the stream bridge.
//!
//! Two ways to reach an element: an in-process [`ElementRegistry`] looked up
//! on every delivery, or a [`ScriptSink`] that renders a DOM dispatch snippet
//! for an embedded page. [`CanLogStore`] is the element the dashboard binds
//! to the stream.

pub mod registry;
pub mod script;
pub mod store;

pub use registry::{Element, ElementRegistry, RegistrySink};
pub use script::{input_event_script, LineEvaluator, ScriptError, ScriptEvaluator, ScriptSink};
pub use store::{CanFrame, CanLogStore, FrameData, FrameId, Interpretation, SignalMap, StoreUpdate};
