//! Delivery into an embedded web page.
//!
//! The element lookup happens page-side: the generated snippet queries
//! the DOM each time it runs and does nothing when the element is absent.

use std::io::Write;
use std::sync::Mutex;

use canstream_bridge::sink::{Delivery, InputNotification, Sink, INPUT_EVENT};
use canstream_config::schema::TargetConfig;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("no page attached")]
    Detached,
    #[error("script evaluation failed: {0}")]
    Eval(String),
}

/// Runs JavaScript in the page hosting the target element.
pub trait ScriptEvaluator: Send {
    fn evaluate(&self, script: &str) -> Result<(), ScriptError>;
}

impl<F> ScriptEvaluator for F
where
    F: Fn(&str) -> Result<(), ScriptError> + Send,
{
    fn evaluate(&self, script: &str) -> Result<(), ScriptError> {
        self(script)
    }
}

/// Writes each script as one line for a host process that evaluates them,
/// e.g. stdout piped into a page driver.
pub struct LineEvaluator<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> LineEvaluator<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<W: Write + Send> ScriptEvaluator for LineEvaluator<W> {
    fn evaluate(&self, script: &str) -> Result<(), ScriptError> {
        let mut out = self.out.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        writeln!(out, "{script}")
            .and_then(|()| out.flush())
            .map_err(|e| ScriptError::Eval(e.to_string()))
    }
}

/// JS snippet that dispatches an `"input"` CustomEvent carrying `detail`
/// on the element `#element_id` under `root_selector`. The id is passed
/// through `CSS.escape`, so ids like `"1can"` or `"a.b"` still match.
pub fn input_event_script(root_selector: &str, element_id: &str, detail: &Value) -> String {
    let root_json = serde_json::to_string(&format!("{root_selector} #"))
        .unwrap_or_else(|_| "\"#\"".to_string());
    let id_json = serde_json::to_string(element_id).unwrap_or_else(|_| "\"\"".to_string());
    let event_json = serde_json::to_string(INPUT_EVENT).unwrap_or_else(|_| "\"input\"".to_string());
    let detail_json = serde_json::to_string(detail).unwrap_or_else(|_| "null".to_string());
    format!(
        "(function() {{ var el = document.querySelector({root_json} + CSS.escape({id_json})); \
         if (el) {{ el.dispatchEvent(new CustomEvent({event_json}, {{ detail: {detail_json} }})); }} }})();"
    )
}

/// [`Sink`] that turns each notification into a dispatch snippet.
pub struct ScriptSink<E> {
    root_selector: String,
    evaluator: E,
}

impl<E: ScriptEvaluator> ScriptSink<E> {
    pub fn new(root_selector: impl Into<String>, evaluator: E) -> Self {
        Self {
            root_selector: root_selector.into(),
            evaluator,
        }
    }

    /// Sink for the configured `root_selector`.
    pub fn from_config(target: &TargetConfig, evaluator: E) -> Self {
        Self::new(target.root_selector.clone(), evaluator)
    }
}

impl<E: ScriptEvaluator> Sink for ScriptSink<E> {
    fn deliver(&self, notification: InputNotification) -> Delivery {
        let script = input_event_script(&self.root_selector, &notification.target, &notification.detail);
        match self.evaluator.evaluate(&script) {
            Ok(()) => Delivery::Delivered,
            Err(e) => {
                debug!(error = %e, target_id = %notification.target, "Script delivery failed");
                Delivery::TargetAbsent(notification)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn script_targets_element_under_root() {
        let script = input_event_script("[data-dash-react-root]", "can-store", &json!({"id": "0x1A0"}));
        assert!(script.contains(
            r#"document.querySelector("[data-dash-react-root] #" + CSS.escape("can-store"))"#
        ));
        assert!(script.contains(r#"new CustomEvent("input", { detail: {"id":"0x1A0"} })"#));
        assert!(script.contains("if (el)"));
    }

    #[test]
    fn element_id_is_css_escaped_page_side() {
        let script = input_event_script("body", "1can.store", &json!(null));
        assert!(script.contains(r#"CSS.escape("1can.store")"#));
        assert!(!script.contains("#1can.store"));

        let script = input_event_script("body", "a\"b", &json!(null));
        assert!(script.contains(r#"CSS.escape("a\"b")"#));
    }

    #[test]
    fn detail_is_escaped_as_json() {
        let script = input_event_script("body", "x", &json!("</script>\"quoted\""));
        assert!(script.contains(r#"detail: "</script>\"quoted\"""#));
    }

    #[test]
    fn sink_evaluates_one_script_per_notification() {
        let scripts = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&scripts);
        let sink = ScriptSink::new("[data-dash-react-root]", move |s: &str| -> Result<(), ScriptError> {
            recorded.lock().unwrap().push(s.to_string());
            Ok(())
        });

        let n = InputNotification::new("can-store", json!([1, 2, 3]));
        assert_eq!(sink.deliver(n), Delivery::Delivered);

        let scripts = scripts.lock().unwrap();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("detail: [1,2,3]"));
    }

    #[test]
    fn line_evaluator_writes_one_script_per_line() {
        let target = TargetConfig {
            root_selector: "#app".into(),
            ..Default::default()
        };
        let evaluator = LineEvaluator::new(Vec::new());
        let sink = ScriptSink::from_config(&target, evaluator);

        sink.deliver(InputNotification::new("can-store", json!({"n": 1})));
        sink.deliver(InputNotification::new("can-store", json!({"n": 2})));

        let out = String::from_utf8(sink.evaluator.into_inner()).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(r##"document.querySelector("#app #" + CSS.escape("can-store"))"##));
        assert!(lines[1].contains(r#"detail: {"n":2}"#));
    }

    #[test]
    fn detached_page_hands_notification_back() {
        let sink = ScriptSink::new("body", |_: &str| -> Result<(), ScriptError> {
            Err(ScriptError::Detached)
        });
        let n = InputNotification::new("can-store", json!(null));
        assert_eq!(sink.deliver(n.clone()), Delivery::TargetAbsent(n));
    }
}
