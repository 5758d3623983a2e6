//! Named UI elements that can receive input notifications.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use canstream_bridge::sink::{Delivery, InputNotification, Sink};
use serde_json::Value;
use tracing::debug;

/// Something rendered on the page that reacts to `"input"` notifications.
pub trait Element: Send + Sync {
    fn dispatch_input(&self, detail: &Value);
}

/// Elements currently rendered, keyed by element id.
///
/// Cheap to clone; clones share the same set. Elements come and go at
/// runtime as the UI renders and tears down.
#[derive(Clone, Default)]
pub struct ElementRegistry {
    elements: Arc<RwLock<HashMap<String, Arc<dyn Element>>>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an element, returning the one it replaced.
    pub fn register(
        &self,
        id: impl Into<String>,
        element: Arc<dyn Element>,
    ) -> Option<Arc<dyn Element>> {
        let id = id.into();
        debug!(element = %id, "Element registered");
        self.elements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, element)
    }

    /// Remove an element. Returns true if it existed.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self
            .elements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        if removed {
            debug!(element = %id, "Element removed");
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Element>> {
        self.elements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.elements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self
            .elements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    pub fn count(&self) -> usize {
        self.elements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Remove every element. Used during teardown.
    pub fn clear(&self) {
        self.elements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// [`Sink`] that looks the target up in an [`ElementRegistry`] on every
/// delivery.
#[derive(Clone)]
pub struct RegistrySink {
    registry: ElementRegistry,
}

impl RegistrySink {
    pub fn new(registry: ElementRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }
}

impl Sink for RegistrySink {
    fn deliver(&self, notification: InputNotification) -> Delivery {
        match self.registry.get(&notification.target) {
            Some(element) => {
                element.dispatch_input(&notification.detail);
                Delivery::Delivered
            }
            None => Delivery::TargetAbsent(notification),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canstream_bridge::{Bridge, MissingTargetPolicy, Outcome};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<Value>>,
    }

    impl Element for Recorder {
        fn dispatch_input(&self, detail: &Value) {
            self.seen.lock().unwrap().push(detail.clone());
        }
    }

    #[test]
    fn register_get_remove() {
        let registry = ElementRegistry::new();
        assert!(registry.get("can-store").is_none());

        registry.register("can-store", Arc::new(Recorder::default()));
        assert!(registry.contains("can-store"));
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.ids(), ["can-store"]);

        assert!(registry.remove("can-store"));
        assert!(!registry.remove("can-store"));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn register_replaces_existing() {
        let registry = ElementRegistry::new();
        assert!(registry.register("a", Arc::new(Recorder::default())).is_none());
        assert!(registry.register("a", Arc::new(Recorder::default())).is_some());
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn clones_share_elements() {
        let registry = ElementRegistry::new();
        let other = registry.clone();
        registry.register("a", Arc::new(Recorder::default()));
        assert!(other.contains("a"));
        other.clear();
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn sink_delivers_to_registered_element() {
        let registry = ElementRegistry::new();
        let recorder = Arc::new(Recorder::default());
        registry.register("can-store", recorder.clone());

        let sink = RegistrySink::new(registry);
        let n = InputNotification::new("can-store", json!({"id": "0x1A0"}));
        assert_eq!(sink.deliver(n), Delivery::Delivered);
        assert_eq!(*recorder.seen.lock().unwrap(), [json!({"id": "0x1A0"})]);
    }

    #[test]
    fn sink_hands_back_when_absent() {
        let sink = RegistrySink::new(ElementRegistry::new());
        let n = InputNotification::new("can-store", json!(1));
        assert_eq!(sink.deliver(n.clone()), Delivery::TargetAbsent(n));
    }

    #[test]
    fn target_is_resolved_per_message() {
        let registry = ElementRegistry::new();
        let mut bridge = Bridge::new(
            "can-store",
            RegistrySink::new(registry.clone()),
            MissingTargetPolicy::Drop,
        );

        let first = Arc::new(Recorder::default());
        registry.register("can-store", first.clone());
        bridge.on_message(r#"{"n":1}"#).unwrap();

        // The element is re-rendered; the next message reaches the new one.
        let second = Arc::new(Recorder::default());
        registry.register("can-store", second.clone());
        bridge.on_message(r#"{"n":2}"#).unwrap();

        registry.remove("can-store");
        assert_eq!(bridge.on_message(r#"{"n":3}"#).unwrap(), Outcome::Dropped);

        assert_eq!(*first.seen.lock().unwrap(), [json!({"n": 1})]);
        assert_eq!(*second.seen.lock().unwrap(), [json!({"n": 2})]);
    }

    #[test]
    fn buffered_messages_reach_element_created_later() {
        let registry = ElementRegistry::new();
        let mut bridge = Bridge::new(
            "can-store",
            RegistrySink::new(registry.clone()),
            MissingTargetPolicy::Buffer { capacity: 16 },
        );
        bridge.on_message(r#"{"n":1}"#).unwrap();
        bridge.on_message(r#"{"n":2}"#).unwrap();

        let recorder = Arc::new(Recorder::default());
        registry.register("can-store", recorder.clone());
        assert_eq!(bridge.replay_pending(), 2);
        assert_eq!(
            *recorder.seen.lock().unwrap(),
            [json!({"n": 1}), json!({"n": 2})]
        );
    }
}
