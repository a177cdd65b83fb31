use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use crate::consent::config::{DEFAULT_ACCEPT_ID, DEFAULT_BANNER_ID, DEFAULT_REJECT_ID};
use crate::page::binding::{Activation, ActivationHandler, PageBinding};

#[derive(Default)]
struct Element {
    /// `None` until something sets it; the markup decides the initial look.
    visible: Option<bool>,
    classes: BTreeSet<String>,
    handlers: Vec<ActivationHandler>,
}

#[derive(Default)]
struct PageState {
    elements: HashMap<String, Element>,
    events: Vec<(String, serde_json::Value)>,
    reloads: usize,
}

/// A page that lives entirely in memory.
///
/// Elements are registered by id; activations are simulated with
/// [`HeadlessPage::activate`]. Dispatched events and reloads are recorded so
/// callers can inspect what happened.
#[derive(Default)]
pub struct HeadlessPage {
    state: Mutex<PageState>,
}

impl HeadlessPage {
    /// Creates an empty page with no elements.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a page carrying the stock banner with accept and reject controls.
    pub fn with_stock_banner() -> Self {
        Self::new()
            .with_element(DEFAULT_BANNER_ID)
            .with_element(DEFAULT_ACCEPT_ID)
            .with_element(DEFAULT_REJECT_ID)
    }

    pub fn with_element(self, id: &str) -> Self {
        self.add_element(id);
        self
    }

    pub fn add_element(&self, id: &str) {
        self.state().elements.entry(id.to_string()).or_default();
    }

    pub fn remove_element(&self, id: &str) {
        self.state().elements.remove(id);
    }

    /// Visibility last set on the element; `None` if never set or missing.
    pub fn is_visible(&self, id: &str) -> Option<bool> {
        self.state().elements.get(id).and_then(|e| e.visible)
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.state()
            .elements
            .get(id)
            .is_some_and(|e| e.classes.contains(class))
    }

    pub fn handler_count(&self, id: &str) -> usize {
        self.state().elements.get(id).map_or(0, |e| e.handlers.len())
    }

    /// Simulates activating the element and runs every bound handler in binding order.
    ///
    /// Returns `None` when the element does not exist.
    pub fn activate(&self, id: &str) -> Option<Activation> {
        // Handlers call back into the page, so release the lock before running them.
        let handlers = {
            let state = self.state();
            state.elements.get(id)?.handlers.clone()
        };

        let mut activation = Activation::new(id);
        for handler in handlers {
            handler(&mut activation);
        }
        Some(activation)
    }

    /// All notifications dispatched so far, oldest first.
    pub fn dispatched_events(&self) -> Vec<(String, serde_json::Value)> {
        self.state().events.clone()
    }

    pub fn reload_count(&self) -> usize {
        self.state().reloads
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl PageBinding for HeadlessPage {
    fn has_element(&self, id: &str) -> bool {
        self.state().elements.contains_key(id)
    }

    fn set_visible(&self, id: &str, visible: bool) {
        if let Some(e) = self.state().elements.get_mut(id) {
            e.visible = Some(visible);
        }
    }

    fn set_class(&self, id: &str, class: &str, enabled: bool) {
        if let Some(e) = self.state().elements.get_mut(id) {
            if enabled {
                e.classes.insert(class.to_string());
            } else {
                e.classes.remove(class);
            }
        }
    }

    fn on_activate(&self, id: &str, handler: ActivationHandler) -> bool {
        match self.state().elements.get_mut(id) {
            Some(e) => {
                e.handlers.push(handler);
                true
            }
            None => false,
        }
    }

    fn dispatch_event(&self, name: &str, detail: &serde_json::Value) {
        self.state().events.push((name.to_string(), detail.clone()));
    }

    /// Markup comes back as authored: handlers, visibility and classes are dropped.
    fn reload(&self) {
        let mut state = self.state();
        state.reloads += 1;
        for e in state.elements.values_mut() {
            *e = Element::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn missing_elements_are_ignored() {
        let page = HeadlessPage::new();
        assert!(!page.has_element("banner"));

        page.set_visible("banner", true);
        page.set_class("banner", "shown", true);
        assert_eq!(page.is_visible("banner"), None);
        assert!(!page.has_class("banner", "shown"));
        assert!(!page.on_activate("banner", Arc::new(|_| {})));
        assert!(page.activate("banner").is_none());
    }

    #[test]
    fn visibility_and_classes_toggle() {
        let page = HeadlessPage::new().with_element("banner");
        assert_eq!(page.is_visible("banner"), None);

        page.set_visible("banner", true);
        page.set_class("banner", "shown", true);
        page.set_class("banner", "shown", true);
        assert_eq!(page.is_visible("banner"), Some(true));
        assert!(page.has_class("banner", "shown"));

        page.set_visible("banner", false);
        page.set_class("banner", "shown", false);
        assert_eq!(page.is_visible("banner"), Some(false));
        assert!(!page.has_class("banner", "shown"));
    }

    #[test]
    fn activate_runs_handlers_in_order() {
        let page = HeadlessPage::new().with_element("btn");
        let calls = Arc::new(AtomicUsize::new(0));

        let c = calls.clone();
        page.on_activate("btn", Arc::new(move |_| {
            assert_eq!(c.fetch_add(1, Ordering::SeqCst), 0);
        }));
        let c = calls.clone();
        page.on_activate("btn", Arc::new(move |a| {
            assert_eq!(c.fetch_add(1, Ordering::SeqCst), 1);
            a.prevent_default();
        }));

        let activation = page.activate("btn").unwrap();
        assert_eq!(activation.element_id(), "btn");
        assert!(activation.default_prevented());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn handlers_may_call_back_into_the_page() {
        let page = Arc::new(HeadlessPage::new().with_element("btn").with_element("banner"));
        let p = page.clone();
        page.on_activate("btn", Arc::new(move |_| p.set_visible("banner", false)));

        page.activate("btn");
        assert_eq!(page.is_visible("banner"), Some(false));
    }

    #[test]
    fn reload_resets_markup_state_and_counts() {
        let page = HeadlessPage::with_stock_banner();
        page.set_visible(DEFAULT_BANNER_ID, true);
        page.on_activate(DEFAULT_ACCEPT_ID, Arc::new(|_| {}));
        page.dispatch_event("cookieConsent", &serde_json::json!({}));

        page.reload();

        assert_eq!(page.reload_count(), 1);
        assert!(page.has_element(DEFAULT_BANNER_ID));
        assert_eq!(page.is_visible(DEFAULT_BANNER_ID), None);
        assert_eq!(page.handler_count(DEFAULT_ACCEPT_ID), 0);
        assert_eq!(page.dispatched_events().len(), 1);
    }
}
