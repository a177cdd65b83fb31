use std::sync::Arc;

/// Handler invoked when an element is activated (clicked, tapped, key-pressed).
pub type ActivationHandler = Arc<dyn Fn(&mut Activation) + Send + Sync>;

/// A single activation of a page element, handed to every bound handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    element_id: String,
    default_prevented: bool,
}

impl Activation {
    pub fn new(element_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            default_prevented: false,
        }
    }

    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// Suppresses the element's own activation behavior (following a link, submitting a form).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Capabilities the consent manager needs from the page.
///
/// All calls are synchronous and are made from the page's UI thread.
/// Implementations must not hold internal locks while running activation
/// handlers, since handlers call back into the binding.
pub trait PageBinding: Send + Sync {
    /// Returns whether an element with this id exists.
    fn has_element(&self, id: &str) -> bool;

    /// Shows or hides the element. No-op when the element is missing.
    fn set_visible(&self, id: &str, visible: bool);

    /// Adds or removes a presentation class. No-op when the element is missing.
    fn set_class(&self, id: &str, class: &str, enabled: bool);

    /// Binds `handler` to activations of the element.
    ///
    /// Returns `false` (and binds nothing) when the element is missing.
    fn on_activate(&self, id: &str, handler: ActivationHandler) -> bool;

    /// Dispatches a page-wide notification any page script can listen for.
    fn dispatch_event(&self, name: &str, detail: &serde_json::Value);

    /// Reloads the page.
    fn reload(&self);
}
