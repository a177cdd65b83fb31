//! Page binding: the slice of a web page the consent manager touches.
//!
//! The manager never owns page markup. It looks elements up by id, toggles
//! their visibility, binds activation handlers and dispatches notifications,
//! all through [`PageBinding`]. Hosts plug in whatever drives their page; the
//! crate ships [`HeadlessPage`], an in-process page used by tests, demos and
//! server-side previews.

/// Page binding trait and activation types.
pub mod binding;
/// In-process page implementation.
pub mod headless;

pub use binding::{Activation, ActivationHandler, PageBinding};
pub use headless::HeadlessPage;
