//! Cookie consent for a single page.
//!
//! The [`ConsentManager`] records which cookie categories a visitor allows,
//! keeps that decision in origin-scoped storage for a limited time, gates the
//! registered [`ScriptLoader`]s on it and drives the consent banner.
//!
//! # Lifecycle
//!
//! - On page load the host builds a manager and calls [`ConsentManager::init`].
//! - With a valid stored [`ConsentRecord`] the banner is hidden and loaders run.
//! - Otherwise the banner is shown and the accept/reject controls are bound.
//! - Accepting or rejecting saves a new record, hides the banner, runs loaders
//!   and emits a [`ConsentEvent`].
//! - Records expire after [`ConsentConfig::expiry`]; an expired record is erased
//!   on the next read and the visitor is asked again.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use consent_manager::consent::{BannerState, ConsentConfig, ConsentManager};
//! use consent_manager::page::HeadlessPage;
//! use consent_manager::storage::{InMemoryLocalStore, LocalStore};
//!
//! let store = InMemoryLocalStore::new();
//! let origin = url::Url::parse("https://example.com").unwrap().origin();
//! let page = Arc::new(HeadlessPage::with_stock_banner());
//!
//! let manager =
//!     ConsentManager::new(ConsentConfig::default(), store.area(&origin).unwrap(), page.clone()).unwrap();
//! assert_eq!(manager.init(), BannerState::Visible);
//!
//! page.activate("flowappz-cookie-consent-approve");
//! assert!(manager.has_consent("analytics"));
//! ```

/// Clock abstraction.
pub mod clock;
/// Manager configuration.
pub mod config;
/// Consent errors.
pub mod errors;
/// Consent change notifications.
pub mod event;
/// Script loader collaborators.
pub mod loader;
/// The consent manager.
pub mod manager;
/// Consent record and categories.
pub mod record;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConsentConfig, ConsentConfigBuilder, ConsentConfigError};
pub use errors::ConsentError;
pub use event::{ConsentAction, ConsentEvent, Subscription};
pub use loader::ScriptLoader;
pub use manager::{BannerState, ConsentManager, ConsentManagerBuilder};
pub use record::{Category, ConsentRecord, UnknownCategory};
