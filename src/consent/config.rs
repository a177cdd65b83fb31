//! Consent manager configuration.
//!
//! `ConsentConfig` names the storage key, the page elements and the event the
//! [`ConsentManager`](crate::consent::ConsentManager) works with, and how long a
//! decision stays valid.
//!
//! `ConsentConfig` provides the defaults a stock page uses via [`Default`] and a
//! fluent [`ConsentConfig::builder()`] for customization with validation.
//!
//! # Examples
//!
//! ## Use defaults
//! ```rust
//! use consent_manager::consent::ConsentConfig;
//! let cfg = ConsentConfig::default();
//! assert_eq!(cfg.storage_key, "acceltra_cookie_consent");
//! assert_eq!(cfg.expiry, time::Duration::days(365));
//! ```
//!
//! ## Customize with the builder
//! ```rust
//! use consent_manager::consent::ConsentConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ConsentConfig::builder()
//!     .storage_key("shop_consent")
//!     .expiry_days(180)
//!     .banner_id("consent-banner")
//!     .build()?; // returns Result<ConsentConfig, ConsentConfigError>
//! # Ok(()) }
//! ```
//!
//! # Fields (summary)
//! - `storage_key`: Key of the single storage entry holding the record.
//! - `expiry`: How long a saved decision stays valid (default: 365 days).
//! - `banner_id`: Element id of the banner container. Without it the manager disables itself.
//! - `accept_id` / `reject_id`: Element ids of the optional accept/reject controls.
//! - `visible_class`: Presentation class toggled together with banner visibility.
//! - `event_name`: Name of the page-wide notification carrying consent changes.

use std::fmt;
use time::Duration;

pub const DEFAULT_STORAGE_KEY: &str = "acceltra_cookie_consent";
pub const DEFAULT_EXPIRY_DAYS: i64 = 365;
pub const DEFAULT_BANNER_ID: &str = "flowappz-cookie-consent";
pub const DEFAULT_ACCEPT_ID: &str = "flowappz-cookie-consent-approve";
pub const DEFAULT_REJECT_ID: &str = "flowappz-cookie-consent-reject";
pub const DEFAULT_VISIBLE_CLASS: &str = "cookie-consent-visible";
pub const DEFAULT_EVENT_NAME: &str = "cookieConsent";

#[derive(Debug, Clone, PartialEq)]
pub struct ConsentConfig {
    pub storage_key: String,
    pub expiry: Duration,
    pub banner_id: String,
    pub accept_id: String,
    pub reject_id: String,
    pub visible_class: String,
    pub event_name: String,
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            expiry: Duration::days(DEFAULT_EXPIRY_DAYS),
            banner_id: DEFAULT_BANNER_ID.to_string(),
            accept_id: DEFAULT_ACCEPT_ID.to_string(),
            reject_id: DEFAULT_REJECT_ID.to_string(),
            visible_class: DEFAULT_VISIBLE_CLASS.to_string(),
            event_name: DEFAULT_EVENT_NAME.to_string(),
        }
    }
}

impl ConsentConfig {
    pub fn builder() -> ConsentConfigBuilder {
        ConsentConfigBuilder::default()
    }
}

/// Builder for [`ConsentConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConsentConfigBuilder {
    inner: ConsentConfig,
}

impl ConsentConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut ConsentConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn storage_key<S: Into<String>>(self, key: S) -> Self { self.map(|c| c.storage_key = key.into()) }
    pub fn expiry(self, expiry: Duration) -> Self { self.map(|c| c.expiry = expiry) }
    /// Saturates at `Duration::MAX` / `Duration::MIN` instead of overflowing.
    pub fn expiry_days(self, days: i64) -> Self { self.map(|c| c.expiry = days_saturating(days)) }
    pub fn banner_id<S: Into<String>>(self, id: S) -> Self { self.map(|c| c.banner_id = id.into()) }
    pub fn accept_id<S: Into<String>>(self, id: S) -> Self { self.map(|c| c.accept_id = id.into()) }
    pub fn reject_id<S: Into<String>>(self, id: S) -> Self { self.map(|c| c.reject_id = id.into()) }
    pub fn visible_class<S: Into<String>>(self, class: S) -> Self { self.map(|c| c.visible_class = class.into()) }
    pub fn event_name<S: Into<String>>(self, name: S) -> Self { self.map(|c| c.event_name = name.into()) }

    /// Apply multiple changes in one go.
    pub fn with(self, f: impl FnOnce(&mut ConsentConfig)) -> Self { self.map(f) }

    /// Validate and build the final config.
    pub fn build(self) -> Result<ConsentConfig, ConsentConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

fn days_saturating(days: i64) -> Duration {
    match days.checked_mul(86_400) {
        Some(secs) => Duration::seconds(secs),
        None if days < 0 => Duration::MIN,
        None => Duration::MAX,
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq)]
pub enum ConsentConfigError {
    EmptyStorageKey,
    EmptyBannerId,
    EmptyEventName,
    NonPositiveExpiry(Duration),
}

impl fmt::Display for ConsentConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsentConfigError::EmptyStorageKey =>
                write!(f, "storage_key must not be empty"),
            ConsentConfigError::EmptyBannerId =>
                write!(f, "banner_id must not be empty"),
            ConsentConfigError::EmptyEventName =>
                write!(f, "event_name must not be empty"),
            ConsentConfigError::NonPositiveExpiry(d) =>
                write!(f, "expiry {d} must be positive"),
        }
    }
}
impl std::error::Error for ConsentConfigError {}

pub(crate) fn validate(c: &ConsentConfig) -> Result<(), ConsentConfigError> {
    if c.storage_key.is_empty() {
        return Err(ConsentConfigError::EmptyStorageKey);
    }
    if c.banner_id.is_empty() {
        return Err(ConsentConfigError::EmptyBannerId);
    }
    if c.event_name.is_empty() {
        return Err(ConsentConfigError::EmptyEventName);
    }
    if !c.expiry.is_positive() {
        return Err(ConsentConfigError::NonPositiveExpiry(c.expiry));
    }
    Ok(())
}
