use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use log::{debug, error, info, warn};

use super::clock::{Clock, SystemClock};
use super::config::{self, ConsentConfig, ConsentConfigError};
use super::errors::ConsentError;
use super::event::{ConsentAction, ConsentBus, ConsentEvent, Subscription};
use super::loader::ScriptLoader;
use super::record::{Category, ConsentRecord};
use crate::page::{Activation, ActivationHandler, PageBinding};
use crate::storage::StorageArea;

/// Banner state as last applied by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerState {
    /// The page has no banner element; the manager is disabled.
    Missing,
    /// No valid consent; the visitor is being asked.
    Visible,
    /// Valid consent is present.
    Hidden,
}

/// Records, persists and applies a visitor's cookie consent for one page.
///
/// The page bootstrap builds one manager per page load and hands clones of the
/// `Arc` to whoever needs to ask about consent.
pub struct ConsentManager {
    config: ConsentConfig,
    storage: Arc<dyn StorageArea>,
    page: Arc<dyn PageBinding>,
    clock: Arc<dyn Clock>,
    loaders: Vec<Arc<dyn ScriptLoader>>,
    bus: ConsentBus,
    banner: Mutex<Option<BannerState>>,
    listeners_attached: AtomicBool,
}

impl ConsentManager {
    /// Creates a manager with the given configuration and the system clock.
    pub fn new(
        config: ConsentConfig,
        storage: Arc<dyn StorageArea>,
        page: Arc<dyn PageBinding>,
    ) -> Result<Arc<Self>, ConsentConfigError> {
        Self::builder(storage, page).config(config).build()
    }

    /// Entry point to start building a manager.
    pub fn builder(storage: Arc<dyn StorageArea>, page: Arc<dyn PageBinding>) -> ConsentManagerBuilder {
        ConsentManagerBuilder {
            config: None,
            storage,
            page,
            clock: None,
            loaders: Vec::new(),
        }
    }

    pub fn config(&self) -> &ConsentConfig {
        &self.config
    }

    /// Subscribe to consent changes made through this manager.
    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe()
    }

    /// Banner state last applied, or `None` before [`ConsentManager::init`] ran.
    pub fn banner_state(&self) -> Option<BannerState> {
        *self.banner_slot()
    }

    /// Decides the initial banner state for this page load.
    ///
    /// With valid consent the banner is hidden and script loaders run. Without
    /// it the banner is shown and the accept/reject controls are bound.
    pub fn init(self: &Arc<Self>) -> BannerState {
        if !self.page.has_element(&self.config.banner_id) {
            debug!("No consent banner #{} on page, consent manager disabled", self.config.banner_id);
            self.set_banner_state(BannerState::Missing);
            return BannerState::Missing;
        }

        match self.get_consent() {
            Some(record) => {
                self.hide_banner();
                self.load_scripts(&record);
                BannerState::Hidden
            }
            None => {
                self.show_banner();
                self.attach_event_listeners();
                BannerState::Visible
            }
        }
    }

    /// Reads the stored record.
    ///
    /// `Ok(None)` means the visitor has not decided (or the decision expired, in
    /// which case the stale entry is erased). A record without a timestamp never
    /// expires. Errors distinguish unreadable data from unavailable storage.
    pub fn load_consent(&self) -> Result<Option<ConsentRecord>, ConsentError> {
        let key = &self.config.storage_key;
        let Some(raw) = self.storage.get_item(key)? else {
            return Ok(None);
        };

        let mut record: ConsentRecord = serde_json::from_str(&raw).map_err(ConsentError::Parse)?;

        if record.is_expired(self.clock.now(), self.config.expiry) {
            info!("Stored consent expired, removing it");
            if let Err(e) = self.storage.remove_item(key) {
                warn!("Error removing expired consent: {e}");
            }
            return Ok(None);
        }

        record.essential = true;
        Ok(Some(record))
    }

    /// Reads the stored record, treating any failure as "no consent".
    pub fn get_consent(&self) -> Option<ConsentRecord> {
        match self.load_consent() {
            Ok(record) => record,
            Err(e) => {
                error!("Error reading consent: {e}");
                None
            }
        }
    }

    /// Stamps `record` with the current time and writes it to storage.
    ///
    /// The stamp is applied even when the write fails.
    pub fn save_consent(&self, record: &mut ConsentRecord) -> Result<(), ConsentError> {
        record.essential = true;
        record.stamp(self.clock.now());

        let json = serde_json::to_string(record).map_err(ConsentError::Serialize)?;
        self.storage.set_item(&self.config.storage_key, &json)?;
        debug!("Saved consent {json}");
        Ok(())
    }

    /// Returns whether the named category is granted.
    ///
    /// `"essential"` is always granted. Other categories need a valid record
    /// that grants them; unknown names are never granted.
    pub fn has_consent(&self, category: &str) -> bool {
        match category.parse::<Category>() {
            Ok(category) => self.has_category(category),
            Err(e) => {
                debug!("{e}");
                false
            }
        }
    }

    pub fn has_category(&self, category: Category) -> bool {
        if category == Category::Essential {
            return true;
        }
        self.get_consent().is_some_and(|record| record.allows(category))
    }

    /// Grants every category.
    pub fn accept_all(&self) -> ConsentRecord {
        self.apply(ConsentAction::Accepted, ConsentRecord::accept_all())
    }

    /// Grants essential cookies only.
    pub fn reject_all(&self) -> ConsentRecord {
        self.apply(ConsentAction::Rejected, ConsentRecord::reject_all())
    }

    fn apply(&self, action: ConsentAction, mut record: ConsentRecord) -> ConsentRecord {
        info!("Visitor {action} cookies");
        if let Err(e) = self.save_consent(&mut record) {
            error!("Error saving consent: {e}");
        }

        self.hide_banner();
        self.load_scripts(&record);
        self.dispatch_consent_event(action, &record);
        record
    }

    pub fn show_banner(&self) {
        self.toggle_banner(true);
    }

    pub fn hide_banner(&self) {
        self.toggle_banner(false);
    }

    fn toggle_banner(&self, visible: bool) {
        let id = &self.config.banner_id;
        if !self.page.has_element(id) {
            return;
        }

        self.page.set_visible(id, visible);
        self.page.set_class(id, &self.config.visible_class, visible);
        self.set_banner_state(if visible { BannerState::Visible } else { BannerState::Hidden });
    }

    /// Binds the accept and reject controls. Only the first call on a manager binds anything.
    pub fn attach_event_listeners(self: &Arc<Self>) {
        if self.listeners_attached.swap(true, Ordering::SeqCst) {
            debug!("Consent listeners already attached");
            return;
        }

        self.bind_control(&self.config.accept_id, ConsentAction::Accepted);
        self.bind_control(&self.config.reject_id, ConsentAction::Rejected);
    }

    fn bind_control(self: &Arc<Self>, id: &str, action: ConsentAction) {
        // Weak: the page holds the handler and must not keep the manager alive.
        let manager: Weak<Self> = Arc::downgrade(self);
        let handler: ActivationHandler = Arc::new(move |activation: &mut Activation| {
            activation.prevent_default();
            let Some(manager) = manager.upgrade() else {
                return;
            };
            match action {
                ConsentAction::Accepted => manager.accept_all(),
                ConsentAction::Rejected => manager.reject_all(),
            };
        });

        if id.is_empty() || !self.page.on_activate(id, handler) {
            debug!("No control #{id} on page, nothing to bind for {action}");
        }
    }

    /// Runs the script loaders whose category `record` grants, in registration order.
    pub fn load_scripts(&self, record: &ConsentRecord) {
        for loader in &self.loaders {
            let category = loader.category();
            if !record.allows(category) {
                debug!("Skipping {} scripts from {}, no consent", category, loader.name());
                continue;
            }

            info!("Loading {} scripts from {}", category, loader.name());
            if let Err(e) = loader.load(record) {
                error!("Script loader {} failed: {e:#}", loader.name());
            }
        }
    }

    /// Notifies the page and in-process subscribers of a consent change.
    pub fn dispatch_consent_event(&self, action: ConsentAction, record: &ConsentRecord) {
        let event = ConsentEvent {
            action,
            consent: record.clone(),
        };

        match serde_json::to_value(&event) {
            Ok(detail) => self.page.dispatch_event(&self.config.event_name, &detail),
            Err(e) => error!("Error serializing consent event: {e}"),
        }
        self.bus.publish(event);
    }

    /// Erases the stored record and reloads the page so the visitor is asked again.
    ///
    /// The page reloads even when erasing fails.
    pub fn reset_consent(&self) -> Result<(), ConsentError> {
        let result = self
            .storage
            .remove_item(&self.config.storage_key)
            .map_err(ConsentError::from);

        match &result {
            Ok(()) => info!("Consent reset"),
            Err(e) => error!("Error resetting consent: {e}"),
        }

        self.page.reload();
        result
    }

    fn banner_slot(&self) -> std::sync::MutexGuard<'_, Option<BannerState>> {
        match self.banner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn set_banner_state(&self, state: BannerState) {
        *self.banner_slot() = Some(state);
    }
}

/// Builder for [`ConsentManager`].
pub struct ConsentManagerBuilder {
    config: Option<ConsentConfig>,
    storage: Arc<dyn StorageArea>,
    page: Arc<dyn PageBinding>,
    clock: Option<Arc<dyn Clock>>,
    loaders: Vec<Arc<dyn ScriptLoader>>,
}

impl ConsentManagerBuilder {
    pub fn config(mut self, cfg: ConsentConfig) -> Self {
        self.config = Some(cfg);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Registers a script loader. Loaders run in registration order.
    pub fn loader(mut self, loader: Arc<dyn ScriptLoader>) -> Self {
        self.loaders.push(loader);
        self
    }

    /// Validates the configuration and builds the manager.
    pub fn build(self) -> Result<Arc<ConsentManager>, ConsentConfigError> {
        let config = self.config.unwrap_or_default();
        config::validate(&config)?;

        Ok(Arc::new(ConsentManager {
            config,
            storage: self.storage,
            page: self.page,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            loaders: self.loaders,
            bus: ConsentBus::default(),
            banner: Mutex::new(None),
            listeners_attached: AtomicBool::new(false),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consent::clock::FixedClock;
    use crate::page::HeadlessPage;
    use crate::storage::{InMemoryLocalStore, LocalStore};
    use time::macros::datetime;
    use time::OffsetDateTime;

    const KEY: &str = "acceltra_cookie_consent";
    const NOW: OffsetDateTime = datetime!(2026-10-19 09:30:00 UTC);

    struct Fixture {
        storage: Arc<dyn StorageArea>,
        page: Arc<HeadlessPage>,
        clock: Arc<FixedClock>,
        manager: Arc<ConsentManager>,
    }

    fn fixture_with(store: &dyn LocalStore) -> Fixture {
        let origin = url::Url::parse("https://example.com").unwrap().origin();
        let storage = store.area(&origin).unwrap();
        let page = Arc::new(HeadlessPage::with_stock_banner());
        let clock = Arc::new(FixedClock::new(NOW));
        let manager = ConsentManager::builder(storage.clone(), page.clone())
            .clock(clock.clone())
            .build()
            .unwrap();
        Fixture { storage, page, clock, manager }
    }

    fn fixture() -> Fixture {
        fixture_with(&InMemoryLocalStore::new())
    }

    #[test]
    fn save_then_load_returns_stamped_record() {
        let f = fixture();
        let mut rec = ConsentRecord::new(true, false);
        rec.timestamp = Some(datetime!(1999-01-01 00:00 UTC));

        f.manager.save_consent(&mut rec).unwrap();
        assert_eq!(rec.timestamp, Some(NOW));

        let loaded = f.manager.load_consent().unwrap().unwrap();
        assert_eq!(loaded, rec);
        assert!(loaded.essential);
    }

    #[test]
    fn save_forces_essential() {
        let f = fixture();
        let mut rec = ConsentRecord::reject_all();
        rec.essential = false;
        f.manager.save_consent(&mut rec).unwrap();

        let raw = f.storage.get_item(KEY).unwrap().unwrap();
        let stored: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored["essential"], serde_json::json!(true));
    }

    #[test]
    fn stored_essential_false_reads_as_true() {
        let f = fixture();
        f.storage
            .set_item(KEY, r#"{"essential":false,"analytics":true,"marketing":false,"timestamp":"2026-10-01T00:00:00.000Z"}"#)
            .unwrap();

        let rec = f.manager.get_consent().unwrap();
        assert!(rec.essential);
        assert!(rec.analytics);
    }

    #[test]
    fn nothing_stored_is_no_consent() {
        let f = fixture();
        assert!(f.manager.load_consent().unwrap().is_none());
        assert!(f.manager.get_consent().is_none());
    }

    #[test]
    fn corrupt_value_is_a_parse_error_and_left_alone() {
        let f = fixture();
        f.storage.set_item(KEY, "{not json").unwrap();

        assert!(matches!(f.manager.load_consent(), Err(ConsentError::Parse(_))));
        assert!(f.manager.get_consent().is_none());
        assert!(f.storage.get_item(KEY).unwrap().is_some());
    }

    #[test]
    fn record_without_timestamp_is_kept() {
        let f = fixture();
        f.storage
            .set_item(KEY, r#"{"essential":true,"analytics":true,"marketing":true}"#)
            .unwrap();

        f.clock.advance(time::Duration::days(10_000));
        let rec = f.manager.load_consent().unwrap().unwrap();
        assert_eq!(rec.timestamp, None);
        assert!(f.manager.has_consent("analytics"));
        assert_eq!(f.manager.init(), BannerState::Hidden);
    }

    #[test]
    fn far_future_timestamp_does_not_panic() {
        let f = fixture();
        f.storage
            .set_item(KEY, r#"{"essential":true,"analytics":true,"marketing":true,"timestamp":"9999-12-31T00:00:00.000Z"}"#)
            .unwrap();

        assert!(f.manager.get_consent().is_some());
        assert!(f.manager.has_consent("marketing"));
        assert_eq!(f.manager.init(), BannerState::Hidden);
    }

    #[test]
    fn wrongly_typed_flag_only_denies_that_category() {
        let f = fixture();
        f.storage
            .set_item(KEY, r#"{"essential":true,"analytics":"yes","marketing":true,"timestamp":"2026-10-01T00:00:00.000Z"}"#)
            .unwrap();

        assert_eq!(f.manager.init(), BannerState::Hidden);
        assert!(!f.manager.has_consent("analytics"));
        assert!(f.manager.has_consent("marketing"));
    }

    #[test]
    fn build_rejects_invalid_config() {
        let f = fixture();
        let config = ConsentConfig {
            expiry: time::Duration::ZERO,
            ..ConsentConfig::default()
        };
        let res = ConsentManager::new(config, f.storage.clone(), f.page.clone());
        assert!(matches!(res, Err(ConsentConfigError::NonPositiveExpiry(_))));

        let config = ConsentConfig {
            storage_key: String::new(),
            ..ConsentConfig::default()
        };
        let res = ConsentManager::builder(f.storage.clone(), f.page.clone()).config(config).build();
        assert!(matches!(res, Err(ConsentConfigError::EmptyStorageKey)));
    }

    #[test]
    fn disabled_storage_is_reported_as_unavailable() {
        let f = fixture_with(&InMemoryLocalStore::disabled());
        let err = f.manager.load_consent().unwrap_err();
        assert!(err.is_storage());
        assert!(f.manager.get_consent().is_none());

        let mut rec = ConsentRecord::accept_all();
        let err = f.manager.save_consent(&mut rec).unwrap_err();
        assert!(err.is_storage());
        assert_eq!(rec.timestamp, Some(NOW));
    }

    #[test]
    fn expiry_is_checked_against_the_clock() {
        let f = fixture();
        f.manager.accept_all();

        f.clock.advance(time::Duration::days(365));
        assert!(f.manager.get_consent().is_some());

        f.clock.advance(time::Duration::milliseconds(1));
        assert!(f.manager.get_consent().is_none());
        assert!(f.storage.get_item(KEY).unwrap().is_none());
    }

    #[test]
    fn custom_expiry_is_honoured() {
        let f = fixture();
        let manager = ConsentManager::builder(f.storage.clone(), f.page.clone())
            .config(ConsentConfig::builder().expiry_days(30).build().unwrap())
            .clock(f.clock.clone())
            .build()
            .unwrap();

        manager.reject_all();
        f.clock.advance(time::Duration::days(31));
        assert!(manager.get_consent().is_none());
    }

    #[test]
    fn has_consent_rules() {
        let f = fixture();
        assert!(f.manager.has_consent("essential"));
        assert!(!f.manager.has_consent("analytics"));
        assert!(!f.manager.has_consent("marketing"));

        f.manager.accept_all();
        assert!(f.manager.has_consent("analytics"));
        assert!(f.manager.has_consent("marketing"));
        assert!(!f.manager.has_consent("timestamp"));
        assert!(!f.manager.has_consent("Analytics"));

        f.manager.reject_all();
        assert!(f.manager.has_consent("essential"));
        assert!(!f.manager.has_consent("marketing"));
        assert!(!f.manager.has_category(Category::Analytics));
    }

    #[test]
    fn banner_toggles_visibility_and_class() {
        let f = fixture();
        let banner = &f.manager.config().banner_id;
        let class = &f.manager.config().visible_class;

        f.manager.show_banner();
        f.manager.show_banner();
        assert_eq!(f.page.is_visible(banner), Some(true));
        assert!(f.page.has_class(banner, class));
        assert_eq!(f.manager.banner_state(), Some(BannerState::Visible));

        f.manager.hide_banner();
        assert_eq!(f.page.is_visible(banner), Some(false));
        assert!(!f.page.has_class(banner, class));
        assert_eq!(f.manager.banner_state(), Some(BannerState::Hidden));
    }

    #[test]
    fn banner_ops_without_banner_are_noops() {
        let store = InMemoryLocalStore::new();
        let origin = url::Url::parse("https://example.com").unwrap().origin();
        let page = Arc::new(HeadlessPage::new());
        let manager =
            ConsentManager::new(ConsentConfig::default(), store.area(&origin).unwrap(), page.clone()).unwrap();

        manager.show_banner();
        manager.hide_banner();
        assert_eq!(manager.banner_state(), None);
    }

    #[test]
    fn listeners_bind_once() {
        let f = fixture();
        f.manager.attach_event_listeners();
        f.manager.attach_event_listeners();

        assert_eq!(f.page.handler_count(&f.manager.config().accept_id), 1);
        assert_eq!(f.page.handler_count(&f.manager.config().reject_id), 1);
    }

    #[test]
    fn dropped_manager_makes_handlers_inert() {
        let f = fixture();
        f.manager.attach_event_listeners();
        let accept_id = f.manager.config().accept_id.clone();
        drop(f.manager);

        let activation = f.page.activate(&accept_id).unwrap();
        assert!(activation.default_prevented());
        assert!(f.storage.get_item(KEY).unwrap().is_none());
    }

    #[test]
    fn reset_erases_and_reloads() {
        let f = fixture();
        f.manager.accept_all();

        f.manager.reset_consent().unwrap();
        assert!(f.manager.get_consent().is_none());
        assert_eq!(f.page.reload_count(), 1);
    }

    #[test]
    fn reset_reloads_even_when_storage_fails() {
        let f = fixture_with(&InMemoryLocalStore::disabled());
        assert!(f.manager.reset_consent().unwrap_err().is_storage());
        assert_eq!(f.page.reload_count(), 1);
    }
}
