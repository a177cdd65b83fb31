use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use anyhow::{anyhow, Result};
use crate::storage::area::{LocalStore, StorageArea};
use crate::storage::errors::StorageError;

/// In‑memory local storage (no persistence).
///
/// Used for tests, previews and private browsing. A quota (in bytes, counting
/// keys and values) can be set to mimic browser storage limits, and the store
/// can be created disabled to mimic a page where storage is switched off.
#[derive(Default)]
pub struct InMemoryLocalStore {
    areas: Mutex<HashMap<url::Origin, Arc<dyn StorageArea>>>,
    quota: Option<usize>,
    disabled: bool,
}

impl InMemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose areas refuse writes that would grow them past `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            quota: Some(bytes),
            ..Self::default()
        }
    }

    /// Creates a store whose areas fail every read and write.
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }
}

impl LocalStore for InMemoryLocalStore {
    fn area(&self, origin: &url::Origin) -> Result<Arc<dyn StorageArea>> {
        let mut guard = self
            .areas
            .lock()
            .map_err(|_| anyhow!("local store lock poisoned"))?;

        let quota = self.quota;
        let disabled = self.disabled;
        Ok(guard
            .entry(origin.clone())
            .or_insert_with(|| {
                Arc::new(InMemoryLocalArea {
                    map: Mutex::default(),
                    quota,
                    disabled,
                }) as Arc<dyn StorageArea>
            })
            .clone())
    }
}

struct InMemoryLocalArea {
    map: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
    disabled: bool,
}

impl InMemoryLocalArea {
    fn map(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        if self.disabled {
            return Err(StorageError::Disabled.into());
        }
        self.map.lock().map_err(|_| anyhow!("storage area lock poisoned"))
    }
}

fn used_bytes(map: &HashMap<String, String>) -> usize {
    map.iter().map(|(k, v)| k.len() + v.len()).sum()
}

impl StorageArea for InMemoryLocalArea {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.map()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.map()?;

        if let Some(quota) = self.quota {
            let replaced = map.get(key).map_or(0, |old| key.len() + old.len());
            let needed = used_bytes(&map) - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota }.into());
            }
        }

        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.map()?.remove(key);
        Ok(())
    }
}
