use anyhow::Result;
use std::sync::Arc;

/// Object-safe key/value storage area (DOM's Storage).
///
/// Reads are fallible so callers can tell "nothing stored" (`Ok(None)`) apart
/// from "storage is broken" (`Err(_)`).
pub trait StorageArea: Send + Sync {
    /// Retrieves the value associated with the given key, or `None` if not found.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Sets the value for the given key, overwriting any existing value.
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removes the item with the given key. Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Store for localStorage-like areas (one shared area per origin).
pub trait LocalStore: Send + Sync {
    /// Retrieves the storage area for the given origin.
    ///
    /// Calling this twice for the same origin yields areas that observe the same data.
    fn area(&self, origin: &url::Origin) -> Result<Arc<dyn StorageArea>>;
}
