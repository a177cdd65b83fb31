//! Durable key/value storage for consent state.
//!
//! This module defines the traits and backends that stand in for a page's
//! **localStorage**: a synchronous, origin-scoped key/value store that
//! survives reloads. The consent manager only ever talks to a single
//! [`StorageArea`]; a [`LocalStore`] mints that area for an origin.
//!
//! # Available types
//!
//! - [`StorageArea`] — Trait for any storage backend (`get_item`, `set_item`, `remove_item`).
//! - [`LocalStore`] — Provisions one area per [`url::Origin`].
//! - [`InMemoryLocalStore`] — Non-persistent store with an optional byte quota.
//! - [`SqliteLocalStore`] — SQLite-backed persistent store (feature `sqlite_local_store`).
//! - [`StorageError`] — Failures a backend reports (quota, disabled storage).
//!
//! # Choosing a backend
//!
//! - For persistence across process restarts, use [`SqliteLocalStore`].
//! - For tests, previews and private browsing, use [`InMemoryLocalStore`].
//!
//! # Example
//!
//! ```no_run
//! use consent_manager::storage::{LocalStore, SqliteLocalStore};
//!
//! let store = SqliteLocalStore::new("local.db").unwrap();
//! let origin = url::Url::parse("https://example.com").unwrap().origin();
//! let area = store.area(&origin).unwrap();
//! area.set_item("greeting", "hello").unwrap();
//! ```

/// Storage area module, defining the key/value storage interface.
pub mod area;
/// Errors raised by storage backends.
pub mod errors;

/// Local storage module, providing origin-scoped storage areas.
pub mod local {
    /// In-memory local storage implementation.
    pub mod in_memory;
    /// SQLite-backed local storage implementation.
    #[cfg(feature = "sqlite_local_store")]
    pub mod sqlite_store;
}

pub use area::{LocalStore, StorageArea};
pub use errors::StorageError;
pub use local::in_memory::InMemoryLocalStore;
#[cfg(feature = "sqlite_local_store")]
pub use local::sqlite_store::SqliteLocalStore;
