/// Failures reported by storage backends.
///
/// Backends return these wrapped in `anyhow::Error`; callers that care can
/// `downcast_ref::<StorageError>()`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage quota exceeded: {needed} bytes needed, quota is {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Storage is disabled")]
    Disabled,
}
