/// Reasons a stored consent record could not be read or written.
///
/// The UI layer treats every variant as "no consent"; the variants exist so
/// callers can tell a visitor who never decided apart from broken storage.
#[derive(Debug, thiserror::Error)]
pub enum ConsentError {
    #[error("Stored consent is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Consent could not be serialized: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] anyhow::Error),
}

impl ConsentError {
    /// Returns `true` when the failure came from the storage backend rather than the stored data.
    pub fn is_storage(&self) -> bool {
        matches!(self, ConsentError::StorageUnavailable(_))
    }
}
