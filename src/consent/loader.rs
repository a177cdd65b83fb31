use super::record::{Category, ConsentRecord};
use anyhow::Result;

/// Collaborator that injects third-party scripts for one cookie category.
///
/// The manager only decides *whether* a loader runs; what it loads is up to
/// the implementation (an analytics tag, a marketing pixel, ...).
pub trait ScriptLoader: Send + Sync {
    /// Category the loaded scripts belong to.
    fn category(&self) -> Category;

    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Loads the scripts. Only called when `record` grants [`ScriptLoader::category`].
    fn load(&self, record: &ConsentRecord) -> Result<()>;
}
