//! Post-sync export hook

use wbs_model::HierarchyPath;

/// Error type exporters report; the driver only logs it
pub type ExportError = Box<dyn std::error::Error + Send + Sync>;

/// Publishes a project's data after a live run changed it
///
/// Runs in a spawned task; the sync result never waits for it.
#[async_trait::async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, project: &HierarchyPath) -> Result<(), ExportError>;
}
