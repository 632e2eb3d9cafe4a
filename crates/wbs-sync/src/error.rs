//! Synchronizer errors
//!
//! Only conditions that stop a whole pass live here. Refused node-level
//! alterations are reported as change entries instead.

use wbs_hierarchy::HierarchyError;
use wbs_model::HierarchyPath;

/// Fatal synchronizer error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The project root is not in the hierarchy
    #[error("project root '{0}' does not exist")]
    ProjectNotFound(HierarchyPath),

    /// The process definition has no phases
    #[error("no phase definitions found for process '{0}'")]
    UnknownProcess(String),

    /// A hierarchy operation outside the per-node diff failed
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}
