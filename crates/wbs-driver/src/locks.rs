//! Per-project serialization
//!
//! Two live passes against the same project root must never overlap. Passes
//! on different roots, and read-only checks, run freely.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use wbs_model::HierarchyPath;

/// Mutex per project root path
#[derive(Debug, Default)]
pub struct ProjectLocks {
    locks: DashMap<HierarchyPath, Arc<Mutex<()>>>,
}

impl ProjectLocks {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `root`
    pub async fn lock(&self, root: &HierarchyPath) -> OwnedMutexGuard<()> {
        let mutex = self.mutex(root);
        mutex.lock_owned().await
    }

    /// Exclusive access to `root` if nobody holds it
    #[must_use]
    pub fn try_lock(&self, root: &HierarchyPath) -> Option<OwnedMutexGuard<()>> {
        self.mutex(root).try_lock_owned().ok()
    }

    fn mutex(&self, root: &HierarchyPath) -> Arc<Mutex<()>> {
        self.locks.entry(root.clone()).or_default().value().clone()
    }
}
