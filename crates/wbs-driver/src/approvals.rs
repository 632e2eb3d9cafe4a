//! Persisted approval state
//!
//! When an individual's run would delete or complete nodes, the driver
//! applies everything else, stores the pending lists and the changes made so
//! far on the project root, and returns. A later [`SyncDriver::approve`] call
//! picks the state back up, so approval survives restarts.
//!
//! [`SyncDriver::approve`]: crate::SyncDriver::approve

use serde::{Deserialize, Serialize};
use tracing::warn;
use wbs_hierarchy::{DataStore, Value};
use wbs_model::HierarchyPath;
use wbs_sync::Change;

pub const PENDING_DELETIONS: &str = "Sync_Pending_Deletions";
pub const PENDING_COMPLETIONS: &str = "Sync_Pending_Completions";
/// Changes applied by the suspended run, one JSON object per entry
pub const PENDING_CHANGES: &str = "Sync_Pending_Changes";

/// Destructive operations waiting for the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingApprovals {
    pub deletions: Vec<HierarchyPath>,
    pub completions: Vec<HierarchyPath>,
}

impl PendingApprovals {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.completions.is_empty()
    }

    /// Total pending operations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.deletions.len() + self.completions.len()
    }
}

/// The user's answer to a [`PendingApprovals`] request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub deletions: Vec<HierarchyPath>,
    pub completions: Vec<HierarchyPath>,
}

impl ApprovalDecision {
    /// Approve everything that is pending
    #[must_use]
    pub fn approve_all(pending: &PendingApprovals) -> Self {
        Self {
            deletions: pending.deletions.clone(),
            completions: pending.completions.clone(),
        }
    }

    /// Approve nothing
    #[must_use]
    pub fn deny_all() -> Self {
        Self::default()
    }
}

/// A run suspended at the approval point
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SuspendedRun {
    pub(crate) pending: PendingApprovals,
    pub(crate) changes: Vec<Change>,
}

impl SuspendedRun {
    pub(crate) fn load<S: DataStore + ?Sized>(store: &S, root: &HierarchyPath) -> Self {
        let paths = |name: &str| -> Vec<HierarchyPath> {
            list(store, root, name)
                .iter()
                .filter_map(|p| p.parse().ok())
                .collect()
        };
        let changes = list(store, root, PENDING_CHANGES)
            .into_iter()
            .map(|entry| {
                serde_json::from_str(&entry).unwrap_or_else(|e| {
                    warn!(%root, error = %e, "unreadable pending change");
                    Change::Message { text: entry }
                })
            })
            .collect();
        Self {
            pending: PendingApprovals {
                deletions: paths(PENDING_DELETIONS),
                completions: paths(PENDING_COMPLETIONS),
            },
            changes,
        }
    }

    pub(crate) fn save<S: DataStore + ?Sized>(&self, store: &S, root: &HierarchyPath) {
        let paths = |items: &[HierarchyPath]| Some(Value::List(items.iter().map(ToString::to_string).collect()));
        store.put_value(root, PENDING_DELETIONS, paths(&self.pending.deletions));
        store.put_value(root, PENDING_COMPLETIONS, paths(&self.pending.completions));
        let changes = self
            .changes
            .iter()
            .filter_map(|c| serde_json::to_string(c).ok())
            .collect();
        store.put_value(root, PENDING_CHANGES, Some(Value::List(changes)));
    }

    pub(crate) fn clear<S: DataStore + ?Sized>(store: &S, root: &HierarchyPath) {
        for name in [PENDING_DELETIONS, PENDING_COMPLETIONS, PENDING_CHANGES] {
            store.put_value(root, name, None);
        }
    }
}

fn list<S: DataStore + ?Sized>(store: &S, root: &HierarchyPath, name: &str) -> Vec<String> {
    match store.get_value(root, name) {
        Some(Value::List(items)) => items,
        _ => Vec::new(),
    }
}
