//! Sync results returned to callers

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use wbs_model::HierarchyPath;
use wbs_sync::{Change, Discrepancy};

use crate::approvals::PendingApprovals;

/// Where a sync invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Nothing to do
    UpToDate,
    /// A check found changes; nothing was applied
    ChangesPending,
    /// Non-destructive changes applied; deletions or completions need approval
    AwaitingApproval,
    /// Changes applied
    Applied,
    /// A one-time template migration must run first
    MigrationNeeded,
    /// The individual's initials are not on the team; nothing was applied
    UnknownInitials,
}

impl SyncStatus {
    /// True when the project still differs from its WBS
    #[inline]
    #[must_use]
    pub fn needs_sync(self) -> bool {
        matches!(
            self,
            Self::ChangesPending | Self::AwaitingApproval | Self::MigrationNeeded | Self::UnknownInitials
        )
    }
}

/// Result of a driver invocation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncReport {
    pub project: HierarchyPath,
    pub status: SyncStatus,
    pub changes: Vec<Change>,
    pub pending: PendingApprovals,
    pub discrepancies: Vec<Discrepancy>,
    /// Team initials → names, when the individual's initials are unknown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_initials: Option<BTreeMap<String, String>>,
}

impl SyncReport {
    #[must_use]
    pub fn new(project: HierarchyPath, status: SyncStatus) -> Self {
        Self {
            project,
            status,
            changes: Vec::new(),
            pending: PendingApprovals::default(),
            discrepancies: Vec::new(),
            known_initials: None,
        }
    }

    #[must_use]
    pub fn with_changes(mut self, changes: Vec<Change>) -> Self {
        self.changes = changes;
        self
    }

    #[must_use]
    pub fn with_pending(mut self, pending: PendingApprovals) -> Self {
        self.pending = pending;
        self
    }

    #[must_use]
    pub fn with_discrepancies(mut self, discrepancies: Vec<Discrepancy>) -> Self {
        self.discrepancies = discrepancies;
        self
    }
}

impl Display for SyncReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.status {
            SyncStatus::UpToDate => writeln!(f, "'{}' is already up to date.", self.project)?,
            SyncStatus::ChangesPending => writeln!(f, "'{}' needs to be synchronized:", self.project)?,
            SyncStatus::AwaitingApproval => writeln!(
                f,
                "'{}' was partially synchronized; {} operation(s) need approval:",
                self.project,
                self.pending.len()
            )?,
            SyncStatus::Applied => writeln!(f, "Synchronized '{}':", self.project)?,
            SyncStatus::MigrationNeeded => {
                writeln!(f, "'{}' must be migrated before it can be synchronized.", self.project)?;
            }
            SyncStatus::UnknownInitials => {
                writeln!(f, "Your initials do not match any member of the '{}' team:", self.project)?;
                for (initials, name) in self.known_initials.iter().flatten() {
                    writeln!(f, "  {initials}  {name}")?;
                }
            }
        }
        for change in &self.changes {
            writeln!(f, "  {change}")?;
        }
        for path in &self.pending.deletions {
            writeln!(f, "  [delete]   {path}")?;
        }
        for path in &self.pending.completions {
            writeln!(f, "  [complete] {path}")?;
        }
        Ok(())
    }
}
