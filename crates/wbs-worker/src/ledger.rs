//! Bookkeeping shared by every worker
//!
//! Records what a pass did (nodes added, deleted, completed, data changed,
//! renames) and which destructive operations it is allowed to perform.

use std::collections::BTreeSet;

use wbs_model::HierarchyPath;

use crate::names::LAST_SYNCED_SUFFIX;
use wbs_hierarchy::Value;

/// Set of paths a destructive operation may touch
///
/// Paths are compared in their original (pre-rename) form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions(Option<BTreeSet<HierarchyPath>>);

impl Permissions {
    /// Everything is allowed
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self(None)
    }

    /// Only the listed paths are allowed
    #[must_use]
    pub fn only(paths: impl IntoIterator<Item = HierarchyPath>) -> Self {
        Self(Some(paths.into_iter().collect()))
    }

    /// Nothing is allowed
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self(Some(BTreeSet::new()))
    }

    /// Check one path
    #[must_use]
    pub fn allows(&self, path: &HierarchyPath) -> bool {
        self.0.as_ref().map_or(true, |paths| paths.contains(path))
    }

    /// True when `path` is named explicitly; never true for [`Permissions::all`]
    #[must_use]
    pub fn lists(&self, path: &HierarchyPath) -> bool {
        self.0.as_ref().is_some_and(|paths| paths.contains(path))
    }
}

/// A rename performed during the pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRename {
    pub from: HierarchyPath,
    pub to: HierarchyPath,
}

/// Per-pass record of worker activity
#[derive(Debug, Clone, Default)]
pub struct WorkerLedger {
    pub(crate) deletions_allowed: Permissions,
    pub(crate) completions_allowed: Permissions,
    pub(crate) nodes_added: Vec<HierarchyPath>,
    pub(crate) nodes_deleted: Vec<HierarchyPath>,
    pub(crate) nodes_completed: Vec<HierarchyPath>,
    pub(crate) deletions_withheld: Vec<HierarchyPath>,
    pub(crate) completions_withheld: Vec<HierarchyPath>,
    pub(crate) data_changed: Vec<String>,
    pub(crate) renames: Vec<PathRename>,
    pub(crate) last_reverse_synced: Option<Value>,
}

impl WorkerLedger {
    /// Ledger with the given permissions
    #[must_use]
    pub fn new(deletions_allowed: Permissions, completions_allowed: Permissions) -> Self {
        Self {
            deletions_allowed,
            completions_allowed,
            ..Self::default()
        }
    }

    /// Where the node now at `path` lived before this pass
    #[must_use]
    pub fn original_path(&self, path: &HierarchyPath) -> HierarchyPath {
        self.renames.iter().rev().fold(path.clone(), |current, rename| {
            current.rebase(&rename.to, &rename.from).unwrap_or(current)
        })
    }

    pub(crate) fn note_data_changed(&mut self, path: &HierarchyPath, name: &str) {
        if !name.ends_with(LAST_SYNCED_SUFFIX) {
            self.data_changed.push(format!("{path}/{name}"));
        }
    }

    /// Paths that may be deleted
    #[inline]
    #[must_use]
    pub fn deletions_allowed(&self) -> &Permissions {
        &self.deletions_allowed
    }

    /// Nodes created, in current coordinates
    #[inline]
    #[must_use]
    pub fn nodes_added(&self) -> &[HierarchyPath] {
        &self.nodes_added
    }

    /// Nodes deleted, by original path
    #[inline]
    #[must_use]
    pub fn nodes_deleted(&self) -> &[HierarchyPath] {
        &self.nodes_deleted
    }

    /// Nodes marked complete, by original path
    #[inline]
    #[must_use]
    pub fn nodes_completed(&self) -> &[HierarchyPath] {
        &self.nodes_completed
    }

    /// Deletions refused by the permissions, by original path
    #[inline]
    #[must_use]
    pub fn deletions_withheld(&self) -> &[HierarchyPath] {
        &self.deletions_withheld
    }

    /// Completions refused by the permissions, by original path
    #[inline]
    #[must_use]
    pub fn completions_withheld(&self) -> &[HierarchyPath] {
        &self.completions_withheld
    }

    /// `path/attribute` of every data value changed
    #[inline]
    #[must_use]
    pub fn data_changed(&self) -> &[String] {
        &self.data_changed
    }

    /// Renames in the order they happened
    #[inline]
    #[must_use]
    pub fn renames(&self) -> &[PathRename] {
        &self.renames
    }

    /// True once any node has moved
    #[inline]
    #[must_use]
    pub fn nodes_were_renamed(&self) -> bool {
        !self.renames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> HierarchyPath {
        s.parse().unwrap()
    }

    #[test]
    fn permissions() {
        assert!(Permissions::all().allows(&p("/x")));
        assert!(!Permissions::none().allows(&p("/x")));
        let some = Permissions::only([p("/a")]);
        assert!(some.allows(&p("/a")));
        assert!(!some.allows(&p("/a/b")));
        assert!(some.lists(&p("/a")));
        assert!(!Permissions::all().lists(&p("/a")));
    }

    #[test]
    fn original_path_unwinds_renames() {
        let mut ledger = WorkerLedger::default();
        ledger.renames.push(PathRename {
            from: p("/P/Old"),
            to: p("/P/New"),
        });
        ledger.renames.push(PathRename {
            from: p("/P/Other/Leaf"),
            to: p("/P/New/Leaf"),
        });
        assert_eq!(ledger.original_path(&p("/P/New/Leaf")), p("/P/Other/Leaf"));
        assert_eq!(ledger.original_path(&p("/P/New/Code")), p("/P/Old/Code"));
        assert_eq!(ledger.original_path(&p("/P/Else")), p("/P/Else"));
    }

    #[test]
    fn sync_companions_are_not_data_changes() {
        let mut ledger = WorkerLedger::default();
        ledger.note_data_changed(&p("/a"), "Estimated Time_Last_Synced_Val");
        ledger.note_data_changed(&p("/a"), "Estimated Time");
        assert_eq!(ledger.data_changed(), ["/a/Estimated Time"]);
    }
}
