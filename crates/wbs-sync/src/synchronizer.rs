//! Hierarchy synchronizer entry point

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;
use wbs_model::{HierarchyPath, ProcessDefinition, Role, WbsDocument};
use wbs_worker::SyncWorker;

use crate::changes::Change;
use crate::discrepancy::Discrepancy;
use crate::error::SyncError;
use crate::pass::Pass;

/// How a pass should behave
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Who is synchronizing
    pub role: Role,
    /// Keep every non-task node for an individual
    pub full_copy: bool,
    /// Copy apportioned inspection sizes to tasks
    pub sync_inspected_sizes: bool,
    /// Stop at the first change; only useful for a what-if check
    pub brief: bool,
}

impl SyncOptions {
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            full_copy: false,
            sync_inspected_sizes: true,
            brief: false,
        }
    }

    #[must_use]
    pub fn with_full_copy(mut self, full_copy: bool) -> Self {
        self.full_copy = full_copy;
        self
    }

    #[must_use]
    pub fn with_inspected_sizes(mut self, enabled: bool) -> Self {
        self.sync_inspected_sizes = enabled;
        self
    }

    #[must_use]
    pub fn with_brief(mut self, brief: bool) -> Self {
        self.brief = brief;
        self
    }
}

/// Whether a pass is a dry run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncMode {
    /// Compute what would change; destructive steps become pending approvals
    WhatIf,
    /// Apply changes, honoring the worker's permissions
    Live,
}

/// Result of one pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncOutcome {
    pub changes: Vec<Change>,
    pub discrepancies: Vec<Discrepancy>,
    /// Nodes deleted (or, in a dry run, that would be deleted), by original path
    pub deletions: Vec<HierarchyPath>,
    /// Nodes marked complete (or that would be), by original path
    pub completions: Vec<HierarchyPath>,
    /// Deletions the worker's permissions refused, by original path
    pub withheld_deletions: Vec<HierarchyPath>,
    /// Completions the worker's permissions refused, by original path
    pub withheld_completions: Vec<HierarchyPath>,
    /// Nodes moved during the pass, so deletions were postponed
    pub follow_on_needed: bool,
}

impl SyncOutcome {
    /// True when the pass changed nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// True when destructive operations are pending
    #[inline]
    #[must_use]
    pub fn has_destructive_operations(&self) -> bool {
        !self.deletions.is_empty() || !self.completions.is_empty()
    }

    /// True when the permissions held back a deletion or completion
    #[inline]
    #[must_use]
    pub fn has_withheld_operations(&self) -> bool {
        !self.withheld_deletions.is_empty() || !self.withheld_completions.is_empty()
    }
}

/// Reconciles one project's live hierarchy with a parsed WBS
///
/// Every structural and data effect goes through the [`SyncWorker`] handed to
/// [`HierarchySynchronizer::run`], so the same synchronizer serves dry runs
/// and live runs.
#[derive(Debug, Clone)]
pub struct HierarchySynchronizer<'a> {
    project: HierarchyPath,
    doc: &'a WbsDocument,
    process: &'a ProcessDefinition,
    options: SyncOptions,
}

impl<'a> HierarchySynchronizer<'a> {
    #[must_use]
    pub fn new(
        project: HierarchyPath,
        doc: &'a WbsDocument,
        process: &'a ProcessDefinition,
        options: SyncOptions,
    ) -> Self {
        Self {
            project,
            doc,
            process,
            options,
        }
    }

    #[inline]
    #[must_use]
    pub fn project(&self) -> &HierarchyPath {
        &self.project
    }

    #[inline]
    #[must_use]
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Run one pass through `worker`
    ///
    /// Alteration failures on individual nodes become "could not ..." changes
    /// and never abort the pass.
    ///
    /// # Errors
    /// Returns [`SyncError::ProjectNotFound`] when the project root does not
    /// exist in the worker's view of the hierarchy.
    pub fn run<W: SyncWorker + ?Sized>(&self, worker: &mut W, mode: SyncMode) -> Result<SyncOutcome, SyncError> {
        let Some(root) = worker.node(&self.project) else {
            return Err(SyncError::ProjectNotFound(self.project.clone()));
        };
        info!(
            project = %self.project,
            role = %self.options.role,
            ?mode,
            "starting synchronization pass"
        );

        let mut pass = Pass::new(
            &self.project,
            self.doc,
            self.process,
            &self.options,
            worker,
            root.template_id.as_deref(),
            mode,
        );
        pass.run();
        let outcome = pass.finish();
        info!(
            project = %self.project,
            changes = outcome.changes.len(),
            deletions = outcome.deletions.len(),
            completions = outcome.completions.len(),
            follow_on = outcome.follow_on_needed,
            "synchronization pass complete"
        );
        Ok(outcome)
    }
}

/// Known initials → names when an individual's initials are not on the team
#[must_use]
pub fn check_individual_initials(doc: &WbsDocument, role: &Role) -> Option<BTreeMap<String, String>> {
    let initials = role.initials()?;
    let members = doc.team_members();
    if members.is_empty() || doc.team_member(initials).is_some() {
        return None;
    }
    Some(
        members
            .iter()
            .map(|m| (m.initials.clone(), m.name.clone()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"<project dumpFileVersion="3.1.0">
  <teamMember initials="ab" name="Alice Brown"/>
  <teamMember initials="cd" name="Carl Dunn"/>
</project>"#;

    #[test]
    fn unknown_initials_list_the_team() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        assert_eq!(check_individual_initials(&doc, &Role::individual("AB")), None);
        assert_eq!(check_individual_initials(&doc, &Role::Team), None);
        let known = check_individual_initials(&doc, &Role::individual("zz")).unwrap();
        assert_eq!(known.get("cd").map(String::as_str), Some("Carl Dunn"));
    }

    #[test]
    fn options_builder() {
        let options = SyncOptions::new(Role::individual("ab"))
            .with_full_copy(true)
            .with_brief(true);
        assert!(options.full_copy);
        assert!(options.brief);
        assert!(options.sync_inspected_sizes);
    }
}
