//! Sync driver
//!
//! Entry points callers use, each keyed by any path inside a project:
//!
//! - [`SyncDriver::check`]: dry run, never writes
//! - [`SyncDriver::run`]: dry run, then a live run; an individual's pending
//!   deletions and completions suspend the run for approval
//! - [`SyncDriver::approve`]: resume a suspended run with the user's decision
//! - [`SyncDriver::migrate`]: apply a pending one-time template translation
//!
//! Live runs repeat the pass until it reports nothing new, bounded by
//! `max_passes`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use wbs_hierarchy::{ProjectStore, Value};
use wbs_model::{HierarchyPath, ProcessDefinition, WbsDocument};
use wbs_sync::{
    apply_template_translation, check_individual_initials, load_process_definition, Change, HierarchySynchronizer,
    SyncMode, SyncOptions, SyncOutcome,
};
use wbs_templates::TemplateSynchronizer;
use wbs_worker::{LiveWorker, LoggingWorker, Permissions, SimulationWorker};

use crate::approvals::{ApprovalDecision, PendingApprovals, SuspendedRun};
use crate::error::DriverError;
use crate::export::Exporter;
use crate::locks::ProjectLocks;
use crate::notify::{NotificationBoard, Notifier};
use crate::project::{locate_project, ProjectConfig, CONVERSION_NEEDED, MIGRATION_NEEDED};
use crate::report::{SyncReport, SyncStatus};
use crate::settings::{SyncLogging, SyncSettings};

/// Time of the last live run, on the project root
pub const LAST_SYNC_TIMESTAMP: &str = "Last_Sync_Timestamp";
/// Discrepancies found by the last live run, one JSON object per entry
pub const SYNC_DISCREPANCIES: &str = "Sync_Discrepancies";

/// A project ready to synchronize
struct Session {
    config: ProjectConfig,
    doc: WbsDocument,
    process: ProcessDefinition,
}

impl Session {
    fn root(&self) -> &HierarchyPath {
        &self.config.root.path
    }
}

/// Orchestrates synchronization of projects held in one store
pub struct SyncDriver<S: ProjectStore + 'static> {
    store: Arc<S>,
    settings: SyncSettings,
    locks: Arc<ProjectLocks>,
    notifier: Arc<dyn Notifier>,
    exporter: Option<Arc<dyn Exporter>>,
    follow_ups: Arc<Mutex<JoinSet<()>>>,
}

impl<S: ProjectStore + 'static> Clone for SyncDriver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            settings: self.settings.clone(),
            locks: Arc::clone(&self.locks),
            notifier: Arc::clone(&self.notifier),
            exporter: self.exporter.clone(),
            follow_ups: Arc::clone(&self.follow_ups),
        }
    }
}

impl<S: ProjectStore + 'static> SyncDriver<S> {
    #[must_use]
    pub fn new(store: Arc<S>, settings: SyncSettings) -> Self {
        Self {
            store,
            settings,
            locks: Arc::new(ProjectLocks::new()),
            notifier: Arc::new(NotificationBoard::new()),
            exporter: None,
            follow_ups: Arc::new(Mutex::new(JoinSet::new())),
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn with_exporter(mut self, exporter: Arc<dyn Exporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }

    /// Share project locks with other drivers over the same store
    #[must_use]
    pub fn with_locks(mut self, locks: Arc<ProjectLocks>) -> Self {
        self.locks = locks;
        self
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    /// Wait for spawned template regeneration and export tasks
    pub async fn flush(&self) {
        let mut tasks = std::mem::take(&mut *self.follow_ups.lock());
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "follow-up task failed");
            }
        }
    }

    /// Dry run: what a live run would change
    ///
    /// # Errors
    /// Returns the fatal [`DriverError`] kinds: no enclosing project, missing
    /// configuration, or an absent, unreadable, corrupt or outdated WBS file.
    pub async fn check(&self, start: &HierarchyPath) -> Result<SyncReport, DriverError> {
        self.check_with(start, false).await
    }

    /// Dry run that stops at the first change
    ///
    /// # Errors
    /// Same as [`SyncDriver::check`].
    pub async fn check_brief(&self, start: &HierarchyPath) -> Result<SyncReport, DriverError> {
        self.check_with(start, true).await
    }

    async fn check_with(&self, start: &HierarchyPath, brief: bool) -> Result<SyncReport, DriverError> {
        let config = self.configure(start)?;
        if let Some(report) = self.migration_report(&config) {
            return Ok(report);
        }
        let session = self.open(config).await?;
        if let Some(report) = self.initials_report(&session) {
            return Ok(report);
        }

        let outcome = self.dry_run(&session, brief)?;
        let mut changes = outcome.changes;
        if !brief || changes.is_empty() {
            changes.extend(self.template_changes(&session, true).await);
        }
        let status = if changes.is_empty() {
            SyncStatus::UpToDate
        } else {
            SyncStatus::ChangesPending
        };
        let pending = PendingApprovals {
            deletions: outcome.deletions,
            completions: outcome.completions,
        };
        Ok(SyncReport::new(session.root().clone(), status)
            .with_changes(changes)
            .with_pending(if session.config.role.is_team_side() {
                PendingApprovals::default()
            } else {
                pending
            })
            .with_discrepancies(outcome.discrepancies))
    }

    /// Synchronize the project enclosing `start`
    ///
    /// # Errors
    /// Returns [`DriverError::ReadOnlyMode`] or
    /// [`DriverError::ConcurrentEditorOpen`] before touching anything, plus
    /// the errors of [`SyncDriver::check`].
    pub async fn run(&self, start: &HierarchyPath) -> Result<SyncReport, DriverError> {
        let config = self.configure(start)?;
        let _guard = self.locks.lock(&config.root.path).await;
        self.ensure_writable(&config.root.path)?;
        if let Some(report) = self.migration_report(&config) {
            return Ok(report);
        }
        let session = self.open(config).await?;
        if let Some(report) = self.initials_report(&session) {
            return Ok(report);
        }
        let root = session.root().clone();
        let suspended = SuspendedRun::load(&*self.store, &root);

        let dry = self.dry_run(&session, false)?;
        let template_changes = self.template_changes(&session, true).await;
        if dry.is_empty() && template_changes.is_empty() {
            SuspendedRun::clear(&*self.store, &root);
            self.notifier.clear(&root);
            info!(%root, "already up to date");
            return Ok(SyncReport::new(root, SyncStatus::UpToDate).with_changes(suspended.changes));
        }

        // individuals delete or complete only what was approved
        let individual = !session.config.role.is_team_side();
        let permissions = if individual {
            Permissions::none()
        } else {
            Permissions::all()
        };
        let pending_count = dry.deletions.len() + dry.completions.len();
        let applied = self
            .converge(&session, permissions.clone(), permissions, pending_count)
            .await?;
        let mut changes = suspended.changes;
        changes.extend(applied.changes);

        let pending = PendingApprovals {
            deletions: merge_paths(dry.deletions, applied.withheld_deletions),
            completions: merge_paths(dry.completions, applied.withheld_completions),
        };
        if individual && !pending.is_empty() {
            SuspendedRun {
                pending: pending.clone(),
                changes: changes.clone(),
            }
            .save(&*self.store, &root);
            self.record_live_run(&root, &applied.discrepancies);
            info!(%root, pending = pending.len(), "waiting for approval of destructive operations");
            return Ok(SyncReport::new(root, SyncStatus::AwaitingApproval)
                .with_changes(changes)
                .with_pending(pending)
                .with_discrepancies(applied.discrepancies));
        }

        changes.extend(template_changes);
        Ok(self.finish_live(&session, changes, applied.discrepancies))
    }

    /// Resume a suspended run, applying the approved operations
    ///
    /// Operations that were not pending are ignored. Denied operations stay
    /// undone and will be proposed again by the next run.
    ///
    /// # Errors
    /// Same as [`SyncDriver::run`].
    pub async fn approve(&self, start: &HierarchyPath, decision: &ApprovalDecision) -> Result<SyncReport, DriverError> {
        let config = self.configure(start)?;
        let _guard = self.locks.lock(&config.root.path).await;
        self.ensure_writable(&config.root.path)?;
        let session = self.open(config).await?;
        let root = session.root().clone();
        let suspended = SuspendedRun::load(&*self.store, &root);

        let approved = |requested: &[HierarchyPath], pending: &[HierarchyPath]| {
            Permissions::only(requested.iter().filter(|p| pending.contains(p)).cloned())
        };
        let deletions = approved(&decision.deletions, &suspended.pending.deletions);
        let completions = approved(&decision.completions, &suspended.pending.completions);
        let applied = self
            .converge(&session, deletions, completions, suspended.pending.len())
            .await?;

        let mut changes = suspended.changes;
        changes.extend(applied.changes);
        changes.extend(self.template_changes(&session, true).await);
        Ok(self.finish_live(&session, changes, applied.discrepancies))
    }

    /// Apply the template translation a migration flag asks for
    ///
    /// # Errors
    /// Returns [`DriverError::Sync`] when a node's template cannot be
    /// changed, plus the configuration errors of [`SyncDriver::run`].
    pub async fn migrate(&self, start: &HierarchyPath) -> Result<SyncReport, DriverError> {
        let config = self.configure(start)?;
        let _guard = self.locks.lock(&config.root.path).await;
        self.ensure_writable(&config.root.path)?;
        let root = config.root.path.clone();
        let Some(translation) = config.pending_migration(&*self.store) else {
            return Ok(SyncReport::new(root, SyncStatus::UpToDate));
        };

        let mut worker = LiveWorker::new(&*self.store, Permissions::none(), Permissions::none());
        let changed = apply_template_translation(&mut worker, &root, &translation).map_err(wbs_sync::SyncError::from)?;
        self.store.put_value(&root, MIGRATION_NEEDED, None);
        self.store.put_value(&root, CONVERSION_NEEDED, None);
        info!(%root, changed, ?translation, "project migrated");
        Ok(SyncReport::new(root, SyncStatus::Applied).with_changes(vec![Change::Message {
            text: format!("Migrated templates of {changed} node(s)"),
        }]))
    }

    fn configure(&self, start: &HierarchyPath) -> Result<ProjectConfig, DriverError> {
        let root = locate_project(&*self.store, start)?;
        ProjectConfig::load(&*self.store, root)
    }

    fn ensure_writable(&self, root: &HierarchyPath) -> Result<(), DriverError> {
        if self.settings.read_only {
            return Err(DriverError::ReadOnlyMode(root.clone()));
        }
        if self.store.is_editor_open() {
            return Err(DriverError::ConcurrentEditorOpen(root.clone()));
        }
        Ok(())
    }

    fn migration_report(&self, config: &ProjectConfig) -> Option<SyncReport> {
        config.pending_migration(&*self.store).map(|translation| {
            debug!(root = %config.root.path, ?translation, "migration needed");
            SyncReport::new(config.root.path.clone(), SyncStatus::MigrationNeeded)
        })
    }

    fn initials_report(&self, session: &Session) -> Option<SyncReport> {
        let known = check_individual_initials(&session.doc, &session.config.role)?;
        warn!(root = %session.root(), role = %session.config.role, "initials are not on the team");
        let mut report = SyncReport::new(session.root().clone(), SyncStatus::UnknownInitials);
        report.known_initials = Some(known);
        Some(report)
    }

    async fn open(&self, config: ProjectConfig) -> Result<Session, DriverError> {
        let path = config.team_dir.join(&self.settings.wbs_file_name);
        let doc = self.load_wbs(&path).await?;
        let process = load_process_definition(&*self.store, &config.root.process_id)?;
        Ok(Session { config, doc, process })
    }

    async fn load_wbs(&self, path: &Path) -> Result<WbsDocument, DriverError> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DriverError::WbsFileMissing(path.to_path_buf()));
            }
            Err(source) => {
                return Err(DriverError::WbsFileUnreadable {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let doc = WbsDocument::parse(&text).map_err(|source| DriverError::WbsFileCorrupt {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(required) = &self.settings.min_dump_version {
            if !doc.version_at_least(required) {
                return Err(DriverError::VersionTooOld {
                    path: path.to_path_buf(),
                    found: doc.version().to_string(),
                    required: required.clone(),
                });
            }
        }
        Ok(doc)
    }

    fn options(&self, session: &Session) -> SyncOptions {
        SyncOptions::new(session.config.role.clone())
            .with_full_copy(session.config.full_copy)
            .with_inspected_sizes(self.settings.sync_inspected_sizes)
    }

    fn synchronizer<'a>(&self, session: &'a Session, brief: bool) -> HierarchySynchronizer<'a> {
        HierarchySynchronizer::new(
            session.root().clone(),
            &session.doc,
            &session.process,
            self.options(session).with_brief(brief),
        )
    }

    fn dry_run(&self, session: &Session, brief: bool) -> Result<SyncOutcome, DriverError> {
        let mut worker = SimulationWorker::new(&*self.store);
        Ok(self.synchronizer(session, brief).run(&mut worker, SyncMode::WhatIf)?)
    }

    /// Repeat live passes until one changes nothing
    async fn converge(
        &self,
        session: &Session,
        deletions: Permissions,
        completions: Permissions,
        pending_count: usize,
    ) -> Result<SyncOutcome, DriverError> {
        let trace_dir = self.trace_dir(pending_count);
        let mut total = SyncOutcome::default();
        for pass in 1..=self.settings.max_passes.max(1) {
            let (outcome, trace) = self.live_pass(session, deletions.clone(), completions.clone(), trace_dir.is_some())?;
            if let (Some(dir), Some(trace)) = (&trace_dir, trace) {
                write_trace(dir, session.root(), pass, &trace).await;
            }
            let done = outcome.is_empty() && !outcome.follow_on_needed;
            debug!(root = %session.root(), pass, changes = outcome.changes.len(), "live pass finished");
            total.changes.extend(outcome.changes);
            total.deletions.extend(outcome.deletions);
            total.completions.extend(outcome.completions);
            total.withheld_deletions.extend(outcome.withheld_deletions);
            total.withheld_completions.extend(outcome.withheld_completions);
            total.discrepancies = outcome.discrepancies;
            if done {
                return Ok(total);
            }
        }
        warn!(
            root = %session.root(),
            max_passes = self.settings.max_passes,
            "synchronization did not converge"
        );
        Ok(total)
    }

    fn live_pass(
        &self,
        session: &Session,
        deletions: Permissions,
        completions: Permissions,
        traced: bool,
    ) -> Result<(SyncOutcome, Option<Vec<String>>), DriverError> {
        let sync = self.synchronizer(session, false);
        let worker = LiveWorker::new(&*self.store, deletions, completions);
        if traced {
            let mut logging = LoggingWorker::new(worker);
            let outcome = sync.run(&mut logging, SyncMode::Live)?;
            let (_, trace) = logging.into_parts();
            Ok((outcome, Some(trace)))
        } else {
            let mut worker = worker;
            Ok((sync.run(&mut worker, SyncMode::Live)?, None))
        }
    }

    fn trace_dir(&self, pending_count: usize) -> Option<PathBuf> {
        let enabled = match self.settings.sync_logging {
            SyncLogging::Never => false,
            SyncLogging::Always => true,
            SyncLogging::ForDelete => pending_count > SyncLogging::DELETE_THRESHOLD,
        };
        enabled.then(|| self.settings.debug_log_dir.clone()).flatten()
    }

    fn record_live_run(&self, root: &HierarchyPath, discrepancies: &[wbs_sync::Discrepancy]) {
        let encoded = discrepancies
            .iter()
            .filter_map(|d| serde_json::to_string(d).ok())
            .collect::<Vec<_>>();
        let value = (!encoded.is_empty()).then_some(Value::List(encoded));
        self.store.put_value(root, SYNC_DISCREPANCIES, value);
        self.store.put_value(root, LAST_SYNC_TIMESTAMP, Some(Value::Date(Utc::now())));
    }

    fn finish_live(&self, session: &Session, changes: Vec<Change>, discrepancies: Vec<wbs_sync::Discrepancy>) -> SyncReport {
        let root = session.root().clone();
        SuspendedRun::clear(&*self.store, &root);
        self.record_live_run(&root, &discrepancies);
        self.notifier.clear(&root);
        if !changes.is_empty() {
            self.spawn_follow_up(session);
        }
        let status = if changes.is_empty() {
            SyncStatus::UpToDate
        } else {
            SyncStatus::Applied
        };
        info!(%root, changes = changes.len(), ?status, "synchronization finished");
        SyncReport::new(root, status)
            .with_changes(changes)
            .with_discrepancies(discrepancies)
    }

    /// Fire-and-forget template regeneration and export
    fn spawn_follow_up(&self, session: &Session) {
        if let Some(templates) = self.template_synchronizer(session) {
            let templates = templates.with_what_if(false);
            self.follow_ups.lock().spawn(async move {
                if let Err(e) = templates.sync().await {
                    warn!(error = %e, "template regeneration failed");
                }
            });
        }
        if let (true, Some(exporter)) = (self.settings.auto_export, &self.exporter) {
            let exporter = Arc::clone(exporter);
            let root = session.root().clone();
            self.follow_ups.lock().spawn(async move {
                if let Err(e) = exporter.export(&root).await {
                    warn!(%root, error = %e, "export failed");
                }
            });
        }
    }

    /// Template changes a regeneration would report; errors only log
    async fn template_changes(&self, session: &Session, what_if: bool) -> Vec<Change> {
        let Some(templates) = self.template_synchronizer(session) else {
            return Vec::new();
        };
        match templates.with_what_if(what_if).sync().await {
            Ok(lines) => lines.into_iter().map(|text| Change::Message { text }).collect(),
            Err(e) => {
                warn!(root = %session.root(), error = %e, "could not check workflow templates");
                Vec::new()
            }
        }
    }

    /// Team and master projects with template directories configured
    fn template_synchronizer(&self, session: &Session) -> Option<TemplateSynchronizer> {
        let config = &session.config;
        if !config.root.kind.is_team_side() {
            return None;
        }
        let (Some(process_dir), Some(dest_dir)) = (&self.settings.process_template_dir, &self.settings.templates_dir)
        else {
            return None;
        };
        let Some(project_id) = config.project_id.as_deref() else {
            warn!(root = %config.root.path, "no project ID, skipping workflow templates");
            return None;
        };
        Some(TemplateSynchronizer::new(
            config.root.path.clone(),
            session.process.clone(),
            project_id,
            config.team_dir.join(&self.settings.workflow_file_name),
            process_dir.join(format!("{}.xml", config.root.process_id)),
            dest_dir,
        ))
    }
}

/// Write one pass's worker call trace; failures only log
/// `first` followed by the paths of `more` it does not already hold
fn merge_paths(mut first: Vec<HierarchyPath>, more: Vec<HierarchyPath>) -> Vec<HierarchyPath> {
    for path in more {
        if !first.contains(&path) {
            first.push(path);
        }
    }
    first
}

async fn write_trace(dir: &Path, root: &HierarchyPath, pass: usize, trace: &[String]) {
    let project = root.name().unwrap_or("root").replace(|c: char| !c.is_alphanumeric(), "_");
    let file = dir.join(format!(
        "sync-{project}-{}-{pass}.log",
        Utc::now().format("%Y%m%dT%H%M%S")
    ));
    let result = async {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&file, trace.join("\n")).await
    }
    .await;
    match result {
        Ok(()) => debug!(path = %file.display(), lines = trace.len(), "wrote sync trace"),
        Err(e) => warn!(path = %file.display(), error = %e, "could not write sync trace"),
    }
}
