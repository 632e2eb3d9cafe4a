//! Background project scanner
//!
//! On every tick the scanner walks the whole hierarchy, runs a brief check
//! for each node whose template carries one of the configured markers, and
//! raises a notification when the check response contains the alert token.
//! The next successful live run clears it.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use wbs_hierarchy::ProjectStore;
use wbs_model::HierarchyPath;

use crate::driver::SyncDriver;
use crate::settings::ScannerSettings;

/// Periodic sync-needed detector
pub struct SyncScanner<S: ProjectStore + 'static> {
    driver: SyncDriver<S>,
    settings: ScannerSettings,
}

impl<S: ProjectStore + 'static> SyncScanner<S> {
    /// Scanner using the driver's scanner settings
    #[must_use]
    pub fn new(driver: SyncDriver<S>) -> Self {
        let settings = driver.settings().scanner.clone();
        Self { driver, settings }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: ScannerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Project roots carrying a marker, in hierarchy order
    #[must_use]
    pub fn marked_projects(&self) -> Vec<HierarchyPath> {
        self.driver
            .store()
            .snapshot()
            .entries()
            .into_iter()
            .filter(|(_, info)| {
                info.template_id.as_deref().is_some_and(|id| {
                    self.settings
                        .markers
                        .iter()
                        .any(|marker| id.rsplit_once('/').is_some_and(|(_, suffix)| suffix == marker))
                })
            })
            .map(|(path, _)| path)
            .collect()
    }

    /// Text response of a brief check; contains the alert token when a sync
    /// is needed
    pub async fn check_response(&self, project: &HierarchyPath) -> String {
        match self.driver.check_brief(project).await {
            Ok(report) if report.status.needs_sync() => {
                format!("{} {report}", self.settings.alert_token)
            }
            Ok(report) => report.to_string(),
            Err(e) => format!("sync check failed: {e}"),
        }
    }

    /// Check every marked project once; returns those flagged
    pub async fn scan_once(&self) -> Vec<HierarchyPath> {
        let mut flagged = Vec::new();
        for project in self.marked_projects() {
            let response = self.check_response(&project).await;
            if response.contains(&self.settings.alert_token) {
                self.driver.notifier().raise(
                    &project,
                    &format!("The project '{project}' needs to be synchronized with the team plan"),
                );
                flagged.push(project);
            } else {
                debug!(%project, "project does not need a sync");
            }
        }
        info!(flagged = flagged.len(), "scan complete");
        flagged
    }

    /// Scan on the configured interval until `shutdown` turns true or its
    /// sender is dropped
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.settings.interval());
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.scan_once().await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("sync scanner stopped");
        })
    }
}
