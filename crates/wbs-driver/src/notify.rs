//! Sync-needed notifications

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::info;
use wbs_model::HierarchyPath;

/// Receives sync-needed alerts from the scanner and clears from the driver
pub trait Notifier: Send + Sync {
    /// Raise (or refresh) the notification for `project`
    fn raise(&self, project: &HierarchyPath, message: &str);

    /// Remove the notification for `project`, if any
    fn clear(&self, project: &HierarchyPath);
}

/// One raised notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub project: HierarchyPath,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

/// In-process [`Notifier`] keeping one notification per project
#[derive(Debug, Default)]
pub struct NotificationBoard {
    active: DashMap<HierarchyPath, Notification>,
}

impl NotificationBoard {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_raised(&self, project: &HierarchyPath) -> bool {
        self.active.contains_key(project)
    }

    /// Raised notifications, oldest first
    #[must_use]
    pub fn active(&self) -> Vec<Notification> {
        let mut all: Vec<Notification> = self.active.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.raised_at.cmp(&b.raised_at).then_with(|| a.project.cmp(&b.project)));
        all
    }
}

impl Notifier for NotificationBoard {
    fn raise(&self, project: &HierarchyPath, message: &str) {
        // a repeated alert keeps its original time
        self.active
            .entry(project.clone())
            .and_modify(|n| n.message = message.to_string())
            .or_insert_with(|| {
                info!(%project, "raised sync notification");
                Notification {
                    project: project.clone(),
                    message: message.to_string(),
                    raised_at: Utc::now(),
                }
            });
    }

    fn clear(&self, project: &HierarchyPath) {
        if self.active.remove(project).is_some() {
            info!(%project, "cleared sync notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_is_idempotent_until_cleared() {
        let board = NotificationBoard::new();
        let project: HierarchyPath = "/Proj".parse().unwrap();
        board.raise(&project, "sync needed");
        let first = board.active()[0].raised_at;
        board.raise(&project, "sync still needed");
        assert_eq!(board.active().len(), 1);
        assert_eq!(board.active()[0].raised_at, first);
        assert_eq!(board.active()[0].message, "sync still needed");

        board.clear(&project);
        assert!(!board.is_raised(&project));
    }
}
