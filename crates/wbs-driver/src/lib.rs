//! Sync Driver
//!
//! Orchestrates synchronization for callers: finds the enclosing project,
//! validates its configuration, runs dry and live passes, suspends for
//! approval of destructive operations and regenerates workflow templates.
//!
//! # Core Concepts
//!
//! - [`SyncDriver`]: check, run, approve and migrate entry points
//! - [`SyncReport`]: status, change list and pending approvals
//! - [`ProjectLocks`]: one live pass per project root at a time
//! - [`SyncScanner`]: periodic brief checks raising [`Notification`]s
//! - [`SyncSettings`]: driver configuration, loadable from TOML
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wbs_driver::{ApprovalDecision, SyncDriver, SyncSettings, SyncStatus};
//!
//! let driver = SyncDriver::new(Arc::new(store), SyncSettings::default());
//! let report = driver.run(&path).await?;
//! if report.status == SyncStatus::AwaitingApproval {
//!     driver.approve(&path, &ApprovalDecision::approve_all(&report.pending)).await?;
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod approvals;
mod driver;
mod error;
mod export;
mod locks;
mod notify;
mod project;
mod report;
mod scanner;
mod settings;

pub use approvals::{ApprovalDecision, PendingApprovals, PENDING_CHANGES, PENDING_COMPLETIONS, PENDING_DELETIONS};
pub use driver::{SyncDriver, LAST_SYNC_TIMESTAMP, SYNC_DISCREPANCIES};
pub use error::DriverError;
pub use export::{ExportError, Exporter};
pub use locks::ProjectLocks;
pub use notify::{Notification, NotificationBoard, Notifier};
pub use project::{
    locate_project, ProjectConfig, ProjectRoot, RootKind, CONVERSION_NEEDED, INDIV_INITIALS, MIGRATION_NEEDED,
    PROJECT_ID, SYNC_FULL_WBS, TEAM_DATA_DIRECTORY,
};
pub use report::{SyncReport, SyncStatus};
pub use scanner::SyncScanner;
pub use settings::{ScannerSettings, SyncLogging, SyncSettings};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{ApprovalDecision, DriverError, SyncDriver, SyncReport, SyncSettings, SyncStatus};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
