//! Hierarchy Synchronization
//!
//! Reconciles a parsed WBS with a participant's live project hierarchy.
//!
//! # Core Concepts
//!
//! - [`HierarchySynchronizer`]: runs one pass through a [`SyncWorker`]
//! - [`SyncMode`]: dry run (pending approvals) or live run
//! - [`Change`]: one human-readable change record
//! - [`Discrepancy`]: WBS values that disagree with local edits
//! - [`TemplateTranslation`]: one-time template ID migration
//!
//! # Pass outline
//!
//! 1. record WBS task order and labels at the project root
//! 2. prune the WBS for the role, keeping nodes that still exist locally
//! 3. merge an individual's schedule
//! 4. walk WBS and hierarchy together, resolving identity by WBS ID
//! 5. delete, or for individuals complete, live nodes the WBS no longer has
//!
//! # Example
//!
//! ```rust,ignore
//! use wbs_sync::{HierarchySynchronizer, SyncMode, SyncOptions};
//! use wbs_worker::SimulationWorker;
//!
//! let sync = HierarchySynchronizer::new(project, &doc, &process, SyncOptions::new(role));
//! let outcome = sync.run(&mut SimulationWorker::new(&store), SyncMode::WhatIf)?;
//! for change in &outcome.changes {
//!     println!("{change}");
//! }
//! ```
//!
//! [`SyncWorker`]: wbs_worker::SyncWorker

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod changes;
mod discrepancy;
mod error;
pub mod names;
mod pass;
mod process;
mod schedule;
mod survey;
mod synchronizer;
mod translate;

pub use changes::{Change, MISC_CHANGE};
pub use discrepancy::Discrepancy;
pub use error::SyncError;
pub use process::load_process_definition;
pub use synchronizer::{check_individual_initials, HierarchySynchronizer, SyncMode, SyncOptions, SyncOutcome};
pub use translate::{apply_template_translation, TemplateTranslation};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{Change, Discrepancy, HierarchySynchronizer, SyncMode, SyncOptions, SyncOutcome};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
