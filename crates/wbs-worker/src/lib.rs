//! Sync Workers
//!
//! Abstracts "where changes land" for a synchronization pass.
//!
//! # Workers
//!
//! - [`LiveWorker`]: mutates the real hierarchy and data store
//! - [`SimulationWorker`]: records the same effects in a private overlay
//! - [`LoggingWorker`]: decorator that records every call on any worker
//!
//! All three implement [`SyncWorker`], whose provided methods carry the shared
//! semantics (permissions, rename tracking, last-synced values, completion).
//!
//! # Example
//!
//! ```rust,ignore
//! use wbs_worker::{LoggingWorker, SimulationWorker, SyncWorker};
//!
//! let mut worker = LoggingWorker::new(SimulationWorker::new(&store));
//! worker.add_template(&path, "TSP/Indiv2Task")?;
//! for line in worker.trace() {
//!     println!("{line}");
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod ledger;
mod live;
mod logging;
pub mod names;
mod simulation;
mod worker;

pub use ledger::{PathRename, Permissions, WorkerLedger};
pub use live::LiveWorker;
pub use logging::LoggingWorker;
pub use simulation::SimulationWorker;
pub use worker::SyncWorker;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{LiveWorker, LoggingWorker, Permissions, SimulationWorker, SyncWorker};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
