//! WBS Document Model
//!
//! Immutable, per-pass view of a work breakdown structure dump and the value
//! types shared by every synchronization crate.
//!
//! # Core Concepts
//!
//! - [`WbsDocument`]: arena-backed tree parsed from `projDump.xml`
//! - [`HierarchyPath`]: slash-delimited address in the live hierarchy
//! - [`Role`]: team, master or individual instance
//! - [`PrunedView`]: which nodes take part in a pass
//! - [`TimeRatios`]: memoized size apportionment by time share
//! - [`ProcessDefinition`]: phase vocabulary of the project's process
//! - [`WorkflowDocument`]: reusable workflows from `workflowDump.xml`
//!
//! # Example
//!
//! ```rust,ignore
//! use wbs_model::{PruneOptions, PrunedView, Role, WbsDocument};
//!
//! let doc = WbsDocument::parse(&xml)?;
//! let role = Role::individual("alice");
//! let view = PrunedView::compute(&doc, PruneOptions { role: &role, full_copy: false, keep_ids: &keep });
//! for child in view.kept_children(&doc, doc.root()) {
//!     println!("{}", doc.node(child).name);
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod document;
mod error;
mod hash;
mod node;
mod path;
mod process;
mod prune;
mod ratio;
mod role;
mod workflow;

pub use document::{compare_versions, scrub_name, WbsDocument};
pub use error::ModelError;
pub use hash::{ContentHash, HashError};
pub use node::{Dependency, NodeId, NodeKind, SizeData, TeamMember, TimeAllocation, WbsNode};
pub use path::{HierarchyPath, PathError};
pub use process::ProcessDefinition;
pub use prune::{PruneOptions, PruneVerdict, PrunedView, ROOT_PSEUDO_ID};
pub use ratio::{PhaseSums, TimeRatios};
pub use role::Role;
pub use workflow::{Workflow, WorkflowDocument, WorkflowNode};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        HierarchyPath, NodeId, NodeKind, ProcessDefinition, PrunedView, Role, TimeRatios,
        WbsDocument, WbsNode,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
