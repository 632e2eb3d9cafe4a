//! Workflow Templates
//!
//! Turns the team's common workflows (`workflowDump.xml`) into process
//! templates individuals can instantiate, one legacy and one current template
//! per workflow.
//!
//! # Core Concepts
//!
//! - [`TemplateSynchronizer`]: staleness check plus atomic regeneration
//! - [`GenericTemplates`]: the process subtask templates generated nodes copy
//!
//! # Example
//!
//! ```rust,ignore
//! use wbs_templates::TemplateSynchronizer;
//!
//! let sync = TemplateSynchronizer::new(project, process, "a1b2", workflow_file, catalog, templates_dir)
//!     .with_what_if(false);
//! for change in sync.sync().await? {
//!     println!("{change}");
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod catalog;
mod error;
mod render;
mod synchronizer;

pub use catalog::{GenericTemplates, TemplateAttributes};
pub use error::TemplateError;
pub use synchronizer::{dest_file_name, TemplateSynchronizer, TEMPLATES_UPDATED};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{TemplateError, TemplateSynchronizer};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
