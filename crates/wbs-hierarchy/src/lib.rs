//! Live project hierarchy
//!
//! The persistent side of synchronization: a tree of template-instantiated
//! nodes plus typed data values stored against `(path, attribute)`.
//!
//! - [`HierarchyStore`], [`DataStore`], [`TemplateCatalog`]: collaborator traits
//! - [`HierarchyTree`]: radix-trie backed node structure
//! - [`MemoryStore`]: in-memory implementation with JSON snapshots
//! - [`Value`]: text, number, list or date

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod memory;
mod store;
mod tree;
mod value;

pub use error::HierarchyError;
pub use memory::{MemoryStore, SnapshotNode, StoreSnapshot};
pub use store::{DataStore, HierarchyStore, ProjectStore, TemplateCatalog};
pub use tree::{HierarchyTree, NodeInfo};
pub use value::{is_false, Value};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{DataStore, HierarchyStore, MemoryStore, ProjectStore, TemplateCatalog, Value};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
