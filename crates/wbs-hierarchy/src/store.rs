//! External collaborator interfaces
//!
//! Synchronization never owns the hierarchy; it talks to it through these
//! traits. [`MemoryStore`](crate::MemoryStore) implements all of them.

use wbs_model::HierarchyPath;

use crate::error::HierarchyError;
use crate::tree::{HierarchyTree, NodeInfo};
use crate::value::Value;

/// Read and alter the live hierarchy structure
pub trait HierarchyStore: Send + Sync {
    /// Look up a node
    fn node(&self, path: &HierarchyPath) -> Option<NodeInfo>;

    /// Instantiate a template at `path`
    ///
    /// # Errors
    /// Fails if the path is occupied by a node with another template.
    fn add_template(&self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError>;

    /// Delete a node, its subtree and their data
    ///
    /// # Errors
    /// Fails for a missing node or the root.
    fn delete_node(&self, path: &HierarchyPath) -> Result<(), HierarchyError>;

    /// Move a node, keeping its data and history
    ///
    /// # Errors
    /// Fails when the target is occupied.
    fn rename_node(&self, from: &HierarchyPath, to: &HierarchyPath) -> Result<(), HierarchyError>;

    /// Replace the template of an existing node
    ///
    /// # Errors
    /// Fails for a missing node.
    fn set_template_id(&self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError>;

    /// Reorder children; returns whether anything moved
    ///
    /// # Errors
    /// Fails for a missing parent.
    fn reorder_nodes(&self, parent: &HierarchyPath, names: &[String]) -> Result<bool, HierarchyError>;

    /// Copy of the current structure
    fn snapshot(&self) -> HierarchyTree;

    /// True while an interactive structure editor holds the hierarchy
    fn is_editor_open(&self) -> bool {
        false
    }
}

/// Typed values addressed by `(path, attribute)`
pub trait DataStore: Send + Sync {
    /// Read a value
    fn get_value(&self, path: &HierarchyPath, name: &str) -> Option<Value>;

    /// Write (or with `None`, remove) a value
    fn put_value(&self, path: &HierarchyPath, name: &str, value: Option<Value>);
}

/// Installed process templates
pub trait TemplateCatalog: Send + Sync {
    /// `(template ID, display name)` pairs
    fn templates(&self) -> Vec<(String, String)>;

    /// Templates whose ID starts with `prefix`
    fn templates_with_prefix(&self, prefix: &str) -> Vec<(String, String)> {
        self.templates()
            .into_iter()
            .filter(|(id, _)| id.starts_with(prefix))
            .collect()
    }
}

/// Everything a synchronization pass needs from its host
pub trait ProjectStore: HierarchyStore + DataStore + TemplateCatalog {}

impl<T: HierarchyStore + DataStore + TemplateCatalog + ?Sized> ProjectStore for T {}
