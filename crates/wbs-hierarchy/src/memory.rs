//! In-memory hierarchy and data store
//!
//! [`MemoryStore`] backs the command-line tool and the tests. Its state can be
//! saved to and restored from a JSON [`StoreSnapshot`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use wbs_model::HierarchyPath;

use crate::error::HierarchyError;
use crate::store::{DataStore, HierarchyStore, TemplateCatalog};
use crate::tree::{HierarchyTree, NodeInfo};
use crate::value::Value;

type DataMap = BTreeMap<HierarchyPath, BTreeMap<String, Value>>;

/// Thread-safe hierarchy, data and template catalog
#[derive(Debug, Default)]
pub struct MemoryStore {
    tree: RwLock<HierarchyTree>,
    data: RwLock<DataMap>,
    templates: RwLock<BTreeMap<String, String>>,
    editor_open: AtomicBool,
}

/// Serializable form of a [`MemoryStore`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Nodes in hierarchy order
    pub nodes: Vec<SnapshotNode>,
    /// Path → attribute → value
    pub data: BTreeMap<HierarchyPath, BTreeMap<String, Value>>,
    /// Template ID → display name
    #[serde(default)]
    pub templates: BTreeMap<String, String>,
}

/// One node in a [`StoreSnapshot`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub path: HierarchyPath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
}

impl MemoryStore {
    /// Empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template in the catalog
    #[must_use]
    pub fn with_template(self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.templates.write().insert(id.into(), name.into());
        self
    }

    /// Create a node directly, bypassing sync bookkeeping
    ///
    /// # Errors
    /// Same as [`HierarchyTree::add`].
    pub fn insert_node(
        &self,
        path: &HierarchyPath,
        template_id: Option<&str>,
    ) -> Result<(), HierarchyError> {
        self.tree.write().add(path, template_id).map(|_| ())
    }

    /// Flag an open structure editor
    pub fn set_editor_open(&self, open: bool) {
        self.editor_open.store(open, Ordering::SeqCst);
    }

    /// Every stored value, for inspection
    #[must_use]
    pub fn data(&self) -> DataMap {
        self.data.read().clone()
    }

    /// Rebuild a store from a snapshot
    ///
    /// # Errors
    /// Fails if the snapshot lists conflicting nodes.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, HierarchyError> {
        let store = Self::new();
        {
            let mut tree = store.tree.write();
            for node in &snapshot.nodes {
                if node.path.is_root() {
                    continue;
                }
                tree.add(&node.path, node.template_id.as_deref())?;
            }
        }
        *store.data.write() = snapshot.data;
        *store.templates.write() = snapshot.templates;
        Ok(store)
    }

    /// Capture the current state
    #[must_use]
    pub fn to_snapshot(&self) -> StoreSnapshot {
        let nodes = self
            .tree
            .read()
            .entries()
            .into_iter()
            .filter(|(path, _)| !path.is_root())
            .map(|(path, info)| SnapshotNode {
                path,
                template_id: info.template_id,
            })
            .collect();
        StoreSnapshot {
            nodes,
            data: self.data.read().clone(),
            templates: self.templates.read().clone(),
        }
    }

    fn move_data(&self, from: &HierarchyPath, to: &HierarchyPath) {
        let mut data = self.data.write();
        let moved: Vec<HierarchyPath> = data
            .keys()
            .filter(|p| from.is_prefix_of(p))
            .cloned()
            .collect();
        for path in moved {
            if let (Some(values), Some(target)) = (data.remove(&path), path.rebase(from, to)) {
                data.insert(target, values);
            }
        }
    }
}

impl HierarchyStore for MemoryStore {
    fn node(&self, path: &HierarchyPath) -> Option<NodeInfo> {
        self.tree.read().get(path).cloned()
    }

    fn add_template(&self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError> {
        debug!(%path, template_id, "adding node");
        self.tree.write().add(path, Some(template_id)).map(|_| ())
    }

    fn delete_node(&self, path: &HierarchyPath) -> Result<(), HierarchyError> {
        debug!(%path, "deleting node");
        self.tree.write().delete(path)?;
        self.data.write().retain(|p, _| !path.is_prefix_of(p));
        Ok(())
    }

    fn rename_node(&self, from: &HierarchyPath, to: &HierarchyPath) -> Result<(), HierarchyError> {
        debug!(%from, %to, "renaming node");
        self.tree.write().rename(from, to)?;
        self.move_data(from, to);
        Ok(())
    }

    fn set_template_id(&self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError> {
        self.tree.write().set_template_id(path, template_id)
    }

    fn reorder_nodes(&self, parent: &HierarchyPath, names: &[String]) -> Result<bool, HierarchyError> {
        self.tree.write().reorder(parent, names)
    }

    fn snapshot(&self) -> HierarchyTree {
        self.tree.read().clone()
    }

    fn is_editor_open(&self) -> bool {
        self.editor_open.load(Ordering::SeqCst)
    }
}

impl DataStore for MemoryStore {
    fn get_value(&self, path: &HierarchyPath, name: &str) -> Option<Value> {
        self.data.read().get(path).and_then(|values| values.get(name)).cloned()
    }

    fn put_value(&self, path: &HierarchyPath, name: &str, value: Option<Value>) {
        let mut data = self.data.write();
        match value {
            Some(value) => {
                data.entry(path.clone()).or_default().insert(name.to_string(), value);
            }
            None => {
                if let Some(values) = data.get_mut(path) {
                    values.remove(name);
                    if values.is_empty() {
                        data.remove(path);
                    }
                }
            }
        }
    }
}

impl TemplateCatalog for MemoryStore {
    fn templates(&self) -> Vec<(String, String)> {
        self.templates
            .read()
            .iter()
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect()
    }
}
