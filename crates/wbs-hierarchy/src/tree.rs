//! Hierarchy structure
//!
//! [`HierarchyTree`] holds node templates and ordered child lists, keyed by
//! path in a radix trie. It carries no data values; those live beside it in
//! the data store. A tree can be cloned cheaply enough to serve as the private
//! copy a simulation mutates.

use radix_trie::Trie;
use serde::{Deserialize, Serialize};
use wbs_model::HierarchyPath;

use crate::error::HierarchyError;

/// One node of the live hierarchy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Template the node was instantiated from
    pub template_id: Option<String>,
    /// Child names in display order
    pub children: Vec<String>,
}

impl NodeInfo {
    /// True when the node has no children
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Node structure of a hierarchy
#[derive(Debug, Clone)]
pub struct HierarchyTree {
    nodes: Trie<String, NodeInfo>,
}

/// Trie key for a path; the trailing slash keeps `/a/b` from prefixing `/a/bc`
fn key(path: &HierarchyPath) -> String {
    format!("{path}/")
}

impl HierarchyTree {
    /// A tree holding only the root
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Trie::new();
        nodes.insert(key(&HierarchyPath::root()), NodeInfo::default());
        Self { nodes }
    }

    /// Look up a node
    #[must_use]
    pub fn get(&self, path: &HierarchyPath) -> Option<&NodeInfo> {
        self.nodes.get(&key(path))
    }

    /// True when a node exists at `path`
    #[inline]
    #[must_use]
    pub fn contains(&self, path: &HierarchyPath) -> bool {
        self.get(path).is_some()
    }

    /// Create a node (and any missing ancestors as plain nodes)
    ///
    /// Adding a node that already exists with the same template is a no-op
    /// and returns `Ok(false)`.
    ///
    /// # Errors
    /// Fails when the path is the root or is occupied by a node with a
    /// different template.
    pub fn add(
        &mut self,
        path: &HierarchyPath,
        template_id: Option<&str>,
    ) -> Result<bool, HierarchyError> {
        let Some(parent) = path.parent() else {
            return Err(HierarchyError::alteration(path, "the root cannot be replaced"));
        };
        if let Some(existing) = self.get(path) {
            return if existing.template_id.as_deref() == template_id {
                Ok(false)
            } else {
                Err(HierarchyError::alteration(path, "existing node is in the way"))
            };
        }
        if !self.contains(&parent) {
            self.add(&parent, None)?;
        }
        let name = path.name().unwrap_or_default().to_string();
        if let Some(info) = self.nodes.get_mut(&key(&parent)) {
            info.children.push(name);
        }
        self.nodes.insert(
            key(path),
            NodeInfo {
                template_id: template_id.map(String::from),
                children: Vec::new(),
            },
        );
        Ok(true)
    }

    /// Remove a node and its subtree
    ///
    /// # Errors
    /// Fails for the root or a missing node.
    pub fn delete(&mut self, path: &HierarchyPath) -> Result<(), HierarchyError> {
        let Some(parent) = path.parent() else {
            return Err(HierarchyError::alteration(path, "the root cannot be deleted"));
        };
        if !self.contains(path) {
            return Err(HierarchyError::NotFound(path.clone()));
        }
        for node in self.subtree(path) {
            self.nodes.remove(&key(&node));
        }
        if let (Some(info), Some(name)) = (self.nodes.get_mut(&key(&parent)), path.name()) {
            info.children.retain(|c| c != name);
        }
        Ok(())
    }

    /// Move a node (with its subtree) to a new path
    ///
    /// A rename within the same parent keeps the node's position.
    ///
    /// # Errors
    /// Fails when the source is missing, the target exists, or the target
    /// lies inside the source.
    pub fn rename(&mut self, from: &HierarchyPath, to: &HierarchyPath) -> Result<(), HierarchyError> {
        let (Some(from_parent), Some(to_parent)) = (from.parent(), to.parent()) else {
            return Err(HierarchyError::alteration(from, "the root cannot be renamed"));
        };
        if !self.contains(from) {
            return Err(HierarchyError::NotFound(from.clone()));
        }
        if self.contains(to) {
            return Err(HierarchyError::alteration(to, "existing node is in the way"));
        }
        if from.is_prefix_of(to) {
            return Err(HierarchyError::alteration(to, "cannot move a node inside itself"));
        }
        if !self.contains(&to_parent) {
            self.add(&to_parent, None)?;
        }

        let moved: Vec<(HierarchyPath, NodeInfo)> = self
            .subtree(from)
            .into_iter()
            .filter_map(|p| {
                let info = self.nodes.remove(&key(&p))?;
                let target = p.rebase(from, to)?;
                Some((target, info))
            })
            .collect();
        for (path, info) in moved {
            self.nodes.insert(key(&path), info);
        }

        let old_name = from.name().unwrap_or_default();
        let new_name = to.name().unwrap_or_default().to_string();
        if from_parent == to_parent {
            if let Some(info) = self.nodes.get_mut(&key(&from_parent)) {
                for child in &mut info.children {
                    if child == old_name {
                        child.clone_from(&new_name);
                    }
                }
            }
        } else {
            if let Some(info) = self.nodes.get_mut(&key(&from_parent)) {
                info.children.retain(|c| c != old_name);
            }
            if let Some(info) = self.nodes.get_mut(&key(&to_parent)) {
                info.children.push(new_name);
            }
        }
        Ok(())
    }

    /// Change the template of an existing node
    ///
    /// # Errors
    /// Fails for a missing node.
    pub fn set_template_id(
        &mut self,
        path: &HierarchyPath,
        template_id: &str,
    ) -> Result<(), HierarchyError> {
        let info = self
            .nodes
            .get_mut(&key(path))
            .ok_or_else(|| HierarchyError::NotFound(path.clone()))?;
        info.template_id = Some(template_id.to_string());
        Ok(())
    }

    /// Put the named children first, in the given order
    ///
    /// Children not named keep their relative order after the named ones.
    /// Returns whether anything moved.
    ///
    /// # Errors
    /// Fails for a missing parent.
    pub fn reorder(&mut self, parent: &HierarchyPath, names: &[String]) -> Result<bool, HierarchyError> {
        let info = self
            .nodes
            .get_mut(&key(parent))
            .ok_or_else(|| HierarchyError::NotFound(parent.clone()))?;
        let mut ordered: Vec<String> = names
            .iter()
            .filter(|n| info.children.contains(n))
            .cloned()
            .collect();
        ordered.dedup();
        for child in &info.children {
            if !ordered.contains(child) {
                ordered.push(child.clone());
            }
        }
        if ordered == info.children {
            return Ok(false);
        }
        info.children = ordered;
        Ok(true)
    }

    /// `path` and every descendant, parents before children
    #[must_use]
    pub fn subtree(&self, path: &HierarchyPath) -> Vec<HierarchyPath> {
        let mut out = Vec::new();
        let mut stack = vec![path.clone()];
        while let Some(current) = stack.pop() {
            let Some(info) = self.get(&current) else {
                continue;
            };
            for child in info.children.iter().rev() {
                stack.push(current.child(child.clone()));
            }
            out.push(current);
        }
        out
    }

    /// Every node with its info, parents before children
    #[must_use]
    pub fn entries(&self) -> Vec<(HierarchyPath, NodeInfo)> {
        self.subtree(&HierarchyPath::root())
            .into_iter()
            .filter_map(|p| self.get(&p).cloned().map(|info| (p, info)))
            .collect()
    }
}

impl Default for HierarchyTree {
    fn default() -> Self {
        Self::new()
    }
}
