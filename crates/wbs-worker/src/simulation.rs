//! Worker that only simulates changes
//!
//! A dry run must leave the store untouched. [`SimulationWorker`] mutates a
//! private copy of the hierarchy structure and keeps written values in an
//! overlay that shadows reads; everything else falls through to the real
//! store, translated back to pre-rename paths. Nodes created in the
//! simulation, and paths a node moved away from, have no store values.

use std::collections::HashMap;

use wbs_hierarchy::{HierarchyError, HierarchyTree, NodeInfo, ProjectStore, Value};
use wbs_model::HierarchyPath;

use crate::ledger::{Permissions, WorkerLedger};
use crate::worker::SyncWorker;

/// Structural change made to the simulated tree
#[derive(Debug, Clone)]
enum TreeEvent {
    Added(HierarchyPath),
    Moved { from: HierarchyPath, to: HierarchyPath },
}

/// Dry-run worker
#[derive(Debug)]
pub struct SimulationWorker<'s, S: ProjectStore + ?Sized> {
    store: &'s S,
    tree: HierarchyTree,
    overlay: HashMap<(HierarchyPath, String), Option<Value>>,
    /// Original paths of deleted subtrees
    removed: Vec<HierarchyPath>,
    /// Adds and moves, oldest first
    events: Vec<TreeEvent>,
    ledger: WorkerLedger,
}

impl<'s, S: ProjectStore + ?Sized> SimulationWorker<'s, S> {
    /// Simulate on top of `store`; every destructive operation is allowed
    #[must_use]
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            tree: store.snapshot(),
            overlay: HashMap::new(),
            removed: Vec::new(),
            events: Vec::new(),
            ledger: WorkerLedger::new(Permissions::all(), Permissions::all()),
        }
    }

    /// The simulated structure
    #[inline]
    #[must_use]
    pub fn tree(&self) -> &HierarchyTree {
        &self.tree
    }

    /// Store path holding the values of the node now at `path`, if any
    fn store_path(&self, path: &HierarchyPath) -> Option<HierarchyPath> {
        let mut current = path.clone();
        for event in self.events.iter().rev() {
            match event {
                TreeEvent::Added(added) if added.is_prefix_of(&current) => return None,
                TreeEvent::Moved { from, to } => {
                    if let Some(earlier) = current.rebase(to, from) {
                        current = earlier;
                    } else if from.is_prefix_of(&current) {
                        return None;
                    }
                }
                TreeEvent::Added(_) => {}
            }
        }
        (!self.removed.iter().any(|r| r.is_prefix_of(&current))).then_some(current)
    }
}

impl<S: ProjectStore + ?Sized> SyncWorker for SimulationWorker<'_, S> {
    fn ledger(&self) -> &WorkerLedger {
        &self.ledger
    }

    fn ledger_mut(&mut self) -> &mut WorkerLedger {
        &mut self.ledger
    }

    fn node(&self, path: &HierarchyPath) -> Option<NodeInfo> {
        self.tree.get(path).cloned()
    }

    fn read_value(&self, path: &HierarchyPath, name: &str) -> Option<Value> {
        if let Some(shadowed) = self.overlay.get(&(path.clone(), name.to_string())) {
            return shadowed.clone();
        }
        self.store_path(path)
            .and_then(|original| self.store.get_value(&original, name))
    }

    fn write_value(&mut self, path: &HierarchyPath, name: &str, value: Option<Value>) {
        self.overlay.insert((path.clone(), name.to_string()), value);
    }

    fn apply_add(&mut self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError> {
        if self.tree.add(path, Some(template_id))? {
            self.events.push(TreeEvent::Added(path.clone()));
        }
        Ok(())
    }

    fn apply_delete(&mut self, path: &HierarchyPath) -> Result<(), HierarchyError> {
        self.tree.delete(path)?;
        if let Some(original) = self.store_path(path) {
            self.removed.push(original);
        }
        self.overlay.retain(|(p, _), _| !path.is_prefix_of(p));
        Ok(())
    }

    fn apply_rename(&mut self, from: &HierarchyPath, to: &HierarchyPath) -> Result<(), HierarchyError> {
        self.tree.rename(from, to)?;
        self.events.push(TreeEvent::Moved {
            from: from.clone(),
            to: to.clone(),
        });
        let moved: Vec<(HierarchyPath, String)> = self
            .overlay
            .keys()
            .filter(|(p, _)| from.is_prefix_of(p))
            .cloned()
            .collect();
        for key in moved {
            if let (Some(value), Some(target)) = (self.overlay.remove(&key), key.0.rebase(from, to)) {
                self.overlay.insert((target, key.1), value);
            }
        }
        Ok(())
    }

    fn apply_set_template(&mut self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError> {
        self.tree.set_template_id(path, template_id)
    }

    fn apply_reorder(&mut self, parent: &HierarchyPath, names: &[String]) -> Result<bool, HierarchyError> {
        self.tree.reorder(parent, names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wbs_hierarchy::{DataStore, HierarchyStore, MemoryStore};

    fn p(s: &str) -> HierarchyPath {
        s.parse().unwrap()
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_node(&p("/P/Old/Code"), Some("T")).unwrap();
        store.put_value(&p("/P/Old/Code"), "Time", Some(Value::from(30.0)));
        store
    }

    #[test]
    fn writes_stay_in_overlay() {
        let store = store();
        let before = store.to_snapshot();
        let mut worker = SimulationWorker::new(&store);
        worker.put_value(&p("/P/Old/Code"), "Estimated Time", Some(Value::from(2.0)));
        worker.add_template(&p("/P/New"), "T").unwrap();
        assert_eq!(worker.get_value(&p("/P/Old/Code"), "Estimated Time"), Some(Value::from(2.0)));
        assert!(worker.exists(&p("/P/New")));
        assert_eq!(store.to_snapshot(), before);
    }

    #[test]
    fn reads_follow_renames_back_to_store() {
        let store = store();
        let mut worker = SimulationWorker::new(&store);
        worker.rename_node(&p("/P/Old"), &p("/P/Renamed")).unwrap();
        assert_eq!(worker.get_value(&p("/P/Renamed/Code"), "Time"), Some(Value::from(30.0)));
        assert!(store.node(&p("/P/Old")).is_some());
    }

    #[test]
    fn node_created_where_another_moved_away_starts_empty() {
        let store = store();
        let mut worker = SimulationWorker::new(&store);
        worker.rename_node(&p("/P/Old"), &p("/P/Old (non-WBS)")).unwrap();
        assert_eq!(worker.get_value(&p("/P/Old/Code"), "Time"), None);

        worker.add_template(&p("/P/Old"), "T").unwrap();
        worker.add_template(&p("/P/Old/Code"), "T").unwrap();
        assert_eq!(worker.get_value(&p("/P/Old/Code"), "Time"), None);
        assert_eq!(
            worker.get_value(&p("/P/Old (non-WBS)/Code"), "Time"),
            Some(Value::from(30.0))
        );
    }

    #[test]
    fn node_moved_into_a_new_parent_keeps_its_values() {
        let store = store();
        let mut worker = SimulationWorker::new(&store);
        worker.add_template(&p("/P/Fresh"), "T").unwrap();
        worker.rename_node(&p("/P/Old/Code"), &p("/P/Fresh/Code")).unwrap();
        assert_eq!(worker.get_value(&p("/P/Fresh/Code"), "Time"), Some(Value::from(30.0)));
        assert_eq!(worker.get_value(&p("/P/Fresh"), "Time"), None);
    }

    #[test]
    fn deleted_nodes_read_as_empty() {
        let store = store();
        let mut worker = SimulationWorker::new(&store);
        worker.delete_node(&p("/P/Old")).unwrap();
        assert_eq!(worker.get_value(&p("/P/Old/Code"), "Time"), None);
        assert_eq!(worker.ledger().nodes_deleted(), [p("/P/Old")]);
    }
}
