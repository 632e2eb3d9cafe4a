//! Worker that applies changes to the real store

use tracing::debug;
use wbs_hierarchy::{HierarchyError, NodeInfo, ProjectStore, Value};
use wbs_model::HierarchyPath;

use crate::ledger::{Permissions, WorkerLedger};
use crate::worker::SyncWorker;

/// Mutates the live hierarchy and data store directly
#[derive(Debug)]
pub struct LiveWorker<'s, S: ProjectStore + ?Sized> {
    store: &'s S,
    ledger: WorkerLedger,
}

impl<'s, S: ProjectStore + ?Sized> LiveWorker<'s, S> {
    /// Worker over `store` with the given destructive-operation permissions
    #[must_use]
    pub fn new(store: &'s S, deletions: Permissions, completions: Permissions) -> Self {
        Self {
            store,
            ledger: WorkerLedger::new(deletions, completions),
        }
    }
}

impl<S: ProjectStore + ?Sized> SyncWorker for LiveWorker<'_, S> {
    fn ledger(&self) -> &WorkerLedger {
        &self.ledger
    }

    fn ledger_mut(&mut self) -> &mut WorkerLedger {
        &mut self.ledger
    }

    fn node(&self, path: &HierarchyPath) -> Option<NodeInfo> {
        self.store.node(path)
    }

    fn read_value(&self, path: &HierarchyPath, name: &str) -> Option<Value> {
        self.store.get_value(path, name)
    }

    fn write_value(&mut self, path: &HierarchyPath, name: &str, value: Option<Value>) {
        self.store.put_value(path, name, value);
    }

    fn apply_add(&mut self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError> {
        debug!(%path, template_id, "adding node");
        self.store.add_template(path, template_id)
    }

    fn apply_delete(&mut self, path: &HierarchyPath) -> Result<(), HierarchyError> {
        debug!(%path, "deleting node");
        self.store.delete_node(path)
    }

    fn apply_rename(&mut self, from: &HierarchyPath, to: &HierarchyPath) -> Result<(), HierarchyError> {
        debug!(%from, %to, "renaming node");
        self.store.rename_node(from, to)
    }

    fn apply_set_template(&mut self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError> {
        self.store.set_template_id(path, template_id)
    }

    fn apply_reorder(&mut self, parent: &HierarchyPath, names: &[String]) -> Result<bool, HierarchyError> {
        self.store.reorder_nodes(parent, names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names::{sync_name, ESTIMATED_TIME};
    use wbs_hierarchy::{DataStore, HierarchyStore, MemoryStore};

    fn p(s: &str) -> HierarchyPath {
        s.parse().unwrap()
    }

    #[test]
    fn put_value_respects_local_edits() {
        let store = MemoryStore::new();
        store.insert_node(&p("/P/Task"), None).unwrap();
        let mut worker = LiveWorker::new(&store, Permissions::all(), Permissions::all());

        assert!(worker.put_value(&p("/P/Task"), ESTIMATED_TIME, Some(Value::from(4.0))));
        assert_eq!(
            store.get_value(&p("/P/Task"), &sync_name(ESTIMATED_TIME)),
            Some(Value::from(4.0))
        );

        // the user edits the plan locally
        store.put_value(&p("/P/Task"), ESTIMATED_TIME, Some(Value::from(6.0)));
        assert!(!worker.put_value(&p("/P/Task"), ESTIMATED_TIME, Some(Value::from(5.0))));
        assert_eq!(store.get_value(&p("/P/Task"), ESTIMATED_TIME), Some(Value::from(6.0)));
    }

    #[test]
    fn put_value_same_value_is_quiet() {
        let store = MemoryStore::new();
        let mut worker = LiveWorker::new(&store, Permissions::all(), Permissions::all());
        assert!(worker.put_value(&p("/P"), "Label", Some(Value::from("x"))));
        assert!(!worker.put_value(&p("/P"), "Label", Some(Value::from("x"))));
        assert_eq!(worker.ledger().data_changed().len(), 1);
    }

    #[test]
    fn delete_requires_permission() {
        let store = MemoryStore::new();
        store.insert_node(&p("/P/A"), None).unwrap();
        store.insert_node(&p("/P/B"), None).unwrap();
        let mut worker = LiveWorker::new(&store, Permissions::only([p("/P/A")]), Permissions::all());
        assert!(worker.delete_node(&p("/P/A")).unwrap());
        assert!(!worker.delete_node(&p("/P/B")).unwrap());
        assert!(store.node(&p("/P/B")).is_some());
        assert_eq!(worker.ledger().nodes_deleted(), [p("/P/A")]);
    }

    #[test]
    fn completion_roundtrip() {
        let store = MemoryStore::new();
        store.insert_node(&p("/P/A"), None).unwrap();
        store.put_value(&p("/P/A"), "Time", Some(Value::from(12.0)));
        let mut worker = LiveWorker::new(&store, Permissions::all(), Permissions::all());
        assert!(worker.mark_leaf_complete(&p("/P/A")));
        assert!(!worker.mark_leaf_complete(&p("/P/A")));
        assert_eq!(store.get_value(&p("/P/A"), ESTIMATED_TIME), Some(Value::from(12.0)));
        assert!(worker.mark_leaf_incomplete(&p("/P/A")));
        assert!(store.get_value(&p("/P/A"), "Completed").is_none());
    }

    #[test]
    fn user_completion_is_not_undone() {
        let store = MemoryStore::new();
        store.insert_node(&p("/P/A"), None).unwrap();
        store.put_value(&p("/P/A"), "Completed", Some(Value::Date(chrono::Utc::now())));
        let mut worker = LiveWorker::new(&store, Permissions::all(), Permissions::all());
        assert!(!worker.mark_leaf_incomplete(&p("/P/A")));
    }
}
