//! Call-recording decorator
//!
//! [`LoggingWorker`] wraps any worker and records each data read, data write,
//! structural change and completion call with its result. The trace is kept
//! for writing to a debug log and is also emitted at `trace` level.

use parking_lot::Mutex;
use tracing::trace;
use wbs_hierarchy::{HierarchyError, NodeInfo, Value};
use wbs_model::HierarchyPath;

use crate::ledger::WorkerLedger;
use crate::worker::SyncWorker;

/// Decorator recording every call made through it
#[derive(Debug)]
pub struct LoggingWorker<W> {
    inner: W,
    trace: Mutex<Vec<String>>,
}

impl<W: SyncWorker> LoggingWorker<W> {
    /// Wrap `inner`
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            trace: Mutex::new(Vec::new()),
        }
    }

    /// The wrapped worker
    #[inline]
    #[must_use]
    pub fn inner(&self) -> &W {
        &self.inner
    }

    /// Recorded calls so far
    #[must_use]
    pub fn trace(&self) -> Vec<String> {
        self.trace.lock().clone()
    }

    /// Unwrap into the inner worker and the recorded calls
    #[must_use]
    pub fn into_parts(self) -> (W, Vec<String>) {
        (self.inner, self.trace.into_inner())
    }

    fn record(&self, line: String) {
        trace!(target: "wbs_worker::calls", "{line}");
        self.trace.lock().push(line);
    }
}

fn show(value: Option<&Value>) -> String {
    value.map_or_else(|| "null".to_string(), ToString::to_string)
}

impl<W: SyncWorker> SyncWorker for LoggingWorker<W> {
    fn ledger(&self) -> &WorkerLedger {
        self.inner.ledger()
    }

    fn ledger_mut(&mut self) -> &mut WorkerLedger {
        self.inner.ledger_mut()
    }

    fn node(&self, path: &HierarchyPath) -> Option<NodeInfo> {
        self.inner.node(path)
    }

    fn read_value(&self, path: &HierarchyPath, name: &str) -> Option<Value> {
        self.inner.read_value(path, name)
    }

    fn write_value(&mut self, path: &HierarchyPath, name: &str, value: Option<Value>) {
        self.inner.write_value(path, name, value);
    }

    fn apply_add(&mut self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError> {
        self.inner.apply_add(path, template_id)
    }

    fn apply_delete(&mut self, path: &HierarchyPath) -> Result<(), HierarchyError> {
        self.inner.apply_delete(path)
    }

    fn apply_rename(&mut self, from: &HierarchyPath, to: &HierarchyPath) -> Result<(), HierarchyError> {
        self.inner.apply_rename(from, to)
    }

    fn apply_set_template(&mut self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError> {
        self.inner.apply_set_template(path, template_id)
    }

    fn apply_reorder(&mut self, parent: &HierarchyPath, names: &[String]) -> Result<bool, HierarchyError> {
        self.inner.apply_reorder(parent, names)
    }

    fn get_value(&self, path: &HierarchyPath, name: &str) -> Option<Value> {
        let value = self.inner.get_value(path, name);
        self.record(format!("getValue({path}/{name}) -> {}", show(value.as_ref())));
        value
    }

    fn add_template(&mut self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError> {
        let result = self.inner.add_template(path, template_id);
        self.record(format!("addTemplate({path}, {template_id}) -> {result:?}"));
        result
    }

    fn delete_node(&mut self, path: &HierarchyPath) -> Result<bool, HierarchyError> {
        let result = self.inner.delete_node(path);
        self.record(format!("deleteNode({path}) -> {result:?}"));
        result
    }

    fn rename_node(&mut self, from: &HierarchyPath, to: &HierarchyPath) -> Result<(), HierarchyError> {
        let result = self.inner.rename_node(from, to);
        self.record(format!("renameNode({from}, {to}) -> {result:?}"));
        result
    }

    fn set_template_id(&mut self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError> {
        let result = self.inner.set_template_id(path, template_id);
        self.record(format!("setTemplateId({path}, {template_id}) -> {result:?}"));
        result
    }

    fn reorder_nodes(&mut self, parent: &HierarchyPath, names: &[String]) -> Result<bool, HierarchyError> {
        let result = self.inner.reorder_nodes(parent, names);
        self.record(format!("reorderNodes({parent}, {names:?}) -> {result:?}"));
        result
    }

    fn set_last_reverse_synced(&mut self, value: Option<Value>) {
        self.record(format!("setLastReverseSynced({})", show(value.as_ref())));
        self.inner.set_last_reverse_synced(value);
    }

    fn put_value(&mut self, path: &HierarchyPath, name: &str, value: Option<Value>) -> bool {
        let shown = show(value.as_ref());
        let changed = self.inner.put_value(path, name, value);
        self.record(format!("putValue({path}/{name}, {shown}) -> {changed}"));
        changed
    }

    fn put_value_force(&mut self, path: &HierarchyPath, name: &str, value: Option<Value>) {
        self.record(format!("putValueForce({path}/{name}, {})", show(value.as_ref())));
        self.inner.put_value_force(path, name, value);
    }

    fn mark_leaf_complete(&mut self, path: &HierarchyPath) -> bool {
        let result = self.inner.mark_leaf_complete(path);
        self.record(format!("markLeafComplete({path}) -> {result}"));
        result
    }

    fn mark_leaf_incomplete(&mut self, path: &HierarchyPath) -> bool {
        let result = self.inner.mark_leaf_incomplete(path);
        self.record(format!("markLeafIncomplete({path}) -> {result}"));
        result
    }

    fn mark_psp_task_complete(&mut self, path: &HierarchyPath) -> bool {
        let result = self.inner.mark_psp_task_complete(path);
        self.record(format!("markPSPTaskComplete({path}) -> {result}"));
        result
    }

    fn mark_psp_task_incomplete(&mut self, path: &HierarchyPath) -> bool {
        let result = self.inner.mark_psp_task_incomplete(path);
        self.record(format!("markPSPTaskIncomplete({path}) -> {result}"));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SimulationWorker;
    use wbs_hierarchy::MemoryStore;

    #[test]
    fn records_calls_and_delegates() {
        let store = MemoryStore::new();
        let mut worker = LoggingWorker::new(SimulationWorker::new(&store));
        let path: HierarchyPath = "/P/A".parse().unwrap();
        worker.add_template(&path, "T").unwrap();
        worker.put_value(&path, "Estimated Time", Some(Value::from(3.0)));

        let trace = worker.trace();
        assert_eq!(trace[0], "addTemplate(/P/A, T) -> Ok(())");
        assert!(trace.iter().any(|l| l == "putValue(/P/A/Estimated Time, 3) -> true"));

        let (inner, _) = worker.into_parts();
        assert_eq!(inner.ledger().nodes_added(), [path]);
    }
}
