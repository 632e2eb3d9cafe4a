//! The sync worker capability
//!
//! A [`SyncWorker`] is the only way a synchronizer touches the hierarchy and
//! data store. Implementations supply a handful of primitives (node lookup,
//! raw value reads and writes, raw structural changes); the provided methods
//! layer the shared semantics on top:
//!
//! - permission checks on deletion and completion
//! - rename bookkeeping so reports can use original paths
//! - last-synced-value handling in [`SyncWorker::put_value`]
//! - completion and un-completion of leaves and PSP tasks

use chrono::Utc;
use wbs_hierarchy::{is_false, HierarchyError, NodeInfo, Value};
use wbs_model::HierarchyPath;

use crate::ledger::{PathRename, WorkerLedger};
use crate::names::{sync_name, ACTUAL_TIME, COMPLETED, ESTIMATED_TIME, PSP_PHASES};

/// Destination for the effects of a synchronization pass
pub trait SyncWorker {
    /// Activity record
    fn ledger(&self) -> &WorkerLedger;

    /// Mutable activity record
    fn ledger_mut(&mut self) -> &mut WorkerLedger;

    /// Current structure at `path`
    fn node(&self, path: &HierarchyPath) -> Option<NodeInfo>;

    /// Read a value as this worker currently sees it
    fn read_value(&self, path: &HierarchyPath, name: &str) -> Option<Value>;

    /// Write a value without any sync bookkeeping
    fn write_value(&mut self, path: &HierarchyPath, name: &str, value: Option<Value>);

    /// Create a node
    ///
    /// # Errors
    /// Returns the hierarchy's refusal.
    fn apply_add(&mut self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError>;

    /// Delete a node
    ///
    /// # Errors
    /// Returns the hierarchy's refusal.
    fn apply_delete(&mut self, path: &HierarchyPath) -> Result<(), HierarchyError>;

    /// Move a node
    ///
    /// # Errors
    /// Returns the hierarchy's refusal.
    fn apply_rename(&mut self, from: &HierarchyPath, to: &HierarchyPath) -> Result<(), HierarchyError>;

    /// Change a node's template
    ///
    /// # Errors
    /// Returns the hierarchy's refusal.
    fn apply_set_template(&mut self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError>;

    /// Reorder children
    ///
    /// # Errors
    /// Returns the hierarchy's refusal.
    fn apply_reorder(&mut self, parent: &HierarchyPath, names: &[String]) -> Result<bool, HierarchyError>;

    /// True when a node exists at `path`
    fn exists(&self, path: &HierarchyPath) -> bool {
        self.node(path).is_some()
    }

    /// Template of the node at `path`
    fn template_id(&self, path: &HierarchyPath) -> Option<String> {
        self.node(path).and_then(|n| n.template_id)
    }

    /// Child names of the node at `path`
    fn child_names(&self, path: &HierarchyPath) -> Vec<String> {
        self.node(path).map(|n| n.children).unwrap_or_default()
    }

    /// True for an existing node without children
    fn is_leaf(&self, path: &HierarchyPath) -> bool {
        self.node(path).is_some_and(|n| n.is_leaf())
    }

    /// Read a value
    fn get_value(&self, path: &HierarchyPath, name: &str) -> Option<Value> {
        self.read_value(path, name)
    }

    /// Instantiate a template
    ///
    /// # Errors
    /// Fails when the path is occupied by an incompatible node.
    fn add_template(&mut self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError> {
        self.apply_add(path, template_id)?;
        self.ledger_mut().nodes_added.push(path.clone());
        Ok(())
    }

    /// Delete a node if permitted; returns whether it was deleted
    ///
    /// # Errors
    /// Returns the hierarchy's refusal.
    fn delete_node(&mut self, path: &HierarchyPath) -> Result<bool, HierarchyError> {
        let original = self.original_path(path);
        if !self.ledger().deletions_allowed.allows(&original) {
            self.ledger_mut().deletions_withheld.push(original);
            return Ok(false);
        }
        self.apply_delete(path)?;
        self.ledger_mut().nodes_deleted.push(original);
        Ok(true)
    }

    /// Move a node, keeping its data
    ///
    /// # Errors
    /// Fails when the target is occupied.
    fn rename_node(&mut self, from: &HierarchyPath, to: &HierarchyPath) -> Result<(), HierarchyError> {
        self.apply_rename(from, to)?;
        self.ledger_mut().renames.push(PathRename {
            from: from.clone(),
            to: to.clone(),
        });
        Ok(())
    }

    /// Change a node's template
    ///
    /// # Errors
    /// Fails for a missing node.
    fn set_template_id(&mut self, path: &HierarchyPath, template_id: &str) -> Result<(), HierarchyError> {
        self.apply_set_template(path, template_id)
    }

    /// Put named children first; returns whether anything moved
    ///
    /// # Errors
    /// Fails for a missing parent.
    fn reorder_nodes(&mut self, parent: &HierarchyPath, names: &[String]) -> Result<bool, HierarchyError> {
        self.apply_reorder(parent, names)
    }

    /// Remember the value the other side last saw, for the next `put_value`
    fn set_last_reverse_synced(&mut self, value: Option<Value>) {
        self.ledger_mut().last_reverse_synced = value;
    }

    /// Write a value sync-style; returns whether the visible value changed
    ///
    /// Numbers (and any value preceded by [`Self::set_last_reverse_synced`])
    /// keep a `_Last_Synced_Val` companion. A local edit, meaning a current
    /// value that is set and differs from both the companion and the
    /// reverse-synced value, is left alone.
    fn put_value(&mut self, path: &HierarchyPath, name: &str, value: Option<Value>) -> bool {
        let current = self.get_value(path, name);
        let last_reverse = self.ledger_mut().last_reverse_synced.take();
        if value.is_none() && current.is_none() {
            return false;
        }

        let tracked = matches!(value, Some(Value::Number(_))) || last_reverse.is_some();
        if !tracked {
            if value == current {
                return false;
            }
            self.write_value(path, name, value);
            self.ledger_mut().note_data_changed(path, name);
            return true;
        }

        let companion = sync_name(name);
        let last_synced = self.get_value(path, &companion);
        if value == current {
            if value != last_synced {
                self.write_value(path, &companion, value);
            }
            return false;
        }

        let overwritable = is_false(current.as_ref())
            || current == last_synced
            || (last_reverse.is_some() && current == last_reverse);
        if !overwritable {
            return false;
        }
        self.write_value(path, name, value.clone());
        self.write_value(path, &companion, value);
        self.ledger_mut().note_data_changed(path, name);
        true
    }

    /// Write a value with no sync semantics and no change tracking
    fn put_value_force(&mut self, path: &HierarchyPath, name: &str, value: Option<Value>) {
        self.write_value(path, name, value);
    }

    /// Complete a leaf task if permitted; returns whether anything changed
    ///
    /// The plan is set to the recorded actual time so the task stops
    /// contributing remaining work.
    fn mark_leaf_complete(&mut self, path: &HierarchyPath) -> bool {
        if self.get_value(path, COMPLETED).is_some() {
            return false;
        }
        let original = self.original_path(path);
        if !self.ledger().completions_allowed.allows(&original) {
            self.ledger_mut().completions_withheld.push(original);
            return false;
        }
        if let Some(actual @ Value::Number(_)) = self.get_value(path, ACTUAL_TIME) {
            self.write_value(path, ESTIMATED_TIME, Some(actual.clone()));
            self.write_value(path, &sync_name(ESTIMATED_TIME), Some(actual));
        }
        let now = Value::Date(Utc::now());
        self.write_value(path, COMPLETED, Some(now.clone()));
        self.write_value(path, &sync_name(COMPLETED), Some(now));
        self.ledger_mut().nodes_completed.push(original);
        true
    }

    /// Undo a completion that sync made; returns whether it was undone
    fn mark_leaf_incomplete(&mut self, path: &HierarchyPath) -> bool {
        let completed = self.get_value(path, COMPLETED);
        if completed.is_none() || completed != self.get_value(path, &sync_name(COMPLETED)) {
            return false;
        }
        self.write_value(path, COMPLETED, None);
        self.write_value(path, &sync_name(COMPLETED), None);
        true
    }

    /// Complete every phase of a PSP task if permitted
    fn mark_psp_task_complete(&mut self, path: &HierarchyPath) -> bool {
        let open: Vec<HierarchyPath> = PSP_PHASES
            .iter()
            .map(|phase| path.child(*phase))
            .filter(|phase| self.get_value(phase, COMPLETED).is_none())
            .collect();
        if open.is_empty() {
            return false;
        }
        let original = self.original_path(path);
        if !self.ledger().completions_allowed.allows(&original) {
            self.ledger_mut().completions_withheld.push(original);
            return false;
        }
        let now = Value::Date(Utc::now());
        for phase in open {
            self.write_value(&phase, COMPLETED, Some(now.clone()));
            self.write_value(&phase, &sync_name(COMPLETED), Some(now.clone()));
        }
        self.ledger_mut().nodes_completed.push(original);
        true
    }

    /// Undo sync-made completion of PSP phases
    fn mark_psp_task_incomplete(&mut self, path: &HierarchyPath) -> bool {
        let mut undone = false;
        for phase in PSP_PHASES {
            undone |= self.mark_leaf_incomplete(&path.child(phase));
        }
        undone
    }

    /// Where the node now at `path` lived before this pass
    fn original_path(&self, path: &HierarchyPath) -> HierarchyPath {
        self.ledger().original_path(path)
    }

    /// True once any node has moved in this pass
    fn nodes_were_renamed(&self) -> bool {
        self.ledger().nodes_were_renamed()
    }
}
