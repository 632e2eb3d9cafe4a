//! Read-only walks over the live hierarchy
//!
//! Run through the worker before a pass mutates anything, so a dry run and a
//! live run see the same starting state.

use std::collections::HashSet;

use wbs_hierarchy::Value;
use wbs_model::{HierarchyPath, ROOT_PSEUDO_ID};
use wbs_worker::names::{ACTUAL_TIME, ESTIMATED_TIME};
use wbs_worker::SyncWorker;

use crate::names::{DEFECT_COUNTS, WBS_ID};

fn number(value: Option<Value>) -> f64 {
    value.and_then(|v| v.as_number()).unwrap_or(0.0)
}

/// WBS ID recorded on a live node
pub(crate) fn wbs_id_at<W: SyncWorker + ?Sized>(worker: &W, path: &HierarchyPath) -> Option<String> {
    worker
        .get_value(path, WBS_ID)
        .and_then(|v| v.as_text().map(str::to_string))
        .filter(|s| !s.is_empty())
}

/// True for PSP task templates
pub(crate) fn is_psp_template(template_id: Option<&str>) -> bool {
    template_id.is_some_and(|t| t.starts_with("PSP"))
}

fn children<W: SyncWorker + ?Sized>(worker: &W, path: &HierarchyPath) -> Vec<HierarchyPath> {
    worker
        .child_names(path)
        .into_iter()
        .map(|name| path.child(name))
        .collect()
}

/// Actual time logged on `path` and its descendants
pub(crate) fn total_actual_time<W: SyncWorker + ?Sized>(worker: &W, path: &HierarchyPath) -> f64 {
    number(worker.get_value(path, ACTUAL_TIME))
        + children(worker, path)
            .iter()
            .map(|c| total_actual_time(worker, c))
            .sum::<f64>()
}

/// Planned time on `path` and its descendants, not descending into PSP tasks
pub(crate) fn total_plan_time<W: SyncWorker + ?Sized>(worker: &W, path: &HierarchyPath) -> f64 {
    let own = number(worker.get_value(path, ESTIMATED_TIME));
    if is_psp_template(worker.template_id(path).as_deref()) {
        return own;
    }
    own + children(worker, path)
        .iter()
        .map(|c| total_plan_time(worker, c))
        .sum::<f64>()
}

fn has_defects<W: SyncWorker + ?Sized>(worker: &W, path: &HierarchyPath) -> bool {
    DEFECT_COUNTS
        .iter()
        .any(|name| number(worker.get_value(path, name)) != 0.0)
        || children(worker, path).iter().any(|c| has_defects(worker, c))
}

/// Nodes under `root` with no recorded history anywhere in their subtree
///
/// Nodes for which `user_created` holds are never deletable, and neither are
/// their ancestors.
pub(crate) fn deletable_nodes<W, F>(worker: &W, root: &HierarchyPath, user_created: F) -> HashSet<HierarchyPath>
where
    W: SyncWorker + ?Sized,
    F: Fn(&HierarchyPath) -> bool,
{
    fn visit<W, F>(worker: &W, user_created: &F, path: &HierarchyPath, out: &mut HashSet<HierarchyPath>) -> bool
    where
        W: SyncWorker + ?Sized,
        F: Fn(&HierarchyPath) -> bool,
    {
        let mut deletable = true;
        if !is_psp_template(worker.template_id(path).as_deref()) {
            for child in children(worker, path) {
                deletable &= visit(worker, user_created, &child, out);
            }
        }
        deletable = deletable
            && !user_created(path)
            && total_actual_time(worker, path) == 0.0
            && !has_defects(worker, path);
        if deletable {
            out.insert(path.clone());
        }
        deletable
    }

    let mut out = HashSet::new();
    visit(worker, &user_created, root, &mut out);
    out
}

/// WBS ID of a node, or a pseudo ID built from the nearest WBS ancestor
pub(crate) fn pseudo_id<W: SyncWorker + ?Sized>(worker: &W, root: &HierarchyPath, path: &HierarchyPath) -> String {
    if path == root {
        return ROOT_PSEUDO_ID.to_string();
    }
    if let Some(id) = wbs_id_at(worker, path) {
        return id;
    }
    match (path.parent(), path.name()) {
        (Some(parent), Some(name)) if root.is_prefix_of(&parent) => {
            format!("{}/{name}", pseudo_id(worker, root, &parent))
        }
        _ => ROOT_PSEUDO_ID.to_string(),
    }
}

/// Pseudo IDs of live nodes that will still exist after the pass
///
/// A node (and everything under it) may disappear if `may_disappear` says so;
/// every other node must stay visible to pruning.
pub(crate) fn keep_ids<W, F>(worker: &W, root: &HierarchyPath, may_disappear: F) -> HashSet<String>
where
    W: SyncWorker + ?Sized,
    F: Fn(&HierarchyPath) -> bool,
{
    let mut out = HashSet::new();
    let mut pending = vec![root.clone()];
    while let Some(path) = pending.pop() {
        if may_disappear(&path) {
            continue;
        }
        out.insert(pseudo_id(worker, root, &path));
        pending.extend(children(worker, &path));
    }
    out
}

/// Nodes under `root` whose recorded WBS ID is `id`
pub(crate) fn nodes_with_id<W: SyncWorker + ?Sized>(worker: &W, root: &HierarchyPath, id: &str) -> Vec<HierarchyPath> {
    let mut out = Vec::new();
    let mut pending = vec![root.clone()];
    while let Some(path) = pending.pop() {
        if wbs_id_at(worker, &path).as_deref() == Some(id) {
            out.push(path.clone());
        }
        pending.extend(children(worker, &path));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wbs_hierarchy::{DataStore, MemoryStore};
    use wbs_worker::SimulationWorker;

    fn p(s: &str) -> HierarchyPath {
        s.parse().unwrap()
    }

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        for (path, id) in [("/Proj", None), ("/Proj/A", Some("1")), ("/Proj/A/T1", Some("2")), ("/Proj/A/T2", Some("3"))] {
            store.insert_node(&p(path), Some("T")).unwrap();
            if let Some(id) = id {
                store.put_value(&p(path), WBS_ID, Some(Value::from(id)));
            }
        }
        store.insert_node(&p("/Proj/A/T2/Mine"), Some("T")).unwrap();
        store.put_value(&p("/Proj/A/T1"), ACTUAL_TIME, Some(Value::from(15.0)));
        store
    }

    #[test]
    fn history_blocks_deletion_up_the_tree() {
        let store = store();
        let worker = SimulationWorker::new(&store);
        let set = deletable_nodes(&worker, &p("/Proj"), |_| false);
        assert!(set.contains(&p("/Proj/A/T2")));
        assert!(set.contains(&p("/Proj/A/T2/Mine")));
        assert!(!set.contains(&p("/Proj/A/T1")));
        assert!(!set.contains(&p("/Proj/A")));
    }

    #[test]
    fn pseudo_ids_use_nearest_wbs_ancestor() {
        let store = store();
        let worker = SimulationWorker::new(&store);
        let root = p("/Proj");
        assert_eq!(pseudo_id(&worker, &root, &root), "root");
        assert_eq!(pseudo_id(&worker, &root, &p("/Proj/A/T2")), "3");
        assert_eq!(pseudo_id(&worker, &root, &p("/Proj/A/T2/Mine")), "3/Mine");

        let keep = keep_ids(&worker, &root, |path| path == &p("/Proj/A/T2"));
        assert!(keep.contains("2"));
        assert!(!keep.contains("3"));
        assert!(!keep.contains("3/Mine"));
    }

    #[test]
    fn finds_nodes_by_id_and_sums_time() {
        let store = store();
        let worker = SimulationWorker::new(&store);
        assert_eq!(nodes_with_id(&worker, &p("/Proj"), "2"), [p("/Proj/A/T1")]);
        assert!((total_actual_time(&worker, &p("/Proj")) - 15.0).abs() < f64::EPSILON);
    }
}
