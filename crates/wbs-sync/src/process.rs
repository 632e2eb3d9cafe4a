//! Loading a process definition from the live store
//!
//! Phase templates come from the catalog (`<pid>/PHASE/...`); construction
//! phase lists come from list values stored under `/<pid>`.

use wbs_hierarchy::{DataStore, TemplateCatalog, Value};
use wbs_model::{HierarchyPath, ProcessDefinition};

use crate::error::SyncError;

const SIZE_METRICS: &str = "Custom_Size_Metric_List";
const DLD_PHASES: &str = "DLD_Phase_List";
const CODE_PHASES: &str = "CODE_Phase_List";
const ALL_SIZE_PHASES: &str = "All_Sizes_Development_Phase_List";

fn process_list<S: DataStore + ?Sized>(store: &S, process_id: &str, name: &str) -> Vec<String> {
    let path = HierarchyPath::root().child(process_id);
    match store.get_value(&path, name) {
        Some(Value::List(items)) => items,
        Some(Value::Text(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Build the [`ProcessDefinition`] for `process_id`
///
/// # Errors
/// Returns [`SyncError::UnknownProcess`] when the catalog defines no phases.
pub fn load_process_definition<S>(store: &S, process_id: &str) -> Result<ProcessDefinition, SyncError>
where
    S: DataStore + TemplateCatalog + ?Sized,
{
    let mut process = ProcessDefinition::new(process_id);
    let phases = store.templates_with_prefix(&format!("{process_id}/PHASE/"));
    if phases.is_empty() {
        return Err(SyncError::UnknownProcess(process_id.to_string()));
    }
    for (template_id, name) in phases {
        process = process.with_phase(name, template_id);
    }

    for metric in process_list(store, process_id, SIZE_METRICS) {
        let phases = process_list(store, process_id, &format!("{metric}_Development_Phase_List"));
        process = process.with_construction_phases(metric, phases);
    }
    let dld = process_list(store, process_id, DLD_PHASES);
    let code = process_list(store, process_id, CODE_PHASES);
    process = process
        .with_construction_phases("DLD Lines", dld.clone())
        .with_construction_phases("LOC", code.clone());

    let mut all = process_list(store, process_id, ALL_SIZE_PHASES);
    all.extend(dld);
    all.extend(code);
    all.push("psp".to_string());
    Ok(process.with_all_construction_phases(all))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wbs_hierarchy::MemoryStore;

    #[test]
    fn loads_phases_and_construction_lists() {
        let store = MemoryStore::new()
            .with_template("TSP/PHASE/Design", "Design")
            .with_template("TSP/PHASE/Code", "Code")
            .with_template("TSP/TeamRoot", "Team Project");
        let pid = HierarchyPath::root().child("TSP");
        store.put_value(&pid, SIZE_METRICS, Some(Value::List(vec!["Text Pages".into()])));
        store.put_value(&pid, "Text Pages_Development_Phase_List", Some(Value::from("Design")));
        store.put_value(&pid, CODE_PHASES, Some(Value::List(vec!["Code".into()])));

        let process = load_process_definition(&store, "TSP").unwrap();
        assert!(process.is_phase("Design"));
        assert_eq!(process.phase_id("Code"), Some("TSP/PHASE/Code"));
        assert_eq!(process.construction_phases("Text Pages").unwrap(), ["Design"]);
        assert_eq!(process.construction_phases("LOC").unwrap(), ["Code", "psp"]);
        assert!(process
            .all_construction_phases()
            .unwrap()
            .iter()
            .any(|p| p == "Code"));
    }

    #[test]
    fn missing_phases_is_an_error() {
        let store = MemoryStore::new();
        assert_eq!(
            load_process_definition(&store, "XYZ"),
            Err(SyncError::UnknownProcess("XYZ".into()))
        );
    }
}
