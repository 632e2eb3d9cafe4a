//! Testing utilities for the WBS sync workspace
//!
//! Shared fixtures: a small "TSP" process, in-memory project stores for each
//! role and WBS dump helpers.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use wbs_hierarchy::{DataStore, MemoryStore, Value};
use wbs_model::{HierarchyPath, ProcessDefinition, WbsDocument};

pub const PROCESS_ID: &str = "TSP";

pub const PHASES: [&str; 5] = ["Planning", "Reqts", "Code", "Code Inspection", "Test"];

pub const TEAM_ROOT: &str = "TSP/TeamRoot";
pub const MASTER_ROOT: &str = "TSP/MasterRoot";
pub const LEGACY_ROOT: &str = "TSP/IndivRoot";
pub const CURRENT_ROOT: &str = "TSP/Indiv2Root";

pub fn path(s: &str) -> HierarchyPath {
    s.parse().unwrap()
}

/// The process [`process_store`] describes, built directly
pub fn sample_process() -> ProcessDefinition {
    let mut process = ProcessDefinition::new(PROCESS_ID);
    for phase in PHASES {
        process = process.with_phase(phase, format!("{PROCESS_ID}/PHASE/{phase}"));
    }
    process
        .with_construction_phases("Text Pages", ["Reqts"])
        .with_construction_phases("LOC", ["Code", "Code Inspection"])
        .with_all_construction_phases(["Reqts", "Code", "Code Inspection", "psp"])
}

/// Store holding the process templates and phase lists, with no project
pub fn process_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    for phase in PHASES {
        store = store.with_template(format!("{PROCESS_ID}/PHASE/{phase}"), phase);
    }
    for (suffix, name) in [
        ("TeamRoot", "Team Project"),
        ("MasterRoot", "Master Project"),
        ("IndivRoot", "Personal Project"),
        ("Indiv2Root", "Personal Project"),
        ("TeamNode", "Component"),
        ("IndivReadOnlyNode", "Component"),
        ("IndivEmptyNode", "Task"),
        ("Indiv2ReadOnlyNode", "Component"),
        ("Indiv2Task", "Task"),
    ] {
        store = store.with_template(format!("{PROCESS_ID}/{suffix}"), name);
    }
    store = store.with_template("PSP2.1", "PSP2.1 Task");

    let pid = HierarchyPath::root().child(PROCESS_ID);
    let list = |items: &[&str]| Some(Value::List(items.iter().map(|s| (*s).to_string()).collect()));
    store.put_value(&pid, "Custom_Size_Metric_List", list(&["Text Pages"]));
    store.put_value(&pid, "Text Pages_Development_Phase_List", list(&["Reqts"]));
    store.put_value(&pid, "CODE_Phase_List", list(&["Code", "Code Inspection"]));
    store.put_value(&pid, "All_Sizes_Development_Phase_List", list(&["Reqts"]));
    store
}

/// Process store with an empty project root at `project`
pub fn project_store(project: &HierarchyPath, root_template: &str) -> MemoryStore {
    let store = process_store();
    store.insert_node(project, Some(root_template)).unwrap();
    store
}

pub fn team_store(project: &HierarchyPath) -> MemoryStore {
    project_store(project, TEAM_ROOT)
}

/// Individual project using the current task layout
pub fn individual_store(project: &HierarchyPath) -> MemoryStore {
    project_store(project, CURRENT_ROOT)
}

/// Individual project using the legacy task layout
pub fn legacy_individual_store(project: &HierarchyPath) -> MemoryStore {
    project_store(project, LEGACY_ROOT)
}

/// Wrap node elements in a `<project>` element
pub fn wbs_xml(body: &str) -> String {
    format!(r#"<project tid="t:1" dumpFileVersion="3.1.0">{body}</project>"#)
}

pub fn parse_wbs(body: &str) -> WbsDocument {
    WbsDocument::parse(&wbs_xml(body)).unwrap()
}

pub fn temp_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
