//! Template regeneration against real files

use std::fs::File;
use std::path::Path;
use std::time::{Duration, SystemTime};

use pretty_assertions::assert_eq;
use wbs_templates::{TemplateError, TemplateSynchronizer, TEMPLATES_UPDATED};
use wbs_test_utils::{path, sample_process, temp_dir, write_file};

const CATALOG: &str = r#"<dashboard-process-template>
  <template name="Task" ID="TSP/IndivEmptyNode" dataFile="tsp/empty.txt" defectLog="true"/>
  <template name="Task" ID="TSP/Indiv2Task" dataFile="tsp/task.txt"/>
</dashboard-process-template>"#;

const WORKFLOWS: &str = r#"<workflows>
  <workflow name="Review" id="1">
    <task name="Prepare" phaseName="Planning" id="2"/>
    <task name="Inspect" phaseName="Code Inspection" id="3"/>
  </workflow>
</workflows>"#;

fn synchronizer(dir: &Path) -> TemplateSynchronizer {
    TemplateSynchronizer::new(
        path("/Projects/Widget"),
        sample_process(),
        "w1",
        dir.join("workflowDump.xml"),
        dir.join("tsp-template.xml"),
        dir.join("templates"),
    )
}

#[tokio::test]
async fn what_if_reports_without_writing() {
    let dir = temp_dir();
    write_file(dir.path(), "workflowDump.xml", WORKFLOWS);
    write_file(dir.path(), "tsp-template.xml", CATALOG);

    let sync = synchronizer(dir.path());
    assert_eq!(sync.sync().await.unwrap(), vec![TEMPLATES_UPDATED.to_string()]);
    assert!(!sync.dest_file().exists());
}

#[tokio::test]
async fn live_run_writes_once() {
    let dir = temp_dir();
    write_file(dir.path(), "workflowDump.xml", WORKFLOWS);
    write_file(dir.path(), "tsp-template.xml", CATALOG);

    let sync = synchronizer(dir.path()).with_what_if(false);
    assert_eq!(sync.sync().await.unwrap().len(), 1);
    let written = std::fs::read_to_string(sync.dest_file()).unwrap();
    assert!(written.contains("TSP-Common-Team-Workflow-Template2:!*!:Widget - Review"));
    assert!(!dir.path().join("templates/Workflows-w1-template.xml.tmp").exists());

    assert!(sync.sync().await.unwrap().is_empty());
}

#[tokio::test]
async fn changed_workflows_are_regenerated() {
    let dir = temp_dir();
    write_file(dir.path(), "workflowDump.xml", WORKFLOWS);
    write_file(dir.path(), "tsp-template.xml", CATALOG);
    let sync = synchronizer(dir.path()).with_what_if(false);
    sync.sync().await.unwrap();

    write_file(dir.path(), "workflowDump.xml", &WORKFLOWS.replace("Review", "Walkthrough"));
    assert_eq!(sync.sync().await.unwrap().len(), 1);
    let written = std::fs::read_to_string(sync.dest_file()).unwrap();
    assert!(written.contains("Widget - Walkthrough"));
}

#[tokio::test]
async fn newer_process_template_triggers_regeneration() {
    let dir = temp_dir();
    write_file(dir.path(), "workflowDump.xml", WORKFLOWS);
    let catalog = write_file(dir.path(), "tsp-template.xml", CATALOG);
    let sync = synchronizer(dir.path()).with_what_if(false);
    sync.sync().await.unwrap();

    File::options()
        .write(true)
        .open(&catalog)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(3600))
        .unwrap();
    assert_eq!(sync.sync().await.unwrap().len(), 1);
}

#[tokio::test]
async fn process_without_generic_templates_fails() {
    let dir = temp_dir();
    write_file(dir.path(), "workflowDump.xml", WORKFLOWS);
    write_file(dir.path(), "tsp-template.xml", "<dashboard-process-template/>");

    let err = synchronizer(dir.path()).with_what_if(false).sync().await.unwrap_err();
    assert!(matches!(err, TemplateError::MissingGenericTemplate(id) if id == "TSP/IndivEmptyNode"));
}
