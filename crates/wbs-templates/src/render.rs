//! Template XML output
//!
//! Each workflow becomes two `<template>` elements: a legacy one whose leaf
//! steps carry a `<phase>` child, and a current one that records each step's
//! phase as an `extraData` value.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use wbs_model::{ContentHash, NodeKind, ProcessDefinition, Workflow, WorkflowDocument, WorkflowNode};
use wbs_worker::names::PSP_PHASES;

use crate::catalog::{GenericTemplates, TemplateAttributes, NODE_ATTRS, TEMPLATE_ATTRS};
use crate::error::TemplateError;

pub(crate) const DOC_ROOT: &str = "dashboard-process-template";
pub(crate) const SOURCE_HASH_ATTR: &str = "sourceHash";

const PSP_TEMPLATE_ID: &str = "PSP2.1";
const PSP_DATA_FILE: &str = "psp2.1/dataFile.txt";
const PSP_CONSTRAINTS: &str = "{Design Inspection(3){Code Inspection(-2)";

/// Everything a rendering pass needs besides the workflows
pub(crate) struct RenderContext<'a> {
    pub(crate) process: &'a ProcessDefinition,
    pub(crate) generic: &'a GenericTemplates,
    /// Final segment of the project path followed by `" - "`
    pub(crate) name_prefix: String,
    pub(crate) source_hash: ContentHash,
}

#[derive(Clone, Copy)]
enum Style {
    Legacy,
    Current,
}

/// Render the template catalog for `workflows`
pub(crate) fn render(workflows: &WorkflowDocument, ctx: &RenderContext<'_>) -> Result<Vec<u8>, TemplateError> {
    let mut out = Output {
        writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        ctx,
    };
    out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let hash = ctx.source_hash.to_string();
    let mut root = BytesStart::new(DOC_ROOT);
    root.push_attribute((SOURCE_HASH_ATTR, hash.as_str()));
    out.event(Event::Start(root))?;
    for workflow in workflows.workflows.iter().filter(|w| !w.steps.is_empty()) {
        out.template(workflow, Style::Legacy)?;
        out.template(workflow, Style::Current)?;
    }
    out.event(Event::End(BytesEnd::new(DOC_ROOT)))?;
    Ok(out.writer.into_inner())
}

struct Output<'a, 'c> {
    writer: Writer<Vec<u8>>,
    ctx: &'a RenderContext<'c>,
}

impl Output<'_, '_> {
    fn event(&mut self, event: Event<'_>) -> Result<(), TemplateError> {
        self.writer.write_event(event).map_err(TemplateError::xml)
    }

    fn generic(&self, style: Style) -> &TemplateAttributes {
        match style {
            Style::Legacy => &self.ctx.generic.legacy,
            Style::Current => &self.ctx.generic.current,
        }
    }

    fn deconflict(&self, name: &str, suffix: &str) -> String {
        if self.ctx.process.is_phase(name) {
            format!("{name}{suffix}")
        } else {
            name.to_string()
        }
    }

    fn template(&mut self, workflow: &Workflow, style: Style) -> Result<(), TemplateError> {
        let pid = self.ctx.process.process_id();
        let name = match style {
            Style::Legacy => format!(
                "{pid}-Common-Team-Workflow-Template:!*!:{}{}",
                self.ctx.name_prefix,
                self.deconflict(&workflow.name, "_")
            ),
            Style::Current => format!(
                "{pid}-Common-Team-Workflow-Template2:!*!:{}{}",
                self.ctx.name_prefix, workflow.name
            ),
        };
        let mut start = BytesStart::new("template");
        start.push_attribute(("name", name.as_str()));
        start.push_attribute(("defineRollup", "no"));
        start.push_attribute(("href", "none"));
        start.push_attribute(("autoData", "none"));
        start.extend_attributes(self.generic(style).select(&TEMPLATE_ATTRS));
        self.event(Event::Start(start))?;
        for step in &workflow.steps {
            self.node(step, style)?;
        }
        self.event(Event::End(BytesEnd::new("template")))
    }

    fn node(&mut self, node: &WorkflowNode, style: Style) -> Result<(), TemplateError> {
        let name = match style {
            Style::Legacy => self.deconflict(&node.name, " Task"),
            Style::Current => node.name.clone(),
        };
        let mut start = BytesStart::new("node");
        start.push_attribute(("name", name.as_str()));

        if node.kind == NodeKind::PspTask {
            start.push_attribute(("ID", PSP_TEMPLATE_ID));
            start.push_attribute(("defectLog", "true"));
            start.push_attribute(("autoData", "none"));
            start.push_attribute(("dataFile", PSP_DATA_FILE));
            start.push_attribute(("constraints", PSP_CONSTRAINTS));
            self.event(Event::Start(start))?;
            for phase in PSP_PHASES {
                self.empty("phase", &[("name", phase)])?;
            }
            return self.event(Event::End(BytesEnd::new("node")));
        }

        start.extend_attributes(self.generic(style).select(&NODE_ATTRS));
        self.event(Event::Start(start))?;
        match style {
            Style::Legacy if node.is_leaf() => {
                let phase = node.phase_name.as_deref();
                if let Some((phase, id)) = phase.and_then(|p| Some((p, self.ctx.process.phase_id(p)?))) {
                    self.empty("phase", &[("name", phase), ("ID", id)])?;
                }
            }
            Style::Legacy => {
                for child in &node.children {
                    self.node(child, style)?;
                }
            }
            Style::Current => {
                if let Some(phase) = node.phase_name.as_deref().or(node.effective_phase.as_deref()) {
                    // string data values are written with a single leading quote
                    let text = format!("{}=\"{phase}", self.ctx.process.effective_phase_data_name());
                    self.event(Event::Start(BytesStart::new("extraData")))?;
                    self.event(Event::Text(BytesText::new(&text)))?;
                    self.event(Event::End(BytesEnd::new("extraData")))?;
                }
                for child in &node.children {
                    self.node(child, style)?;
                }
            }
        }
        self.event(Event::End(BytesEnd::new("node")))
    }

    fn empty(&mut self, tag: &str, attrs: &[(&str, &str)]) -> Result<(), TemplateError> {
        let mut start = BytesStart::new(tag);
        start.extend_attributes(attrs.iter().copied());
        self.event(Event::Empty(start))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    const CATALOG: &str = r#"<dashboard-process-template>
  <template name="Task" ID="TSP/IndivEmptyNode" dataFile="tsp/empty.txt" defectLog="true"/>
  <template name="Task" ID="TSP/Indiv2Task" dataFile="tsp/task.txt"/>
</dashboard-process-template>"#;

    const WORKFLOWS: &str = r#"<workflows>
  <workflow name="Code" id="1">
    <task name="Build" id="2">
      <task name="Test" phaseName="Test" id="3"/>
      <task name="Write" phaseName="Code" id="4"/>
    </task>
    <psp name="Module" id="5"/>
  </workflow>
  <workflow name="Empty" id="6"/>
</workflows>"#;

    fn rendered() -> String {
        let process = ProcessDefinition::new("TSP")
            .with_phase("Code", "TSP/PHASE/Code")
            .with_phase("Test", "TSP/PHASE/Test");
        let generic = GenericTemplates::parse(CATALOG, Path::new("tsp.xml"), &process).unwrap();
        let ctx = RenderContext {
            process: &process,
            generic: &generic,
            name_prefix: "Widget - ".to_string(),
            source_hash: ContentHash::compute(WORKFLOWS.as_bytes()),
        };
        let workflows = WorkflowDocument::parse(WORKFLOWS).unwrap();
        String::from_utf8(render(&workflows, &ctx).unwrap()).unwrap()
    }

    #[test]
    fn two_templates_per_non_empty_workflow() {
        let xml = rendered();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let names: Vec<_> = doc
            .descendants()
            .filter(|n| n.has_tag_name("template"))
            .filter_map(|n| n.attribute("name"))
            .collect();
        assert_eq!(
            names,
            vec![
                "TSP-Common-Team-Workflow-Template:!*!:Widget - Code_",
                "TSP-Common-Team-Workflow-Template2:!*!:Widget - Code",
            ]
        );
        assert_eq!(
            doc.root_element().attribute(SOURCE_HASH_ATTR),
            Some(ContentHash::compute(WORKFLOWS.as_bytes()).to_string().as_str())
        );
    }

    #[test]
    fn legacy_leaves_get_phase_children() {
        let xml = rendered();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let legacy = doc.descendants().find(|n| n.has_tag_name("template")).unwrap();
        assert_eq!(legacy.attribute("ID"), Some("TSP/IndivEmptyNode"));
        let test = legacy
            .descendants()
            .find(|n| n.has_tag_name("node") && n.attribute("name") == Some("Test Task"))
            .unwrap();
        let phase = test.children().find(|n| n.has_tag_name("phase")).unwrap();
        assert_eq!(phase.attribute("ID"), Some("TSP/PHASE/Test"));
        assert_eq!(test.attribute("dataFile"), Some("tsp/empty.txt"));
    }

    #[test]
    fn current_nodes_record_effective_phase() {
        let xml = rendered();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let current = doc.descendants().filter(|n| n.has_tag_name("template")).nth(1).unwrap();
        let write = current
            .descendants()
            .find(|n| n.has_tag_name("node") && n.attribute("name") == Some("Write"))
            .unwrap();
        let extra = write.children().find(|n| n.has_tag_name("extraData")).unwrap();
        assert_eq!(extra.text(), Some("TSP /Effective_Phase=\"Code"));
        assert!(write.children().all(|n| !n.has_tag_name("phase")));
    }

    #[test]
    fn psp_steps_use_the_fixed_template() {
        let xml = rendered();
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let psp = doc
            .descendants()
            .find(|n| n.has_tag_name("node") && n.attribute("name") == Some("Module"))
            .unwrap();
        assert_eq!(psp.attribute("ID"), Some("PSP2.1"));
        let phases: Vec<_> = psp.children().filter_map(|n| n.attribute("name")).collect();
        assert_eq!(phases, PSP_PHASES.to_vec());
    }
}
