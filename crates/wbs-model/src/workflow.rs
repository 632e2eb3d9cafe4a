//! Common team workflows
//!
//! `workflowDump.xml` lists reusable task trees. Each `<workflow>` uses the
//! same element vocabulary as the WBS dump.

use crate::document::scrub_name;
use crate::error::ModelError;
use crate::node::NodeKind;

/// One node of a workflow tree
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowNode {
    pub kind: NodeKind,
    pub name: String,
    pub id: String,
    pub phase_name: Option<String>,
    pub effective_phase: Option<String>,
    pub children: Vec<WorkflowNode>,
}

impl WorkflowNode {
    /// True when the node has no children
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A named workflow
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
    pub name: String,
    pub id: String,
    pub steps: Vec<WorkflowNode>,
}

/// All workflows of a project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowDocument {
    pub workflows: Vec<Workflow>,
}

impl WorkflowDocument {
    /// Parse a workflow dump
    ///
    /// # Errors
    /// Returns [`ModelError::Xml`] for malformed input.
    pub fn parse(xml: &str) -> Result<Self, ModelError> {
        let doc = roxmltree::Document::parse(xml)?;
        let workflows = doc
            .root_element()
            .descendants()
            .filter(|n| n.has_tag_name("workflow"))
            .filter_map(|w| {
                let name = scrub_name(w.attribute("name")?);
                if name.is_empty() {
                    return None;
                }
                Some(Workflow {
                    name,
                    id: w.attribute("id").unwrap_or_default().to_string(),
                    steps: parse_children(w),
                })
            })
            .collect();
        Ok(Self { workflows })
    }
}

fn parse_children(element: roxmltree::Node<'_, '_>) -> Vec<WorkflowNode> {
    element
        .children()
        .filter(roxmltree::Node::is_element)
        .filter_map(|child| {
            let kind = NodeKind::from_tag(child.tag_name().name())?;
            let name = scrub_name(child.attribute("name")?);
            if name.is_empty() || kind == NodeKind::Project {
                return None;
            }
            let attr = |name: &str| {
                child
                    .attribute(name)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(String::from)
            };
            Some(WorkflowNode {
                kind,
                name,
                id: child.attribute("id").unwrap_or_default().to_string(),
                phase_name: attr("phaseName"),
                effective_phase: attr("effectivePhase"),
                children: parse_children(child),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_workflows_and_steps() {
        let xml = r#"<workflows>
  <workflow name="Inspection" id="w1">
    <task name="Prepare" phaseName="Planning"/>
    <task name="Meet">
      <task name="Log" phaseName="Code Inspection"/>
    </task>
    <task phaseName="Test"/>
  </workflow>
  <workflow id="w2"/>
</workflows>"#;
        let doc = WorkflowDocument::parse(xml).unwrap();
        assert_eq!(doc.workflows.len(), 1);
        let flow = &doc.workflows[0];
        assert_eq!(flow.steps.len(), 2);
        assert!(flow.steps[0].is_leaf());
        assert_eq!(flow.steps[1].children[0].phase_name.as_deref(), Some("Code Inspection"));
    }
}
