//! Parsed WBS dump
//!
//! [`WbsDocument`] is built once per pass from the dump XML and never
//! mutated afterwards. Parsing applies the clean-ups every consumer relies on:
//!
//! - node names are scrubbed of typographic punctuation and slashes
//! - duplicate sibling names get a ` (duplicate N)` suffix
//! - the project task-ID list is normalised to `:root` node numbers

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ModelError;
use crate::node::{Dependency, NodeId, NodeKind, SizeData, TeamMember, TimeAllocation, WbsNode};

static NODE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":\d+").expect("NODE_NUMBER regex should compile"));

/// Immutable WBS tree plus project-level metadata
#[derive(Debug, Clone)]
pub struct WbsDocument {
    nodes: Vec<WbsNode>,
    version: String,
    timestamp: Option<DateTime<Utc>>,
    team_members: Vec<TeamMember>,
}

impl WbsDocument {
    /// Parse a `projDump.xml` document
    ///
    /// # Errors
    /// Returns [`ModelError`] when the text is not XML or the document
    /// element is not `<project>`.
    pub fn parse(xml: &str) -> Result<Self, ModelError> {
        let doc = roxmltree::Document::parse(xml)?;
        let root = doc.root_element();
        if root.tag_name().name() != "project" {
            return Err(ModelError::UnexpectedRoot {
                expected: "project",
                found: root.tag_name().name().to_string(),
            });
        }

        let mut nodes = Vec::new();
        build_node(&mut nodes, root, NodeKind::Project, None);
        if let Some(project) = nodes.first_mut() {
            project.task_ids = project
                .task_ids
                .as_deref()
                .map(|tids| NODE_NUMBER.replace_all(tids, ":root").into_owned());
            if project.id.is_empty() {
                project.id = "root".to_string();
            }
        }

        let team_members = root
            .children()
            .filter(|n| n.has_tag_name("teamMember"))
            .map(parse_team_member)
            .collect();

        Ok(Self {
            nodes,
            version: root.attribute("dumpFileVersion").unwrap_or("0").to_string(),
            timestamp: root.attribute("dumpTimestamp").and_then(parse_timestamp),
            team_members,
        })
    }

    /// The `<project>` node
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Borrow a node
    #[inline]
    #[must_use]
    pub fn node(&self, id: NodeId) -> &WbsNode {
        &self.nodes[id.0]
    }

    /// Children in document order
    #[inline]
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Parent node (none for the project)
    #[inline]
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// All nodes in document order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &WbsNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Number of nodes including the project
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a parsed document has at least its project node
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `dumpFileVersion` of the file
    #[inline]
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// True when the dump was written by at least `required`
    #[must_use]
    pub fn version_at_least(&self, required: &str) -> bool {
        compare_versions(&self.version, required) != Ordering::Less
    }

    /// When the dump was written
    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Team roster
    #[inline]
    #[must_use]
    pub fn team_members(&self) -> &[TeamMember] {
        &self.team_members
    }

    /// Roster entry for `initials` (case-insensitive)
    #[must_use]
    pub fn team_member(&self, initials: &str) -> Option<&TeamMember> {
        self.team_members
            .iter()
            .find(|m| m.initials.eq_ignore_ascii_case(initials))
    }

    /// Every WBS unique ID present in the document
    #[must_use]
    pub fn ids(&self) -> HashSet<&str> {
        self.nodes
            .iter()
            .filter(|n| !n.id.is_empty())
            .map(|n| n.id.as_str())
            .collect()
    }
}

fn build_node(
    nodes: &mut Vec<WbsNode>,
    element: roxmltree::Node<'_, '_>,
    kind: NodeKind,
    parent: Option<NodeId>,
) -> NodeId {
    let id = NodeId(nodes.len());
    let mut node = WbsNode::new(
        kind,
        element.attribute("name").map(scrub_name).unwrap_or_default(),
        element.attribute("id").unwrap_or_default().to_string(),
    );
    node.parent = parent;
    node.task_ids = non_empty(element.attribute("tid"));
    node.phase_name = non_empty(element.attribute("phaseName"));
    node.effective_phase = non_empty(element.attribute("effectivePhase"));
    node.sync_phase_name = non_empty(element.attribute("syncPhaseName"));
    node.time = element.attribute("time").map(TimeAllocation::parse).unwrap_or_default();
    node.sync_time = element
        .attribute("syncTime")
        .map(TimeAllocation::parse)
        .unwrap_or_default();
    node.size = SizeData {
        units: non_empty(element.attribute("sizeUnits")),
        new_changed: number(element.attribute("sizeNC")),
        base: number(element.attribute("sizeBase")),
        deleted: number(element.attribute("sizeDel")),
        modified: number(element.attribute("sizeMod")),
        added: number(element.attribute("sizeAdd")),
        reused: number(element.attribute("sizeReu")),
        inspected: number(element.attribute("inspSize")),
        inspected_units: non_empty(element.attribute("inspUnits")),
    };
    node.labels = element
        .attribute("labels")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    node.dependencies = element
        .children()
        .filter(|c| c.has_tag_name("dependency"))
        .filter_map(|c| {
            c.attribute("id").map(|dep_id| Dependency {
                id: dep_id.to_string(),
                name: c.attribute("name").map(String::from),
            })
        })
        .collect();
    nodes.push(node);

    let mut children = Vec::new();
    for child in element.children().filter(roxmltree::Node::is_element) {
        let Some(child_kind) = NodeKind::from_tag(child.tag_name().name()) else {
            continue;
        };
        if child_kind == NodeKind::Project {
            continue;
        }
        children.push(build_node(nodes, child, child_kind, Some(id)));
    }
    rename_duplicate_children(nodes, &children);
    nodes[id.0].children = children;
    id
}

fn rename_duplicate_children(nodes: &mut [WbsNode], children: &[NodeId]) {
    let mut seen: HashSet<String> = HashSet::new();
    for child in children {
        let name = nodes[child.0].name.clone();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.clone()) {
            continue;
        }
        let mut n = 2;
        let renamed = loop {
            let candidate = format!("{name} (duplicate {n})");
            if !seen.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };
        seen.insert(renamed.clone());
        nodes[child.0].name = renamed;
    }
}

fn parse_team_member(element: roxmltree::Node<'_, '_>) -> TeamMember {
    let exceptions: BTreeMap<i32, f64> = element
        .children()
        .filter(|c| c.has_tag_name("scheduleException"))
        .filter_map(|c| {
            let week = c.attribute("week")?.trim().parse().ok()?;
            let hours = number(c.attribute("hours"))?;
            Some((week, hours))
        })
        .collect();
    TeamMember {
        initials: element.attribute("initials").unwrap_or_default().to_string(),
        name: element.attribute("name").unwrap_or_default().to_string(),
        hours_per_week: number(element.attribute("hoursPerWeek")),
        start_date: non_empty(element.attribute("startDate")),
        end_week: element.attribute("endWeek").and_then(|w| w.trim().parse().ok()),
        exceptions,
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

fn number(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.trim().parse::<f64>().ok()).filter(|v| v.is_finite())
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Some(millis) = raw.strip_prefix('@') {
        return millis.parse().ok().and_then(DateTime::from_timestamp_millis);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Normalise a node name so it is safe as a hierarchy path segment
///
/// Curly quotes become straight quotes, long dashes become hyphens, unusual
/// spaces become plain spaces and `/` becomes `,`.
#[must_use]
pub fn scrub_name(name: &str) -> String {
    let scrubbed: String = name
        .chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            '\u{2013}' | '\u{2014}' => '-',
            '\u{00A0}' | '\u{2002}' | '\u{2003}' => ' ',
            '/' => ',',
            other => other,
        })
        .collect();
    scrubbed.trim().to_string()
}

/// Compare dotted version strings numerically (`3.10.0` > `3.9`)
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    fn parts(v: &str) -> Vec<u64> {
        v.split('.')
            .map(|p| {
                let digits: String = p.chars().take_while(char::is_ascii_digit).collect();
                digits.parse().unwrap_or(0)
            })
            .collect()
    }
    let (pa, pb) = (parts(a), parts(b));
    let len = pa.len().max(pb.len());
    for i in 0..len {
        let ord = pa.get(i).copied().unwrap_or(0).cmp(&pb.get(i).copied().unwrap_or(0));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DUMP: &str = r#"<?xml version="1.0"?>
<project tid="proj:12,proj:3" dumpFileVersion="3.2.0" dumpTimestamp="@1700000000000">
  <teamMember initials="alice" name="Alice Smith" hoursPerWeek="20">
    <scheduleException week="3" hours="0"/>
  </teamMember>
  <component name="Widget" id="1" labels="ui, core">
    <task name="Design" id="7" phaseName="Design" time=",alice=4.0,bob=1.0,">
      <dependency id="proj:9" name="Spec"/>
    </task>
    <task name="Design" id="8" phaseName="Design" time=",bob=2,"/>
  </component>
  <document name="Manual &#x2013; Draft/1" id="2" sizeUnits="Text Pages" sizeNC="12"/>
  <component id="3"/>
</project>"#;

    #[test]
    fn parses_tree_in_document_order() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        let root = doc.root();
        assert_eq!(doc.node(root).kind, NodeKind::Project);
        let names: Vec<_> = doc.children(root).iter().map(|c| doc.node(*c).name.clone()).collect();
        assert_eq!(names, vec!["Widget", "Manual - Draft,1", ""]);
        assert_eq!(doc.len(), 6);
    }

    #[test]
    fn normalises_project_task_ids() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        assert_eq!(doc.node(doc.root()).task_ids.as_deref(), Some("proj:root,proj:root"));
        assert_eq!(doc.node(doc.root()).id, "root");
    }

    #[test]
    fn renames_duplicate_siblings() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        let widget = doc.children(doc.root())[0];
        let names: Vec<_> = doc.children(widget).iter().map(|c| doc.node(*c).name.clone()).collect();
        assert_eq!(names, vec!["Design", "Design (duplicate 2)"]);
    }

    #[test]
    fn reads_node_attributes() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        let widget = doc.children(doc.root())[0];
        let design = doc.node(doc.children(widget)[0]);
        assert_eq!(design.time.hours_for("alice"), Some(4.0));
        assert_eq!(design.dependencies.len(), 1);
        assert_eq!(doc.node(widget).labels, vec!["ui", "core"]);
        let manual = doc.node(doc.children(doc.root())[1]);
        assert_eq!(manual.size.new_changed, Some(12.0));
        assert_eq!(manual.size.units.as_deref(), Some("Text Pages"));
    }

    #[test]
    fn reads_metadata_and_roster() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        assert!(doc.version_at_least("3.1.0"));
        assert!(!doc.version_at_least("3.10"));
        assert!(doc.timestamp().is_some());
        let alice = doc.team_member("ALICE").unwrap();
        assert_eq!(alice.hours_per_week, Some(20.0));
        assert_eq!(alice.exceptions.get(&3), Some(&0.0));
    }

    #[test]
    fn rejects_wrong_document_element() {
        let err = WbsDocument::parse("<workflows/>").unwrap_err();
        assert!(matches!(err, ModelError::UnexpectedRoot { .. }));
    }

    #[test]
    fn rejects_malformed_xml() {
        assert!(matches!(WbsDocument::parse("<project>"), Err(ModelError::Xml(_))));
    }

    #[test]
    fn scrub_replaces_typographic_characters() {
        assert_eq!(scrub_name("  \u{201C}A\u{201D}\u{2014}b/c\u{00A0} "), "\"A\"-b,c");
    }

    #[test]
    fn version_ordering_is_numeric() {
        assert_eq!(compare_versions("3.10.0", "3.9"), Ordering::Greater);
        assert_eq!(compare_versions("3.1", "3.1.0"), Ordering::Equal);
        assert_eq!(compare_versions("0", "1.0"), Ordering::Less);
    }
}
