//! Role-dependent pruning
//!
//! Decides which WBS nodes take part in a pass before any diffing happens.
//!
//! - nameless nodes never survive
//! - team and master instances drop every task
//! - individuals keep only branches that allocate time to their initials,
//!   plus the ancestors needed to reach them
//! - nodes the live hierarchy still needs (listed by pseudo ID) are
//!   *quasi-pruned*: kept for structure but excluded from data sync

use std::collections::HashSet;

use crate::document::WbsDocument;
use crate::node::NodeId;
use crate::role::Role;

/// Pseudo ID used for the project node's children
pub const ROOT_PSEUDO_ID: &str = "root";

/// Outcome for one node, ordered from weakest to strongest claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PruneVerdict {
    /// Discard the node and its subtree
    Prune,
    /// Keep the node for path continuity only
    QuasiPrune,
    /// Fully synchronize the node
    Keep,
}

/// Pruning inputs besides the document
#[derive(Debug, Clone, Copy)]
pub struct PruneOptions<'a> {
    /// Who is synchronizing
    pub role: &'a Role,
    /// Keep every non-task node for individuals
    pub full_copy: bool,
    /// Pseudo IDs of live nodes that must not disappear
    pub keep_ids: &'a HashSet<String>,
}

/// Per-node verdicts for one document
#[derive(Debug, Clone)]
pub struct PrunedView {
    verdicts: Vec<PruneVerdict>,
}

impl PrunedView {
    /// Run pruning over `doc`
    #[must_use]
    pub fn compute(doc: &WbsDocument, options: PruneOptions<'_>) -> Self {
        let mut verdicts = vec![PruneVerdict::Prune; doc.len()];
        let root = doc.root();
        for child in doc.children(root) {
            visit(doc, *child, ROOT_PSEUDO_ID, options, &mut verdicts);
        }
        verdicts[root.index()] = PruneVerdict::Keep;
        Self { verdicts }
    }

    /// Verdict for one node
    #[inline]
    #[must_use]
    pub fn verdict(&self, id: NodeId) -> PruneVerdict {
        self.verdicts[id.index()]
    }

    /// True unless the node was discarded
    #[inline]
    #[must_use]
    pub fn is_kept(&self, id: NodeId) -> bool {
        self.verdict(id) != PruneVerdict::Prune
    }

    /// True for structure-only nodes
    #[inline]
    #[must_use]
    pub fn is_quasi_pruned(&self, id: NodeId) -> bool {
        self.verdict(id) == PruneVerdict::QuasiPrune
    }

    /// Surviving children in document order
    #[must_use]
    pub fn kept_children(&self, doc: &WbsDocument, id: NodeId) -> Vec<NodeId> {
        doc.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_kept(*c))
            .collect()
    }
}

fn visit(
    doc: &WbsDocument,
    id: NodeId,
    parent_id: &str,
    options: PruneOptions<'_>,
    verdicts: &mut [PruneVerdict],
) -> PruneVerdict {
    let node = doc.node(id);
    if node.is_nameless() {
        return PruneVerdict::Prune;
    }

    let is_task = node.kind.is_task();
    let mut verdict = match options.role {
        Role::Team | Role::Master if is_task => return PruneVerdict::Prune,
        Role::Team | Role::Master => PruneVerdict::Keep,
        Role::Individual(initials) => {
            if node.time.mentions(initials) || (options.full_copy && !is_task) {
                PruneVerdict::Keep
            } else {
                PruneVerdict::Prune
            }
        }
    };

    if verdict < PruneVerdict::QuasiPrune {
        let pseudo = format!("{parent_id}/{}", node.name);
        if options.keep_ids.contains(&node.id) || options.keep_ids.contains(&pseudo) {
            verdict = PruneVerdict::QuasiPrune;
        }
    }

    for child in doc.children(id) {
        let child_verdict = visit(doc, *child, &node.id, options, verdicts);
        verdict = verdict.max(child_verdict);
    }

    verdicts[id.index()] = verdict;
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"<project>
  <component name="Alpha" id="1">
    <task name="Design" id="7" phaseName="Design" time=",alice=4.0,bob=1.0,"/>
    <task name="Code" id="8" phaseName="Code" time=",bob=3,"/>
  </component>
  <component name="Beta" id="2">
    <task name="Old" id="9" time=",bob=1,"/>
  </component>
  <component id="3"/>
</project>"#;

    fn names(doc: &WbsDocument, view: &PrunedView, id: NodeId) -> Vec<String> {
        view.kept_children(doc, id)
            .into_iter()
            .map(|c| doc.node(c).name.clone())
            .collect()
    }

    fn view(doc: &WbsDocument, role: &Role, full_copy: bool, keep: &[&str]) -> PrunedView {
        let keep_ids: HashSet<String> = keep.iter().map(|s| (*s).to_string()).collect();
        PrunedView::compute(
            doc,
            PruneOptions {
                role,
                full_copy,
                keep_ids: &keep_ids,
            },
        )
    }

    #[test]
    fn team_drops_tasks_and_nameless_nodes() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        let v = view(&doc, &Role::Team, false, &[]);
        assert_eq!(names(&doc, &v, doc.root()), vec!["Alpha", "Beta"]);
        let alpha = doc.children(doc.root())[0];
        assert!(names(&doc, &v, alpha).is_empty());
    }

    #[test]
    fn individual_keeps_only_own_branches() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        let v = view(&doc, &Role::individual("alice"), false, &[]);
        assert_eq!(names(&doc, &v, doc.root()), vec!["Alpha"]);
        let alpha = doc.children(doc.root())[0];
        assert_eq!(names(&doc, &v, alpha), vec!["Design"]);
        assert_eq!(v.verdict(alpha), PruneVerdict::Keep);
    }

    #[test]
    fn full_copy_keeps_components_not_tasks() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        let v = view(&doc, &Role::individual("alice"), true, &[]);
        assert_eq!(names(&doc, &v, doc.root()), vec!["Alpha", "Beta"]);
        let beta = doc.children(doc.root())[1];
        assert!(names(&doc, &v, beta).is_empty());
    }

    #[test]
    fn keep_ids_quasi_prune() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        let v = view(&doc, &Role::individual("alice"), false, &["9"]);
        let beta = doc.children(doc.root())[1];
        let old = doc.children(beta)[0];
        assert!(v.is_quasi_pruned(old));
        assert!(v.is_quasi_pruned(beta));
    }

    #[test]
    fn pseudo_ids_match_parent_and_name() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        let v = view(&doc, &Role::individual("alice"), false, &["2/Old"]);
        let beta = doc.children(doc.root())[1];
        assert!(v.is_quasi_pruned(doc.children(beta)[0]));
    }
}
