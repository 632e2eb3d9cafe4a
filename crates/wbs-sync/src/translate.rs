//! Template-ID translation for one-time project migrations

use tracing::{debug, info};
use wbs_hierarchy::HierarchyError;
use wbs_model::HierarchyPath;
use wbs_worker::SyncWorker;

/// How to rewrite template IDs across a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateTranslation {
    /// Legacy individual templates to their current equivalents
    MigrateLegacy { process_id: String },
    /// Same templates under a different process
    ConvertProcess { from: String, to: String },
}

impl TemplateTranslation {
    /// New template ID for `template_id`, or `None` when it stays as is
    #[must_use]
    pub fn translate(&self, template_id: &str) -> Option<String> {
        match self {
            Self::MigrateLegacy { process_id } => {
                let suffix = template_id.strip_prefix(process_id.as_str())?.strip_prefix('/')?;
                let target = if suffix == "IndivRoot" {
                    "Indiv2Root"
                } else if suffix == "IndivReadOnlyNode" {
                    "Indiv2ReadOnlyNode"
                } else if suffix == "IndivFullNode"
                    || suffix == "IndivEmptyNode"
                    || suffix.starts_with("IndivTask/")
                {
                    "Indiv2Task"
                } else {
                    return None;
                };
                Some(format!("{process_id}/{target}"))
            }
            Self::ConvertProcess { from, to } => {
                let suffix = template_id.strip_prefix(from.as_str())?;
                suffix.starts_with('/').then(|| format!("{to}{suffix}"))
            }
        }
    }
}

/// Rewrite template IDs under `root` (inclusive); returns how many changed
///
/// # Errors
/// Returns the hierarchy's refusal for the first node it cannot update.
pub fn apply_template_translation<W: SyncWorker + ?Sized>(
    worker: &mut W,
    root: &HierarchyPath,
    translation: &TemplateTranslation,
) -> Result<usize, HierarchyError> {
    let mut pending = vec![root.clone()];
    let mut changed = 0;
    while let Some(path) = pending.pop() {
        let Some(node) = worker.node(&path) else {
            continue;
        };
        if let Some(new_id) = node.template_id.as_deref().and_then(|t| translation.translate(t)) {
            debug!(%path, template = %new_id, "translating template");
            worker.set_template_id(&path, &new_id)?;
            changed += 1;
        }
        pending.extend(node.children.iter().map(|c| path.child(c.as_str())));
    }
    info!(%root, changed, "template translation complete");
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wbs_hierarchy::{HierarchyStore, MemoryStore};
    use wbs_worker::{LiveWorker, Permissions};

    #[test]
    fn legacy_ids_map_to_current() {
        let t = TemplateTranslation::MigrateLegacy {
            process_id: "TSP".into(),
        };
        assert_eq!(t.translate("TSP/IndivRoot").as_deref(), Some("TSP/Indiv2Root"));
        assert_eq!(t.translate("TSP/IndivEmptyNode").as_deref(), Some("TSP/Indiv2Task"));
        assert_eq!(t.translate("TSP/IndivTask/Code").as_deref(), Some("TSP/Indiv2Task"));
        assert_eq!(t.translate("TSP/PHASE/Code"), None);
        assert_eq!(t.translate("TSPX/IndivRoot"), None);
        assert_eq!(t.translate("PSP2.1"), None);
    }

    #[test]
    fn conversion_swaps_the_prefix() {
        let t = TemplateTranslation::ConvertProcess {
            from: "TSP".into(),
            to: "AGILE".into(),
        };
        assert_eq!(t.translate("TSP/TeamNode").as_deref(), Some("AGILE/TeamNode"));
        assert_eq!(t.translate("TSPX/TeamNode"), None);
    }

    #[test]
    fn applies_across_the_subtree() {
        let store = MemoryStore::new();
        let root: HierarchyPath = "/Proj".parse().unwrap();
        store.insert_node(&root, Some("TSP/IndivRoot")).unwrap();
        store.insert_node(&root.child("A"), Some("TSP/IndivReadOnlyNode")).unwrap();
        store.insert_node(&root.child("A").child("T"), Some("TSP/IndivEmptyNode")).unwrap();
        store.insert_node(&root.child("A").child("T").child("Code"), Some("TSP/PHASE/Code")).unwrap();

        let mut worker = LiveWorker::new(&store, Permissions::all(), Permissions::all());
        let t = TemplateTranslation::MigrateLegacy {
            process_id: "TSP".into(),
        };
        assert_eq!(apply_template_translation(&mut worker, &root, &t).unwrap(), 3);
        assert_eq!(
            store.node(&root.child("A").child("T")).unwrap().template_id.as_deref(),
            Some("TSP/Indiv2Task")
        );
    }
}
