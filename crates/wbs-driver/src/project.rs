//! Project discovery and per-project configuration
//!
//! A project root is the nearest ancestor whose template ends in one of the
//! root markers. Everything else the driver needs is read from data values
//! stored on that root.

use std::path::PathBuf;

use tracing::debug;
use wbs_hierarchy::{is_false, DataStore, HierarchyStore, Value};
use wbs_model::{HierarchyPath, Role};
use wbs_sync::names::{INDIV2_ROOT, INDIV_ROOT, MASTER_ROOT, TEAM_ROOT};
use wbs_sync::TemplateTranslation;

use crate::error::DriverError;

pub const TEAM_DATA_DIRECTORY: &str = "Team_Data_Directory";
pub const PROJECT_ID: &str = "Project_ID";
pub const INDIV_INITIALS: &str = "Indiv_Initials";
pub const SYNC_FULL_WBS: &str = "Sync_Full_WBS";
pub const MIGRATION_NEEDED: &str = "Team_Project_Migration_Needed";
/// Text value naming the process the project is being converted from
pub const CONVERSION_NEEDED: &str = "Team_Project_Conversion_Needed";

/// Values left in place by project setup until the user fills them in
const PLACEHOLDERS: [&str; 2] = ["tttt", "Enter network directory path"];

/// Kind of project root, from its template suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootKind {
    Master,
    Team,
    /// Individual project with phase child nodes
    Individual,
    /// Individual project recording effective phases
    IndividualCurrent,
}

impl RootKind {
    /// Split a root template ID into process ID and kind
    #[must_use]
    pub fn from_template(template_id: &str) -> Option<(&str, Self)> {
        let (process_id, suffix) = template_id.rsplit_once('/')?;
        let kind = match suffix {
            MASTER_ROOT => Self::Master,
            TEAM_ROOT => Self::Team,
            INDIV_ROOT => Self::Individual,
            INDIV2_ROOT => Self::IndividualCurrent,
            _ => return None,
        };
        Some((process_id, kind))
    }

    #[inline]
    #[must_use]
    pub fn is_team_side(self) -> bool {
        matches!(self, Self::Master | Self::Team)
    }
}

/// A located project root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    pub path: HierarchyPath,
    pub process_id: String,
    pub kind: RootKind,
}

/// Walk from `start` up to the nearest project root
///
/// # Errors
/// Returns [`DriverError::NotATeamProject`] when no ancestor is a root.
pub fn locate_project<S: HierarchyStore + ?Sized>(
    store: &S,
    start: &HierarchyPath,
) -> Result<ProjectRoot, DriverError> {
    for path in start.self_and_ancestors() {
        let Some(template_id) = store.node(&path).and_then(|n| n.template_id) else {
            continue;
        };
        if let Some((process_id, kind)) = RootKind::from_template(&template_id) {
            debug!(%start, root = %path, ?kind, "located project root");
            return Ok(ProjectRoot {
                process_id: process_id.to_string(),
                path,
                kind,
            });
        }
    }
    Err(DriverError::NotATeamProject(start.clone()))
}

/// Configuration of one project, validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub root: ProjectRoot,
    pub role: Role,
    /// Shared directory holding the WBS and workflow dumps
    pub team_dir: PathBuf,
    pub project_id: Option<String>,
    pub full_copy: bool,
}

impl ProjectConfig {
    /// Read and validate the configuration values stored on `root`
    ///
    /// # Errors
    /// Returns [`DriverError::MissingConfiguration`] naming the first absent
    /// value: the team data directory, then (for individuals) the initials.
    pub fn load<S: DataStore + ?Sized>(store: &S, root: ProjectRoot) -> Result<Self, DriverError> {
        let team_dir = text_value(store, &root.path, TEAM_DATA_DIRECTORY)
            .ok_or_else(|| DriverError::missing(&root.path, TEAM_DATA_DIRECTORY))?;
        let role = match root.kind {
            RootKind::Team => Role::Team,
            RootKind::Master => Role::Master,
            RootKind::Individual | RootKind::IndividualCurrent => {
                let initials = text_value(store, &root.path, INDIV_INITIALS)
                    .ok_or_else(|| DriverError::missing(&root.path, INDIV_INITIALS))?;
                Role::individual(initials)
            }
        };
        Ok(Self {
            project_id: text_value(store, &root.path, PROJECT_ID),
            full_copy: !is_false(store.get_value(&root.path, SYNC_FULL_WBS).as_ref()),
            team_dir: PathBuf::from(team_dir),
            role,
            root,
        })
    }

    /// Pending one-time template translation, if a migration flag is set
    #[must_use]
    pub fn pending_migration<S: DataStore + ?Sized>(&self, store: &S) -> Option<TemplateTranslation> {
        let path = &self.root.path;
        if let Some(from) = text_value(store, path, CONVERSION_NEEDED) {
            return Some(TemplateTranslation::ConvertProcess {
                from,
                to: self.root.process_id.clone(),
            });
        }
        if !is_false(store.get_value(path, MIGRATION_NEEDED).as_ref()) {
            return Some(TemplateTranslation::MigrateLegacy {
                process_id: self.root.process_id.clone(),
            });
        }
        None
    }
}

/// Non-empty, non-placeholder text value
fn text_value<S: DataStore + ?Sized>(store: &S, path: &HierarchyPath, name: &str) -> Option<String> {
    match store.get_value(path, name)? {
        Value::Text(text) => {
            let text = text.trim();
            (!text.is_empty() && !PLACEHOLDERS.contains(&text)).then(|| text.to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wbs_hierarchy::MemoryStore;

    fn p(s: &str) -> HierarchyPath {
        s.parse().unwrap()
    }

    #[test]
    fn root_kinds_from_template_suffix() {
        assert_eq!(RootKind::from_template("TSP/TeamRoot"), Some(("TSP", RootKind::Team)));
        assert_eq!(
            RootKind::from_template("My Process/Indiv2Root"),
            Some(("My Process", RootKind::IndividualCurrent))
        );
        assert_eq!(RootKind::from_template("TSP/TeamNode"), None);
        assert_eq!(RootKind::from_template("TeamRoot"), None);
    }

    #[test]
    fn locates_nearest_root() {
        let store = MemoryStore::new();
        store.insert_node(&p("/Work/Proj"), Some("TSP/IndivRoot")).unwrap();
        store.insert_node(&p("/Work/Proj/A/B"), Some("TSP/IndivEmptyNode")).unwrap();

        let root = locate_project(&store, &p("/Work/Proj/A/B")).unwrap();
        assert_eq!(root.path, p("/Work/Proj"));
        assert_eq!(root.kind, RootKind::Individual);
        assert!(matches!(
            locate_project(&store, &p("/Work")),
            Err(DriverError::NotATeamProject(_))
        ));
    }

    #[test]
    fn placeholders_count_as_missing() {
        let store = MemoryStore::new();
        let root = ProjectRoot {
            path: p("/Proj"),
            process_id: "TSP".into(),
            kind: RootKind::Individual,
        };
        store.put_value(&root.path, TEAM_DATA_DIRECTORY, Some(Value::from("Enter network directory path")));
        let err = ProjectConfig::load(&store, root.clone()).unwrap_err();
        assert!(matches!(err, DriverError::MissingConfiguration { ref name, .. } if name == TEAM_DATA_DIRECTORY));

        store.put_value(&root.path, TEAM_DATA_DIRECTORY, Some(Value::from("/shared/team")));
        store.put_value(&root.path, INDIV_INITIALS, Some(Value::from("tttt")));
        let err = ProjectConfig::load(&store, root.clone()).unwrap_err();
        assert!(matches!(err, DriverError::MissingConfiguration { ref name, .. } if name == INDIV_INITIALS));

        store.put_value(&root.path, INDIV_INITIALS, Some(Value::from("ab")));
        store.put_value(&root.path, SYNC_FULL_WBS, Some(Value::Number(1.0)));
        let config = ProjectConfig::load(&store, root).unwrap();
        assert_eq!(config.role, Role::individual("ab"));
        assert!(config.full_copy);
        assert_eq!(config.team_dir, PathBuf::from("/shared/team"));
    }

    #[test]
    fn conversion_flag_names_the_old_process() {
        let store = MemoryStore::new();
        let root = ProjectRoot {
            path: p("/Proj"),
            process_id: "TSP2".into(),
            kind: RootKind::Team,
        };
        store.put_value(&root.path, TEAM_DATA_DIRECTORY, Some(Value::from("/shared")));
        let config = ProjectConfig::load(&store, root).unwrap();
        assert_eq!(config.pending_migration(&store), None);

        store.put_value(&config.root.path, CONVERSION_NEEDED, Some(Value::from("TSP")));
        assert_eq!(
            config.pending_migration(&store),
            Some(TemplateTranslation::ConvertProcess {
                from: "TSP".into(),
                to: "TSP2".into()
            })
        );
    }
}
