//! Change records
//!
//! One entry per structural or data mutation a pass made (or would make in a
//! dry run). The `Display` form is the human-readable log line.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use wbs_model::HierarchyPath;

/// Summary line used when only bookkeeping values changed
pub const MISC_CHANGE: &str = "Updated miscellaneous project information";

/// One change made by a synchronization pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    Created { path: HierarchyPath },
    Deleted { path: HierarchyPath },
    /// Same parent, new name
    Renamed { from: HierarchyPath, to: HierarchyPath },
    /// Different parent
    Moved { from: HierarchyPath, to: HierarchyPath },
    MarkedComplete { path: HierarchyPath },
    MarkedIncomplete { path: HierarchyPath },
    DependenciesUpdated { path: HierarchyPath },
    ScheduleUpdated,
    CouldNotCreate { path: HierarchyPath, reason: String },
    CouldNotDelete { path: HierarchyPath, reason: String },
    CouldNotMove { path: HierarchyPath, reason: String },
    /// Only bookkeeping values changed
    Miscellaneous,
    /// Free-form entry
    Message { text: String },
}

impl Change {
    /// True for the "could not ..." family
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::CouldNotCreate { .. } | Self::CouldNotDelete { .. } | Self::CouldNotMove { .. }
        )
    }
}

impl Display for Change {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created { path } => write!(f, "Created '{path}'"),
            Self::Deleted { path } => write!(f, "Deleted '{path}'"),
            Self::Renamed { from, to } => write!(f, "Renamed '{from}' to '{to}'"),
            Self::Moved { from, to } => write!(f, "Moved '{from}' to '{to}'"),
            Self::MarkedComplete { path } => write!(f, "Marked '{path}' complete"),
            Self::MarkedIncomplete { path } => write!(f, "Marked '{path}' incomplete."),
            Self::DependenciesUpdated { path } => {
                write!(f, "Updated task dependencies for '{path}'")
            }
            Self::ScheduleUpdated => f.write_str("Updated the earned value schedule"),
            Self::CouldNotCreate { path, reason } => write!(f, "Could not create '{path}' - {reason}"),
            Self::CouldNotDelete { path, reason } => write!(f, "Could not delete '{path}' - {reason}"),
            Self::CouldNotMove { path, reason } => write!(f, "Could not move '{path}' - {reason}"),
            Self::Miscellaneous => f.write_str(MISC_CHANGE),
            Self::Message { text } => f.write_str(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> HierarchyPath {
        s.parse().unwrap()
    }

    #[test]
    fn display_lines() {
        let renamed = Change::Renamed {
            from: p("/Proj/OldName"),
            to: p("/Proj/NewName"),
        };
        assert_eq!(renamed.to_string(), "Renamed '/Proj/OldName' to '/Proj/NewName'");
        let failed = Change::CouldNotCreate {
            path: p("/Proj/A/Code"),
            reason: "existing node is in the way".into(),
        };
        assert_eq!(
            failed.to_string(),
            "Could not create '/Proj/A/Code' - existing node is in the way"
        );
        assert!(failed.is_failure());
        assert_eq!(Change::Miscellaneous.to_string(), MISC_CHANGE);
    }

    #[test]
    fn serde_is_tagged() {
        let json = serde_json::to_string(&Change::Created { path: p("/P/A") }).unwrap();
        assert_eq!(json, r#"{"kind":"created","path":"/P/A"}"#);
    }
}
