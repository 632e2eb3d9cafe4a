//! Hierarchy alteration errors

use wbs_model::HierarchyPath;

/// A structural change the hierarchy refused
///
/// These are never fatal to a pass: the caller reports them as a
/// "could not ..." change and moves on to the next sibling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    /// No node at the path
    #[error("no node exists at '{0}'")]
    NotFound(HierarchyPath),

    /// The change conflicts with what is already there
    #[error("could not alter '{path}' - {reason}")]
    AlterationFailed { path: HierarchyPath, reason: String },
}

impl HierarchyError {
    /// Build an alteration failure
    #[must_use]
    pub fn alteration(path: &HierarchyPath, reason: impl Into<String>) -> Self {
        Self::AlterationFailed {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// Short reason suitable for a change entry
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::NotFound(_) => "node does not exist".to_string(),
            Self::AlterationFailed { reason, .. } => reason.clone(),
        }
    }
}
