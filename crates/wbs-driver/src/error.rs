//! Driver errors
//!
//! Every variant here is fatal to the sync invocation. Each carries the file
//! or hierarchy path the caller needs to act on it.

use std::path::PathBuf;

use wbs_model::{HierarchyPath, ModelError};
use wbs_sync::SyncError;
use wbs_templates::TemplateError;

/// Fatal sync driver error
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// No project root encloses the starting path
    #[error("'{0}' is not inside a team project")]
    NotATeamProject(HierarchyPath),

    /// A required configuration value is absent or still a placeholder
    #[error("project '{project}' is missing configuration value '{name}'")]
    MissingConfiguration { project: HierarchyPath, name: String },

    /// The WBS dump does not exist
    #[error("WBS file {0} does not exist")]
    WbsFileMissing(PathBuf),

    /// The WBS dump exists but cannot be read
    #[error("could not read WBS file {path}: {source}")]
    WbsFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The WBS dump is not a valid dump
    #[error("WBS file {path} is corrupt: {source}")]
    WbsFileCorrupt {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    /// The dump was produced by a tool older than required
    #[error("WBS file {path} has version {found}; version {required} or later is required")]
    VersionTooOld {
        path: PathBuf,
        found: String,
        required: String,
    },

    /// A structural editor holds the hierarchy
    #[error("the hierarchy editor is open; close it before synchronizing '{0}'")]
    ConcurrentEditorOpen(HierarchyPath),

    /// Writes are disabled
    #[error("cannot synchronize '{0}' in read-only mode")]
    ReadOnlyMode(HierarchyPath),

    /// Settings file could not be parsed
    #[error("invalid settings file {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DriverError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn missing(project: &HierarchyPath, name: &str) -> Self {
        Self::MissingConfiguration {
            project: project.clone(),
            name: name.to_string(),
        }
    }
}
