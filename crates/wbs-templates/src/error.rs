//! Template generation errors

use std::path::PathBuf;

use wbs_model::ModelError;

/// Failure while regenerating workflow templates
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// IO error reading or writing a template file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The workflow dump could not be parsed
    #[error("invalid workflow dump {path}: {source}")]
    Workflow {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    /// The process template catalog could not be parsed
    #[error("invalid process template {path}: {source}")]
    ProcessTemplate {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    /// A generic task template the output is based on is missing
    #[error("process template has no '{0}' template")]
    MissingGenericTemplate(String),

    /// Serializing the output failed
    #[error("xml write error: {0}")]
    Xml(String),
}

impl TemplateError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn xml(err: impl std::fmt::Display) -> Self {
        Self::Xml(err.to_string())
    }
}
