//! Template synchronizer
//!
//! Keeps `Workflows-<projectID>-template.xml` in step with the team's
//! workflow dump.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use wbs_model::{ContentHash, HierarchyPath, ProcessDefinition, WorkflowDocument};

use crate::catalog::GenericTemplates;
use crate::error::TemplateError;
use crate::render::{render, RenderContext, DOC_ROOT, SOURCE_HASH_ATTR};

/// Change reported when the templates were (or would be) regenerated
pub const TEMPLATES_UPDATED: &str = "Updated templates for common team workflows";

/// Regenerates workflow templates for one team project
///
/// Only team and master projects own a workflow dump; callers decide
/// whether to run it.
#[derive(Debug, Clone)]
pub struct TemplateSynchronizer {
    project_path: HierarchyPath,
    process: ProcessDefinition,
    workflow_file: PathBuf,
    process_template_file: PathBuf,
    dest_file: PathBuf,
    what_if: bool,
}

impl TemplateSynchronizer {
    /// Synchronizer writing into `dest_dir`
    #[must_use]
    pub fn new(
        project_path: HierarchyPath,
        process: ProcessDefinition,
        project_id: &str,
        workflow_file: impl Into<PathBuf>,
        process_template_file: impl Into<PathBuf>,
        dest_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            project_path,
            process,
            workflow_file: workflow_file.into(),
            process_template_file: process_template_file.into(),
            dest_file: dest_dir.as_ref().join(dest_file_name(project_id)),
            what_if: true,
        }
    }

    /// Report without writing (the default)
    #[must_use]
    pub fn with_what_if(mut self, what_if: bool) -> Self {
        self.what_if = what_if;
        self
    }

    /// Output file
    #[inline]
    #[must_use]
    pub fn dest_file(&self) -> &Path {
        &self.dest_file
    }

    /// Regenerate the templates when they are stale
    ///
    /// Returns the change list: empty when the output is current, otherwise
    /// a single [`TEMPLATES_UPDATED`] entry.
    ///
    /// # Errors
    /// Returns [`TemplateError`] when an input cannot be read or parsed, or
    /// the output cannot be written.
    pub async fn sync(&self) -> Result<Vec<String>, TemplateError> {
        let Some(workflow_xml) = read_optional(&self.workflow_file).await? else {
            debug!(path = %self.workflow_file.display(), "no workflow dump, templates not needed");
            return Ok(Vec::new());
        };
        let source_hash = ContentHash::compute(workflow_xml.as_bytes());
        if !self.is_stale(&source_hash).await? {
            debug!(path = %self.dest_file.display(), "workflow templates are current");
            return Ok(Vec::new());
        }

        if !self.what_if {
            self.regenerate(&workflow_xml, source_hash).await?;
            info!(
                path = %self.dest_file.display(),
                source = %source_hash.short(),
                "regenerated workflow templates"
            );
        }
        Ok(vec![TEMPLATES_UPDATED.to_string()])
    }

    /// Stale when the output is missing, was built from other workflow
    /// content, or predates the process template
    async fn is_stale(&self, source_hash: &ContentHash) -> Result<bool, TemplateError> {
        let Some(existing) = read_optional(&self.dest_file).await? else {
            return Ok(true);
        };
        let recorded = roxmltree::Document::parse(&existing).ok().and_then(|doc| {
            let root = doc.root_element();
            if !root.has_tag_name(DOC_ROOT) {
                return None;
            }
            root.attribute(SOURCE_HASH_ATTR)?.parse::<ContentHash>().ok()
        });
        if recorded.as_ref() != Some(source_hash) {
            return Ok(true);
        }

        let dest_time = modified(&self.dest_file).await?;
        let process_time = modified(&self.process_template_file).await.ok();
        Ok(process_time.is_some_and(|t| t > dest_time))
    }

    async fn regenerate(&self, workflow_xml: &str, source_hash: ContentHash) -> Result<(), TemplateError> {
        let workflows = WorkflowDocument::parse(workflow_xml).map_err(|source| TemplateError::Workflow {
            path: self.workflow_file.clone(),
            source,
        })?;
        let catalog = tokio::fs::read_to_string(&self.process_template_file)
            .await
            .map_err(|e| TemplateError::io_error(&self.process_template_file, e))?;
        let generic = GenericTemplates::parse(&catalog, &self.process_template_file, &self.process)?;

        let ctx = RenderContext {
            process: &self.process,
            generic: &generic,
            name_prefix: self
                .project_path
                .name()
                .map(|name| format!("{name} - "))
                .unwrap_or_default(),
            source_hash,
        };
        let bytes = render(&workflows, &ctx)?;
        write_atomically(&self.dest_file, &bytes).await
    }
}

/// `Workflows-<projectID>-template.xml`
#[must_use]
pub fn dest_file_name(project_id: &str) -> String {
    format!("Workflows-{project_id}-template.xml")
}

async fn read_optional(path: &Path) -> Result<Option<String>, TemplateError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(TemplateError::io_error(path, e)),
    }
}

async fn modified(path: &Path) -> Result<SystemTime, TemplateError> {
    tokio::fs::metadata(path)
        .await
        .and_then(|m| m.modified())
        .map_err(|e| TemplateError::io_error(path, e))
}

/// Write to a sibling temp file, then rename over the destination
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), TemplateError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TemplateError::io_error(parent, e))?;
    }
    let temp_path = path.with_extension("xml.tmp");
    let mut file = tokio::fs::File::create(&temp_path)
        .await
        .map_err(|e| TemplateError::io_error(&temp_path, e))?;
    file.write_all(bytes)
        .await
        .map_err(|e| TemplateError::io_error(&temp_path, e))?;
    file.sync_all()
        .await
        .map_err(|e| TemplateError::io_error(&temp_path, e))?;
    drop(file);
    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(|e| TemplateError::io_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_file_name() {
        assert_eq!(dest_file_name("a1b2"), "Workflows-a1b2-template.xml");
        let sync = TemplateSynchronizer::new(
            HierarchyPath::root(),
            ProcessDefinition::new("TSP"),
            "a1b2",
            "workflowDump.xml",
            "tsp.xml",
            "/templates",
        );
        assert_eq!(sync.dest_file(), Path::new("/templates/Workflows-a1b2-template.xml"));
    }

    #[tokio::test]
    async fn missing_workflow_dump_needs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let sync = TemplateSynchronizer::new(
            HierarchyPath::root(),
            ProcessDefinition::new("TSP"),
            "p",
            dir.path().join("workflowDump.xml"),
            dir.path().join("tsp.xml"),
            dir.path(),
        )
        .with_what_if(false);
        assert!(sync.sync().await.unwrap().is_empty());
        assert!(!sync.dest_file().exists());
    }
}
