//! Driver settings
//!
//! [`SyncSettings`] can be built in code or loaded from a TOML file; every
//! field has a default so a partial file is enough.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// When to write a worker call trace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncLogging {
    #[default]
    Never,
    Always,
    /// Only when more than [`SyncLogging::DELETE_THRESHOLD`] deletions or
    /// completions are pending
    ForDelete,
}

impl SyncLogging {
    pub const DELETE_THRESHOLD: usize = 5;
}

/// Settings of the periodic project scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    pub interval_secs: u64,
    /// Root template suffixes that mark a project to check
    pub markers: Vec<String>,
    /// Text in a brief check's change list that raises a notification
    pub alert_token: String,
}

impl ScannerSettings {
    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    #[inline]
    #[must_use]
    pub fn with_interval_secs(mut self, secs: u64) -> Self {
        self.interval_secs = secs;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.markers = markers.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            markers: vec!["IndivRoot".to_string(), "Indiv2Root".to_string()],
            alert_token: "SYNC-IS-NEEDED".to_string(),
        }
    }
}

/// Sync driver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Refuse every live run
    pub read_only: bool,
    /// Oldest WBS dump version accepted
    pub min_dump_version: Option<String>,
    /// Upper bound on live passes per run
    pub max_passes: usize,
    pub sync_inspected_sizes: bool,
    pub sync_logging: SyncLogging,
    /// Where call traces go; tracing only when set
    pub debug_log_dir: Option<PathBuf>,
    pub wbs_file_name: String,
    pub workflow_file_name: String,
    /// Directory holding `<processID>.xml` process template catalogs
    pub process_template_dir: Option<PathBuf>,
    /// Output directory for generated workflow templates
    pub templates_dir: Option<PathBuf>,
    /// Run the exporter after a live run that changed something
    pub auto_export: bool,
    pub scanner: ScannerSettings,
}

impl SyncSettings {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from TOML text
    ///
    /// # Errors
    /// Returns [`DriverError::Settings`] naming `origin` when the text is not
    /// valid settings TOML.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self, DriverError> {
        toml::from_str(text).map_err(|source| DriverError::Settings {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load settings from a TOML file
    ///
    /// # Errors
    /// Returns [`DriverError::Io`] when the file cannot be read and
    /// [`DriverError::Settings`] when it does not parse.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DriverError::io_error(path, e))?;
        Self::from_toml_str(&text, path)
    }

    #[inline]
    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_min_dump_version(mut self, version: impl Into<String>) -> Self {
        self.min_dump_version = Some(version.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_sync_logging(mut self, logging: SyncLogging, dir: impl Into<PathBuf>) -> Self {
        self.sync_logging = logging;
        self.debug_log_dir = Some(dir.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_templates(mut self, process_template_dir: impl Into<PathBuf>, templates_dir: impl Into<PathBuf>) -> Self {
        self.process_template_dir = Some(process_template_dir.into());
        self.templates_dir = Some(templates_dir.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_auto_export(mut self, auto_export: bool) -> Self {
        self.auto_export = auto_export;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_scanner(mut self, scanner: ScannerSettings) -> Self {
        self.scanner = scanner;
        self
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            read_only: false,
            min_dump_version: None,
            max_passes: 5,
            sync_inspected_sizes: true,
            sync_logging: SyncLogging::Never,
            debug_log_dir: None,
            wbs_file_name: "projDump.xml".to_string(),
            workflow_file_name: "workflowDump.xml".to_string(),
            process_template_dir: None,
            templates_dir: None,
            auto_export: false,
            scanner: ScannerSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let text = r#"
max_passes = 3
sync_logging = "for_delete"

[scanner]
alert_token = "STALE"
"#;
        let settings = SyncSettings::from_toml_str(text, Path::new("sync.toml")).unwrap();
        assert_eq!(settings.max_passes, 3);
        assert_eq!(settings.sync_logging, SyncLogging::ForDelete);
        assert_eq!(settings.wbs_file_name, "projDump.xml");
        assert_eq!(settings.scanner.alert_token, "STALE");
        assert_eq!(settings.scanner.interval_secs, 3600);
    }

    #[test]
    fn bad_file_names_its_path() {
        let err = SyncSettings::from_toml_str("max_passes = \"many\"", Path::new("sync.toml")).unwrap_err();
        assert!(err.to_string().contains("sync.toml"));
    }

    #[test]
    fn builders() {
        let settings = SyncSettings::new()
            .with_read_only(true)
            .with_max_passes(2)
            .with_scanner(ScannerSettings::default().with_interval_secs(0));
        assert!(settings.read_only);
        assert_eq!(settings.scanner.interval(), Duration::from_secs(1));
    }
}
