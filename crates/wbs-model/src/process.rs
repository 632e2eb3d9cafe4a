//! Process definition
//!
//! The slice of a process that synchronization needs: phase names with their
//! template IDs, and which phases count as construction work for each size
//! unit.

use std::collections::{BTreeMap, HashMap};

/// Size units whose construction work also happens inside PSP tasks
const PSP_SIZE_UNITS: [&str; 2] = ["LOC", "DLD Lines"];

/// Phase vocabulary of one process
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessDefinition {
    process_id: String,
    phases: Vec<String>,
    phase_ids: BTreeMap<String, String>,
    construction: HashMap<String, Vec<String>>,
    all_construction: Vec<String>,
}

impl ProcessDefinition {
    /// Empty definition for `process_id`
    #[must_use]
    pub fn new(process_id: impl Into<String>) -> Self {
        Self {
            process_id: process_id.into(),
            ..Self::default()
        }
    }

    /// Register a phase and its template ID (in process order)
    #[must_use]
    pub fn with_phase(mut self, name: impl Into<String>, template_id: impl Into<String>) -> Self {
        let name = name.into();
        if !self.phase_ids.contains_key(&name) {
            self.phases.push(name.clone());
        }
        self.phase_ids.insert(name, template_id.into());
        self
    }

    /// Construction phases for one size unit
    #[must_use]
    pub fn with_construction_phases<I, S>(mut self, units: impl Into<String>, phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let units = units.into();
        let mut list: Vec<String> = phases.into_iter().map(Into::into).collect();
        if PSP_SIZE_UNITS.contains(&units.as_str()) && !list.iter().any(|p| p == "psp") {
            list.push("psp".to_string());
        }
        self.construction.insert(units, list);
        self
    }

    /// Construction phases regardless of size unit
    #[must_use]
    pub fn with_all_construction_phases<I, S>(mut self, phases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.all_construction = phases.into_iter().map(Into::into).collect();
        self
    }

    /// Process identifier (template ID prefix)
    #[inline]
    #[must_use]
    pub fn process_id(&self) -> &str {
        &self.process_id
    }

    /// Phase names in process order
    #[inline]
    #[must_use]
    pub fn phases(&self) -> &[String] {
        &self.phases
    }

    /// Template ID of a phase
    #[must_use]
    pub fn phase_id(&self, phase: &str) -> Option<&str> {
        self.phase_ids.get(phase).map(String::as_str)
    }

    /// True when `name` is one of the process phases
    #[must_use]
    pub fn is_phase(&self, name: &str) -> bool {
        self.phase_ids.contains_key(name)
    }

    /// Construction phases registered for `units`
    #[must_use]
    pub fn construction_phases(&self, units: &str) -> Option<&[String]> {
        self.construction.get(units).map(Vec::as_slice)
    }

    /// Fallback construction phase list
    #[must_use]
    pub fn all_construction_phases(&self) -> Option<&[String]> {
        if self.all_construction.is_empty() {
            None
        } else {
            Some(&self.all_construction)
        }
    }

    /// `<process>/<suffix>` template ID
    #[must_use]
    pub fn template_id(&self, suffix: &str) -> String {
        format!("{}/{suffix}", self.process_id)
    }

    /// Data name holding a task's effective phase
    #[must_use]
    pub fn effective_phase_data_name(&self) -> String {
        format!("{} /Effective_Phase", self.process_id)
    }
}
