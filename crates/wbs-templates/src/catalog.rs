//! Generic task templates of a process
//!
//! Generated workflow templates borrow their IDs, data files and defect-log
//! settings from the process's own subtask templates, so a workflow step
//! behaves like any other task the process creates.

use std::path::Path;

use wbs_model::ProcessDefinition;

use crate::error::TemplateError;

/// Attributes copied onto a generated `<template>` element
pub(crate) const TEMPLATE_ATTRS: [&str; 5] = ["ID", "defectLog", "dataFile", "size", "constraints"];

/// Attributes copied onto a generated `<node>` element
pub(crate) const NODE_ATTRS: [&str; 4] = ["ID", "defectLog", "dataFile", "constraints"];

/// Non-empty attributes of one `<template>` element, in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateAttributes {
    attrs: Vec<(String, String)>,
}

impl TemplateAttributes {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The subset of `names` this template defines, in the order given
    pub(crate) fn select<'a>(&'a self, names: &'a [&'a str]) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        names
            .iter()
            .filter_map(move |name| self.get(name).map(|value| (*name, value)))
    }
}

/// The two subtask templates workflow templates are derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericTemplates {
    /// `<process>/IndivEmptyNode`
    pub legacy: TemplateAttributes,
    /// `<process>/Indiv2Task`
    pub current: TemplateAttributes,
}

impl GenericTemplates {
    /// Extract the generic subtask templates from a process template catalog
    ///
    /// # Errors
    /// Returns [`TemplateError::ProcessTemplate`] for malformed XML and
    /// [`TemplateError::MissingGenericTemplate`] when either template is
    /// absent.
    pub fn parse(xml: &str, path: &Path, process: &ProcessDefinition) -> Result<Self, TemplateError> {
        let doc = roxmltree::Document::parse(xml).map_err(|source| TemplateError::ProcessTemplate {
            path: path.to_path_buf(),
            source,
        })?;
        let find = |suffix: &str| {
            let id = process.template_id(suffix);
            doc.descendants()
                .filter(|n| n.has_tag_name("template"))
                .find(|n| n.attribute("ID") == Some(id.as_str()))
                .map(|n| TemplateAttributes {
                    attrs: n
                        .attributes()
                        .filter(|a| !a.value().is_empty())
                        .map(|a| (a.name().to_string(), a.value().to_string()))
                        .collect(),
                })
                .ok_or(TemplateError::MissingGenericTemplate(id))
        };
        Ok(Self {
            legacy: find("IndivEmptyNode")?,
            current: find("Indiv2Task")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"<dashboard-process-template>
  <template name="Task" ID="TSP/IndivEmptyNode" dataFile="tsp/empty.txt" defectLog="true" size="" href="x.htm"/>
  <template name="Task" ID="TSP/Indiv2Task" dataFile="tsp/task.txt" constraints="{Planning"/>
</dashboard-process-template>"#;

    #[test]
    fn copies_only_defined_attributes() {
        let process = ProcessDefinition::new("TSP");
        let generic = GenericTemplates::parse(CATALOG, Path::new("tsp.xml"), &process).unwrap();
        let copied: Vec<_> = generic.legacy.select(&TEMPLATE_ATTRS).collect();
        assert_eq!(
            copied,
            vec![("ID", "TSP/IndivEmptyNode"), ("defectLog", "true"), ("dataFile", "tsp/empty.txt")]
        );
        assert_eq!(generic.current.get("constraints"), Some("{Planning"));
        assert_eq!(generic.current.get("href"), None);
    }

    #[test]
    fn malformed_catalog_names_the_file() {
        let process = ProcessDefinition::new("TSP");
        let err = GenericTemplates::parse("<template", Path::new("tsp.xml"), &process).unwrap_err();
        assert!(err.to_string().contains("tsp.xml"));
    }

    #[test]
    fn missing_template_is_reported() {
        let process = ProcessDefinition::new("PSP");
        let err = GenericTemplates::parse(CATALOG, Path::new("tsp.xml"), &process).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::MissingGenericTemplate(ref id) if id == "PSP/IndivEmptyNode"
        ));
    }
}
