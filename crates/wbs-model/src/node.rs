//! WBS node types
//!
//! A [`WbsNode`] is one element of the parsed dump. Nodes live in the arena
//! owned by [`WbsDocument`](crate::WbsDocument) and refer to each other by
//! [`NodeId`].

use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Index of a node within its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position in document order
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Element kinds recognised in a WBS dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The `<project>` root
    Project,
    /// A `<component>`
    Component,
    /// A `<document>`
    Document,
    /// A `<task>`
    Task,
    /// A `<psp>` task
    PspTask,
}

impl NodeKind {
    /// Map an XML tag name to a node kind
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "project" => Some(Self::Project),
            "component" => Some(Self::Component),
            "document" => Some(Self::Document),
            "task" => Some(Self::Task),
            "psp" => Some(Self::PspTask),
            _ => None,
        }
    }

    /// XML tag name
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Component => "component",
            Self::Document => "document",
            Self::Task => "task",
            Self::PspTask => "psp",
        }
    }

    /// True for `task` and `psp`
    #[inline]
    #[must_use]
    pub const fn is_task(self) -> bool {
        matches!(self, Self::Task | Self::PspTask)
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Per-person time allocation parsed from a `time` attribute
///
/// The attribute looks like `,alice=4.5,bob=2.0,`. Initials are compared
/// case-insensitively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeAllocation {
    entries: Vec<(String, f64)>,
}

impl TimeAllocation {
    /// Parse an allocation string, skipping malformed entries
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let entries = raw
            .split(',')
            .filter_map(|entry| {
                let (who, amount) = entry.split_once('=')?;
                let who = who.trim();
                if who.is_empty() {
                    return None;
                }
                let amount = amount
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|a| a.is_finite() && *a >= 0.0)?;
                Some((who.to_lowercase(), amount))
            })
            .collect();
        Self { entries }
    }

    /// Time allocated to `initials`, if they appear at all
    #[must_use]
    pub fn hours_for(&self, initials: &str) -> Option<f64> {
        let wanted = initials.to_lowercase();
        self.entries
            .iter()
            .find(|(who, _)| *who == wanted)
            .map(|(_, amount)| *amount)
    }

    /// True when `initials` have an entry (even a zero one)
    #[must_use]
    pub fn mentions(&self, initials: &str) -> bool {
        self.hours_for(initials).is_some()
    }

    /// Sum over every contributor
    #[must_use]
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, amount)| amount).sum()
    }

    /// Iterate `(initials, amount)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(who, amount)| (who.as_str(), *amount))
    }

    /// True when nobody has time here
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Size attributes carried by a node
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeData {
    /// Unit of `new_changed` (e.g. `LOC`, `Text Pages`)
    pub units: Option<String>,
    /// `sizeNC`
    pub new_changed: Option<f64>,
    /// `sizeBase`
    pub base: Option<f64>,
    /// `sizeDel`
    pub deleted: Option<f64>,
    /// `sizeMod`
    pub modified: Option<f64>,
    /// `sizeAdd`
    pub added: Option<f64>,
    /// `sizeReu`
    pub reused: Option<f64>,
    /// `inspSize`
    pub inspected: Option<f64>,
    /// `inspUnits`
    pub inspected_units: Option<String>,
}

/// A `<dependency>` child
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// Task ID the node depends on
    pub id: String,
    /// Display name of the dependency
    pub name: Option<String>,
}

/// A `<teamMember>` entry of the project root
#[derive(Debug, Clone, PartialEq)]
pub struct TeamMember {
    pub initials: String,
    pub name: String,
    pub hours_per_week: Option<f64>,
    pub start_date: Option<String>,
    pub end_week: Option<i32>,
    /// Week index → planned hours for that week
    pub exceptions: BTreeMap<i32, f64>,
}

/// One node of the WBS tree
#[derive(Debug, Clone)]
pub struct WbsNode {
    pub kind: NodeKind,
    pub name: String,
    pub id: String,
    pub task_ids: Option<String>,
    pub phase_name: Option<String>,
    pub effective_phase: Option<String>,
    pub sync_phase_name: Option<String>,
    pub time: TimeAllocation,
    pub sync_time: TimeAllocation,
    pub size: SizeData,
    pub labels: Vec<String>,
    pub dependencies: Vec<Dependency>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl WbsNode {
    pub(crate) fn new(kind: NodeKind, name: String, id: String) -> Self {
        Self {
            kind,
            name,
            id,
            task_ids: None,
            phase_name: None,
            effective_phase: None,
            sync_phase_name: None,
            time: TimeAllocation::default(),
            sync_time: TimeAllocation::default(),
            size: SizeData::default(),
            labels: Vec::new(),
            dependencies: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Phase this node contributes time to for ratio purposes
    ///
    /// Falls back to the element tag, so a `<psp>` node counts as phase `psp`.
    #[must_use]
    pub fn phase_for_ratio(&self) -> &str {
        self.phase_name.as_deref().unwrap_or(self.kind.tag())
    }

    /// True when the node has no name and must be discarded
    #[inline]
    #[must_use]
    pub fn is_nameless(&self) -> bool {
        self.name.is_empty()
    }
}
