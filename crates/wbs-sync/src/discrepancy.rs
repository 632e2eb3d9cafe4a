//! Divergences between the WBS and already-synchronized local values
//!
//! Discrepancies are produced by a pass and consumed by a reverse-sync
//! reporting layer; they never block the pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wbs_model::HierarchyPath;

/// One divergence found during a pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    /// Local plan time differs from the WBS allocation
    PlanTime {
        path: HierarchyPath,
        wbs_id: Option<String>,
        wbs: f64,
        local: f64,
    },
    /// The individual edited schedule exceptions locally
    Schedule {
        /// Week → hours, `None` where a WBS exception was erased
        edits: BTreeMap<i32, Option<f64>>,
    },
    /// The local effective phase differs from the WBS phase
    NodeType {
        path: HierarchyPath,
        wbs_id: Option<String>,
        wbs_phase: String,
        local_phase: String,
    },
}

impl Discrepancy {
    /// Hierarchy node the discrepancy refers to, if any
    #[must_use]
    pub fn path(&self) -> Option<&HierarchyPath> {
        match self {
            Self::PlanTime { path, .. } | Self::NodeType { path, .. } => Some(path),
            Self::Schedule { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_has_no_path() {
        let d = Discrepancy::Schedule {
            edits: BTreeMap::from([(3, Some(10.0)), (4, None)]),
        };
        assert!(d.path().is_none());
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["kind"], "schedule");
    }
}
