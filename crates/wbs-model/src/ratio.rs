//! Time-ratio apportionment
//!
//! A contributor's share of a node's size is their time in the construction
//! phases for the size unit, divided by everyone's time in those phases,
//! summed over the node and its whole subtree (pruned nodes included).
//!
//! When that is undefined the "all construction phases" list is tried, then
//! the same lookup one level up, until the project node is passed and the
//! share becomes `0`.
//!
//! Per-node phase sums are memoized, so repeated lookups over a document stay
//! linear in its size.

use std::collections::{BTreeMap, HashMap};

use crate::document::WbsDocument;
use crate::node::NodeId;
use crate::process::ProcessDefinition;

/// Which phase list a sum was taken over
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PhaseSet {
    Units(String),
    All,
}

/// Time spent in a set of phases, overall and per contributor
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseSums {
    /// Everyone's time
    pub total: f64,
    /// Lower-cased initials → time
    pub by_person: BTreeMap<String, f64>,
}

impl PhaseSums {
    /// `initials` share of the total; NaN when nobody has time here
    #[must_use]
    pub fn share(&self, initials: &str) -> f64 {
        if self.total <= 0.0 {
            return f64::NAN;
        }
        let mine = self
            .by_person
            .get(&initials.to_lowercase())
            .copied()
            .unwrap_or(0.0);
        mine / self.total
    }

    fn absorb(&mut self, other: &Self) {
        self.total += other.total;
        for (who, amount) in &other.by_person {
            *self.by_person.entry(who.clone()).or_insert(0.0) += amount;
        }
    }
}

/// Memoizing ratio calculator over one document
#[derive(Debug)]
pub struct TimeRatios<'a> {
    doc: &'a WbsDocument,
    process: &'a ProcessDefinition,
    memo: HashMap<(NodeId, PhaseSet), PhaseSums>,
}

impl<'a> TimeRatios<'a> {
    /// Calculator for `doc` using the phase lists of `process`
    #[must_use]
    pub fn new(doc: &'a WbsDocument, process: &'a ProcessDefinition) -> Self {
        Self {
            doc,
            process,
            memo: HashMap::new(),
        }
    }

    /// Share of `node`'s `units` size that belongs to `initials`, in `[0, 1]`
    pub fn ratio(&mut self, node: NodeId, units: &str, initials: &str) -> f64 {
        let mut current = Some(node);
        while let Some(id) = current {
            for set in [PhaseSet::Units(units.to_string()), PhaseSet::All] {
                if let Some(sums) = self.sums(id, &set) {
                    let share = sums.share(initials);
                    if !share.is_nan() {
                        return share;
                    }
                }
            }
            current = self.doc.parent(id);
        }
        0.0
    }

    fn sums(&mut self, id: NodeId, set: &PhaseSet) -> Option<&PhaseSums> {
        let phases: Vec<String> = match set {
            PhaseSet::Units(units) => self.process.construction_phases(units)?.to_vec(),
            PhaseSet::All => self.process.all_construction_phases()?.to_vec(),
        };
        self.fill(id, set, &phases);
        self.memo.get(&(id, set.clone()))
    }

    fn fill(&mut self, id: NodeId, set: &PhaseSet, phases: &[String]) {
        if self.memo.contains_key(&(id, set.clone())) {
            return;
        }
        let doc = self.doc;
        let node = doc.node(id);
        let mut sums = PhaseSums::default();
        if phases.iter().any(|p| p == node.phase_for_ratio()) {
            for (who, amount) in node.time.iter() {
                sums.total += amount;
                *sums.by_person.entry(who.to_string()).or_insert(0.0) += amount;
            }
        }
        for child in doc.children(id) {
            self.fill(*child, set, phases);
            if let Some(child_sums) = self.memo.get(&(*child, set.clone())) {
                sums.absorb(child_sums);
            }
        }
        self.memo.insert((id, set.clone()), sums);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"<project>
  <component name="Widget" id="1" sizeUnits="LOC" sizeNC="100">
    <task name="Code" id="2" phaseName="Code" time=",alice=3,bob=1,"/>
    <task name="Review" id="3" phaseName="Code Review" time=",carol=5,"/>
  </component>
  <document name="Guide" id="4" sizeUnits="Text Pages">
    <task name="Outline" id="5" phaseName="Planning" time=",alice=2,"/>
  </document>
  <component name="Empty" id="6">
    <component name="Inner" id="7"/>
  </component>
</project>"#;

    fn process() -> ProcessDefinition {
        ProcessDefinition::new("TSP")
            .with_construction_phases("LOC", ["Code"])
            .with_construction_phases("Text Pages", ["Draft"])
            .with_all_construction_phases(["Code", "Draft", "Planning"])
    }

    #[test]
    fn ratio_uses_unit_phases() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        let process = process();
        let mut ratios = TimeRatios::new(&doc, &process);
        let widget = doc.children(doc.root())[0];
        assert!((ratios.ratio(widget, "LOC", "alice") - 0.75).abs() < 1e-9);
        assert!((ratios.ratio(widget, "LOC", "bob") - 0.25).abs() < 1e-9);
        assert_eq!(ratios.ratio(widget, "LOC", "carol"), 0.0);
    }

    #[test]
    fn ratio_falls_back_to_all_construction_phases() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        let process = process();
        let mut ratios = TimeRatios::new(&doc, &process);
        let guide = doc.children(doc.root())[1];
        assert!((ratios.ratio(guide, "Text Pages", "alice") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ratio_walks_up_then_gives_zero() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        let process = process();
        let mut ratios = TimeRatios::new(&doc, &process);
        let inner = doc.children(doc.children(doc.root())[2])[0];
        assert!((ratios.ratio(inner, "LOC", "alice") - 0.75).abs() < 1e-9);

        let bare = WbsDocument::parse(r#"<project><component name="X" id="1"/></project>"#).unwrap();
        let mut ratios = TimeRatios::new(&bare, &process);
        let x = bare.children(bare.root())[0];
        assert_eq!(ratios.ratio(x, "LOC", "alice"), 0.0);
    }

    #[test]
    fn unknown_units_use_fallback_list() {
        let doc = WbsDocument::parse(DUMP).unwrap();
        let process = process();
        let mut ratios = TimeRatios::new(&doc, &process);
        let widget = doc.children(doc.root())[0];
        assert!((ratios.ratio(widget, "Widgets", "alice") - 0.75).abs() < 1e-9);
    }
}
