//! One synchronization pass
//!
//! Walks the pruned WBS and the live hierarchy together, parent before
//! children. Each WBS node is first matched to a live node (by path, then by
//! stored WBS ID anywhere in the project), created if nothing matches, then
//! given its data. Live children nobody claimed are queued and handled after
//! the walk: deleted on the team side, deleted or completed for individuals.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, warn};
use wbs_hierarchy::{is_false, Value};
use wbs_model::{
    HierarchyPath, NodeId, NodeKind, ProcessDefinition, PruneOptions, PrunedView, Role, TimeRatios,
    WbsDocument, WbsNode,
};
use wbs_worker::names::{sync_name, ESTIMATED_TIME, PSP_PHASES};
use wbs_worker::SyncWorker;

use crate::changes::Change;
use crate::discrepancy::Discrepancy;
use crate::names::{
    EST_SIZE, INDIV2_ROOT, LABEL_LIST, LOC_UNITS, NODE_ORDER, PSP_COMPATIBLE, PSP_PLANNING_COMPLETED,
    PSP_SIZE_FIELDS, PSP_TEMPLATE, SCHEDULE_DUMP_VERSION, SIZE_UNITS, TASK_DEPENDENCIES, TASK_IDS,
    UNKNOWN_PHASE, WBS_ID,
};
use crate::schedule::sync_schedule;
use crate::survey;
use crate::synchronizer::{SyncMode, SyncOptions, SyncOutcome};

const PLAN_TIME_TOLERANCE: f64 = 0.001;

/// How individual tasks are laid out, chosen by the project root template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskStyle {
    /// Each task gets a phase child holding the estimate
    Legacy,
    /// Tasks carry an effective-phase value; estimates live on leaves
    Current,
}

impl TaskStyle {
    pub(crate) fn for_root(template_id: Option<&str>) -> Self {
        let suffix = format!("/{INDIV2_ROOT}");
        if template_id.is_some_and(|t| t.ends_with(&suffix)) {
            Self::Current
        } else {
            Self::Legacy
        }
    }
}

/// What a WBS node of one kind looks like in the hierarchy
#[derive(Debug, Clone)]
struct NodeSpec {
    template: String,
    compatible: Vec<String>,
    /// Compatible templates are left alone instead of being replaced
    keep_compatible: bool,
    /// Appended to names that collide with a process phase
    suffix: &'static str,
}

impl NodeSpec {
    fn accepts(&self, template_id: Option<&str>) -> bool {
        template_id.is_some_and(|t| t == self.template || self.compatible.iter().any(|c| c == t))
    }
}

fn split_ids(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn is_phase_stub<W: SyncWorker + ?Sized>(
    worker: &W,
    process: &ProcessDefinition,
    style: TaskStyle,
    path: &HierarchyPath,
) -> bool {
    if style != TaskStyle::Legacy || !worker.is_leaf(path) {
        return false;
    }
    let Some(phase_id) = path.name().and_then(|name| process.phase_id(name)) else {
        return false;
    };
    worker.template_id(path).as_deref() == Some(phase_id)
}

fn is_user_created<W: SyncWorker + ?Sized>(
    worker: &W,
    process: &ProcessDefinition,
    style: TaskStyle,
    path: &HierarchyPath,
) -> bool {
    survey::wbs_id_at(worker, path).is_none() && !is_phase_stub(worker, process, style, path)
}

pub(crate) struct Pass<'a, W: SyncWorker + ?Sized> {
    project: &'a HierarchyPath,
    doc: &'a WbsDocument,
    process: &'a ProcessDefinition,
    options: &'a SyncOptions,
    worker: &'a mut W,
    style: TaskStyle,
    view: PrunedView,
    ratios: TimeRatios<'a>,
    doc_ids: HashSet<&'a str>,
    /// Original paths of nodes with no recorded history
    deletable: HashSet<HierarchyPath>,
    changes: Vec<Change>,
    discrepancies: Vec<Discrepancy>,
    deferred: Vec<HierarchyPath>,
    misc: bool,
    follow_on: bool,
}

impl<'a, W: SyncWorker + ?Sized> Pass<'a, W> {
    pub(crate) fn new(
        project: &'a HierarchyPath,
        doc: &'a WbsDocument,
        process: &'a ProcessDefinition,
        options: &'a SyncOptions,
        worker: &'a mut W,
        root_template: Option<&str>,
        mode: SyncMode,
    ) -> Self {
        let style = TaskStyle::for_root(root_template);
        let individual = options.role.initials().is_some();

        let (deletable, keep_ids) = {
            let live: &W = &*worker;
            if individual {
                let deletable = survey::deletable_nodes(live, project, |path| {
                    is_user_created(live, process, style, path)
                });
                let keep_ids = match mode {
                    SyncMode::WhatIf => survey::keep_ids(live, project, |path| deletable.contains(path)),
                    SyncMode::Live => survey::keep_ids(live, project, |path| {
                        live.ledger().deletions_allowed().lists(path)
                    }),
                };
                (deletable, keep_ids)
            } else {
                (HashSet::new(), HashSet::new())
            }
        };
        debug!(
            %project,
            ?style,
            deletable = deletable.len(),
            keep = keep_ids.len(),
            "surveyed live hierarchy"
        );

        let view = PrunedView::compute(
            doc,
            PruneOptions {
                role: &options.role,
                full_copy: options.full_copy,
                keep_ids: &keep_ids,
            },
        );

        Self {
            project,
            doc,
            process,
            options,
            worker,
            style,
            view,
            ratios: TimeRatios::new(doc, process),
            doc_ids: doc.ids(),
            deletable,
            changes: Vec::new(),
            discrepancies: Vec::new(),
            deferred: Vec::new(),
            misc: false,
            follow_on: false,
        }
    }

    pub(crate) fn run(&mut self) {
        self.save_node_order();
        self.save_labels();
        self.sync_individual_schedule();

        let doc = self.doc;
        let root = doc.root();
        let project = self.project.clone();
        self.set_task_ids(&project, doc.node(root).task_ids.as_deref());
        self.sync_children(&project, root, &[]);

        if !self.should_stop() {
            self.process_deferred();
        }
    }

    pub(crate) fn finish(mut self) -> SyncOutcome {
        let ledger = self.worker.ledger();
        let deletions = ledger.nodes_deleted().to_vec();
        let completions = ledger.nodes_completed().to_vec();
        let withheld_deletions = ledger.deletions_withheld().to_vec();
        let withheld_completions = ledger.completions_withheld().to_vec();
        let data_changed = !ledger.data_changed().is_empty();

        self.changes
            .extend(deletions.iter().map(|path| Change::Deleted { path: path.clone() }));
        self.changes
            .extend(completions.iter().map(|path| Change::MarkedComplete { path: path.clone() }));
        if self.changes.is_empty() && (self.misc || data_changed) {
            self.changes.push(Change::Miscellaneous);
        }

        SyncOutcome {
            changes: self.changes,
            discrepancies: self.discrepancies,
            deletions,
            completions,
            withheld_deletions,
            withheld_completions,
            follow_on_needed: self.follow_on,
        }
    }

    fn should_stop(&self) -> bool {
        self.options.brief
            && (!self.changes.is_empty() || self.misc || !self.worker.ledger().data_changed().is_empty())
    }

    fn initials(&self) -> Option<&'a str> {
        let options: &'a SyncOptions = self.options;
        options.role.initials()
    }

    // ---- project-level values -------------------------------------------

    fn force_root_value(&mut self, name: &str, value: Option<Value>) {
        if self.worker.get_value(self.project, name) != value {
            debug!(project = %self.project, name, "updating project value");
            self.worker.put_value_force(self.project, name, value);
            self.misc = true;
        }
    }

    fn save_node_order(&mut self) {
        let order: Vec<String> = self
            .doc
            .iter()
            .filter(|(_, node)| node.kind != NodeKind::Project)
            .filter_map(|(_, node)| node.task_ids.as_deref())
            .flat_map(split_ids)
            .map(String::from)
            .collect();
        self.force_root_value(NODE_ORDER, (!order.is_empty()).then(|| Value::List(order)));
    }

    fn save_labels(&mut self) {
        let team_side = self.options.role.is_team_side();
        let doc = self.doc;
        let mut labels: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for (id, node) in doc.iter() {
            if node.kind == NodeKind::Project || !(team_side || self.view.is_kept(id)) {
                continue;
            }
            let Some(task_ids) = node.task_ids.as_deref() else {
                continue;
            };
            for label in &node.labels {
                labels.entry(label.as_str()).or_default().extend(split_ids(task_ids));
            }
        }
        let entries: Vec<String> = labels
            .iter()
            .map(|(label, ids)| {
                let ids: Vec<&str> = ids.iter().copied().collect();
                format!("{label}={}", ids.join(","))
            })
            .collect();
        self.force_root_value(LABEL_LIST, (!entries.is_empty()).then(|| Value::List(entries)));
    }

    fn sync_individual_schedule(&mut self) {
        let Some(initials) = self.initials() else {
            return;
        };
        let doc = self.doc;
        if !doc.version_at_least(SCHEDULE_DUMP_VERSION) {
            return;
        }
        let Some(member) = doc.team_member(initials) else {
            return;
        };
        let merge = sync_schedule(&mut *self.worker, self.project, member);
        if merge.changed {
            self.changes.push(Change::ScheduleUpdated);
        }
        self.discrepancies.extend(merge.discrepancy);
    }

    // ---- structure ------------------------------------------------------

    fn read_only_template(&self) -> String {
        let suffix = match (&self.options.role, self.style) {
            (Role::Team, _) => "TeamNode",
            (Role::Master, _) => "MasterNode",
            (Role::Individual(_), TaskStyle::Current) => "Indiv2ReadOnlyNode",
            (Role::Individual(_), TaskStyle::Legacy) => "IndivReadOnlyNode",
        };
        self.process.template_id(suffix)
    }

    fn task_template(&self) -> String {
        match self.style {
            TaskStyle::Current => self.process.template_id("Indiv2Task"),
            TaskStyle::Legacy => self.process.template_id("IndivEmptyNode"),
        }
    }

    fn spec_for(&self, kind: NodeKind) -> NodeSpec {
        let task_suffix = match self.style {
            TaskStyle::Legacy => " Task",
            TaskStyle::Current => "",
        };
        let read_only = self.read_only_template();
        match kind {
            NodeKind::Task => {
                let task = self.task_template();
                NodeSpec {
                    compatible: vec![task.clone(), read_only],
                    template: task,
                    keep_compatible: false,
                    suffix: task_suffix,
                }
            }
            NodeKind::PspTask => NodeSpec {
                template: PSP_TEMPLATE.to_string(),
                compatible: PSP_COMPATIBLE.iter().map(|t| (*t).to_string()).collect(),
                keep_compatible: true,
                suffix: task_suffix,
            },
            NodeKind::Project | NodeKind::Component | NodeKind::Document => {
                let mut compatible = vec![read_only.clone()];
                if !self.options.role.is_team_side() {
                    compatible.push(self.task_template());
                }
                NodeSpec {
                    template: read_only,
                    compatible,
                    keep_compatible: false,
                    suffix: "_",
                }
            }
        }
    }

    fn node_name(&self, parent: &HierarchyPath, name: &str, suffix: &str) -> String {
        if !self.process.is_phase(name) {
            return name.to_string();
        }
        if !suffix.is_empty() {
            format!("{name}{suffix}")
        } else if parent == self.project {
            format!("{name} Task")
        } else {
            name.to_string()
        }
    }

    /// Sync one WBS node under `parent`; returns its name when it exists afterwards
    fn sync_node(&mut self, parent: &HierarchyPath, id: NodeId) -> Option<String> {
        let doc = self.doc;
        let node = doc.node(id);
        if node.kind.is_task() && self.options.role.is_team_side() {
            return None;
        }

        let spec = self.spec_for(node.kind);
        let name = self.node_name(parent, &node.name, spec.suffix);
        let path = parent.child(name.clone());
        if !self.ensure_node(&path, node, &spec) {
            return None;
        }

        let quasi = self.view.is_quasi_pruned(id);
        self.sync_data(&path, id, quasi);
        let individual = self.initials().is_some();
        let known: Vec<String> = match node.kind {
            NodeKind::Task if individual && !quasi => self.sync_task(&path, id),
            NodeKind::PspTask if individual && !quasi => self.sync_psp_task(&path, id),
            NodeKind::PspTask => PSP_PHASES.iter().map(|p| (*p).to_string()).collect(),
            _ => Vec::new(),
        };
        self.sync_children(&path, id, &known);
        if quasi {
            self.deferred.push(path);
        }
        Some(name)
    }

    /// Make sure a compatible node for `node` sits at `path`
    fn ensure_node(&mut self, path: &HierarchyPath, node: &WbsNode, spec: &NodeSpec) -> bool {
        if let Some(existing) = self.worker.node(path) {
            let template = existing.template_id.as_deref();
            let live_id = survey::wbs_id_at(&*self.worker, path);
            let in_the_way = !spec.accepts(template)
                || (live_id.is_none() && self.best_candidate(path, &node.id, spec).is_some())
                || live_id
                    .as_deref()
                    .is_some_and(|l| l != node.id && self.doc_ids.contains(l));
            if !in_the_way {
                if template != Some(spec.template.as_str()) && !spec.keep_compatible {
                    self.update_template(path, &spec.template);
                }
                return true;
            }
            self.move_out_of_the_way(path);
        }

        if let Some(from) = self.best_candidate(path, &node.id, spec) {
            let original = self.worker.original_path(&from);
            match self.worker.rename_node(&from, path) {
                Ok(()) => {
                    debug!(%original, to = %path, id = %node.id, "reusing node by WBS ID");
                    let change = if from.parent() == path.parent() {
                        Change::Renamed {
                            from: original,
                            to: path.clone(),
                        }
                    } else {
                        Change::Moved {
                            from: original,
                            to: path.clone(),
                        }
                    };
                    self.changes.push(change);
                    self.deferred.retain(|queued| !from.is_prefix_of(queued));
                    if !spec.keep_compatible
                        && self.worker.template_id(path).as_deref() != Some(spec.template.as_str())
                    {
                        self.update_template(path, &spec.template);
                    }
                    return true;
                }
                Err(e) => {
                    warn!(from = %from, to = %path, error = %e, "could not move node");
                    self.changes.push(Change::CouldNotMove {
                        path: original,
                        reason: e.reason(),
                    });
                }
            }
        }

        match self.worker.add_template(path, &spec.template) {
            Ok(()) => {
                debug!(%path, template = %spec.template, "created node");
                self.changes.push(Change::Created { path: path.clone() });
                if node.kind == NodeKind::PspTask {
                    self.add_psp_phases(path);
                }
                true
            }
            Err(e) => {
                warn!(%path, error = %e, "could not create node");
                self.changes.push(Change::CouldNotCreate {
                    path: path.clone(),
                    reason: e.reason(),
                });
                false
            }
        }
    }

    /// Live node elsewhere in the project carrying `wbs_id`, preferring the
    /// one with the most recorded time
    fn best_candidate(&self, path: &HierarchyPath, wbs_id: &str, spec: &NodeSpec) -> Option<HierarchyPath> {
        if wbs_id.is_empty() {
            return None;
        }
        let worker: &W = &*self.worker;
        let mut best: Option<(HierarchyPath, f64)> = None;
        for candidate in survey::nodes_with_id(worker, self.project, wbs_id) {
            if &candidate == path || candidate == *self.project {
                continue;
            }
            if !spec.accepts(worker.template_id(&candidate).as_deref()) {
                continue;
            }
            let time = survey::total_actual_time(worker, &candidate);
            if best.as_ref().map_or(true, |(_, t)| time > *t) {
                best = Some((candidate, time));
            }
        }
        best.map(|(path, _)| path)
    }

    fn update_template(&mut self, path: &HierarchyPath, template: &str) {
        match self.worker.set_template_id(path, template) {
            Ok(()) => {
                debug!(%path, template, "updated template");
                self.misc = true;
            }
            Err(e) => warn!(%path, error = %e, "could not update template"),
        }
    }

    fn move_out_of_the_way(&mut self, path: &HierarchyPath) {
        let Some(name) = path.name() else {
            return;
        };
        let mut n = 1;
        let target = loop {
            let candidate = if n == 1 {
                path.sibling(format!("{name} (non-WBS)"))
            } else {
                path.sibling(format!("{name} (non-WBS {n})"))
            };
            if !self.worker.exists(&candidate) {
                break candidate;
            }
            n += 1;
        };
        match self.worker.rename_node(path, &target) {
            Ok(()) => {
                debug!(from = %path, to = %target, "moved node out of the way");
                self.misc = true;
                for queued in &mut self.deferred {
                    if let Some(rebased) = queued.rebase(path, &target) {
                        *queued = rebased;
                    }
                }
            }
            Err(e) => {
                warn!(%path, error = %e, "could not move node out of the way");
                self.changes.push(Change::CouldNotMove {
                    path: self.worker.original_path(path),
                    reason: e.reason(),
                });
            }
        }
    }

    fn add_psp_phases(&mut self, path: &HierarchyPath) {
        for phase in PSP_PHASES {
            let phase_path = path.child(phase);
            if let Err(e) = self.worker.add_template(&phase_path, &format!("{PSP_TEMPLATE}/{phase}")) {
                warn!(path = %phase_path, error = %e, "could not create PSP phase");
                self.changes.push(Change::CouldNotCreate {
                    path: phase_path,
                    reason: e.reason(),
                });
            }
        }
    }

    fn sync_children(&mut self, path: &HierarchyPath, id: NodeId, known: &[String]) {
        let doc = self.doc;
        let mut names = Vec::new();
        for child in self.view.kept_children(doc, id) {
            if self.should_stop() {
                return;
            }
            if let Some(name) = self.sync_node(path, child) {
                names.push(name);
            }
        }
        if self.should_stop() {
            return;
        }

        for name in self.worker.child_names(path) {
            if !names.contains(&name) && !known.contains(&name) {
                debug!(parent = %path, child = %name, "live node not in WBS");
                self.deferred.push(path.child(name));
            }
        }

        if names.len() > 1 {
            match self.worker.reorder_nodes(path, &names) {
                Ok(true) => {
                    debug!(%path, "reordered children");
                    self.misc = true;
                }
                Ok(false) => {}
                Err(e) => warn!(%path, error = %e, "could not reorder children"),
            }
        }
    }

    // ---- node data ------------------------------------------------------

    fn set_task_ids(&mut self, path: &HierarchyPath, task_ids: Option<&str>) {
        let ids: Vec<String> = task_ids.map(|t| split_ids(t).map(String::from).collect()).unwrap_or_default();
        let value = (!ids.is_empty()).then(|| Value::List(ids));
        self.worker.put_value(path, TASK_IDS, value);
    }

    fn sync_data(&mut self, path: &HierarchyPath, id: NodeId, quasi: bool) {
        let doc = self.doc;
        let node = doc.node(id);
        self.worker.put_value(path, WBS_ID, Some(Value::from(node.id.as_str())));
        if quasi {
            return;
        }
        self.set_task_ids(path, node.task_ids.as_deref());
        if self.initials().is_some() {
            self.maybe_save_node_size(path, id);
            self.maybe_save_dependencies(path, node);
        }
    }

    fn ratio(&mut self, id: NodeId, units: &str) -> f64 {
        match self.initials() {
            Some(initials) => self.ratios.ratio(id, units, initials),
            None => 1.0,
        }
    }

    fn maybe_save_node_size(&mut self, path: &HierarchyPath, id: NodeId) {
        let doc = self.doc;
        let node = doc.node(id);
        if node.kind == NodeKind::PspTask {
            return;
        }
        let (Some(units), Some(size)) = (node.size.units.as_deref(), node.size.new_changed) else {
            return;
        };
        if units == LOC_UNITS {
            let code_task = node.kind.is_task()
                && node
                    .phase_name
                    .as_deref()
                    .is_some_and(|p| p.eq_ignore_ascii_case("Code"));
            if !code_task {
                return;
            }
        }
        let local_units = self.worker.get_value(path, SIZE_UNITS);
        if local_units
            .as_ref()
            .and_then(Value::as_text)
            .is_some_and(|u| u != units)
        {
            debug!(%path, units, "local size uses other units");
            return;
        }
        let ratio = self.ratio(id, units);
        if ratio <= 0.0 {
            return;
        }
        self.worker.put_value(path, SIZE_UNITS, Some(Value::from(units)));
        self.worker.put_value(path, EST_SIZE, Some(Value::Number(size * ratio)));
    }

    fn maybe_save_dependencies(&mut self, path: &HierarchyPath, node: &WbsNode) {
        let value = (!node.dependencies.is_empty())
            .then(|| Value::List(node.dependencies.iter().map(|d| d.id.clone()).collect()));
        if self.worker.put_value(path, TASK_DEPENDENCIES, value) {
            self.changes.push(Change::DependenciesUpdated { path: path.clone() });
        }
    }

    fn maybe_save_insp_size(&mut self, path: &HierarchyPath, id: NodeId) {
        if !self.options.sync_inspected_sizes {
            return;
        }
        let doc = self.doc;
        let size = &doc.node(id).size;
        let (Some(inspected), Some(units)) = (size.inspected, size.inspected_units.as_deref()) else {
            return;
        };
        let ratio = self.ratio(id, units);
        if ratio <= 0.0 {
            return;
        }
        let name = if units == LOC_UNITS {
            "Inspected New & Changed LOC".to_string()
        } else {
            format!("Inspected {units}")
        };
        self.worker.put_value(path, &name, Some(Value::Number(inspected * ratio)));
    }

    fn maybe_save_psp_sizes(&mut self, path: &HierarchyPath, id: NodeId) {
        let doc = self.doc;
        let size = &doc.node(id).size;
        if size.units.as_deref() != Some(LOC_UNITS) {
            return;
        }
        let values = [
            size.base,
            size.deleted,
            size.modified,
            size.added,
            size.reused,
            size.new_changed,
        ];
        if values.iter().all(Option::is_none) {
            return;
        }
        let has_local = PSP_SIZE_FIELDS
            .iter()
            .any(|(name, _)| !is_false(self.worker.get_value(path, name).as_ref()));
        if has_local {
            return;
        }
        let ratio = self.ratio(id, LOC_UNITS);
        for ((name, scaled), value) in PSP_SIZE_FIELDS.iter().zip(values) {
            let factor = if *scaled { ratio } else { 1.0 };
            self.worker
                .put_value(path, name, Some(Value::Number(value.unwrap_or(0.0) * factor)));
        }
    }

    // ---- tasks ----------------------------------------------------------

    /// Sync task data; returns live child names that belong to the task itself
    fn sync_task(&mut self, path: &HierarchyPath, id: NodeId) -> Vec<String> {
        let doc = self.doc;
        let node = doc.node(id);
        self.maybe_save_insp_size(path, id);

        if !self.view.kept_children(doc, id).is_empty() {
            self.maybe_clear_time_value(path);
            return Vec::new();
        }
        match (self.style, node.phase_name.as_deref()) {
            (TaskStyle::Legacy, Some(phase)) => {
                self.sync_phase_child(path, node, phase);
                vec![phase.to_string()]
            }
            (TaskStyle::Current, Some(_)) => {
                self.maybe_save_time_value(path, path, node, false);
                self.sync_effective_phase(path, node);
                Vec::new()
            }
            // time is only recorded against a phase
            (_, None) => {
                self.sync_effective_phase(path, node);
                Vec::new()
            }
        }
    }

    fn sync_psp_task(&mut self, path: &HierarchyPath, id: NodeId) -> Vec<String> {
        let doc = self.doc;
        self.maybe_save_psp_sizes(path, id);
        self.maybe_save_time_value(path, path, doc.node(id), true);
        PSP_PHASES.iter().map(|p| (*p).to_string()).collect()
    }

    fn sync_phase_child(&mut self, task: &HierarchyPath, node: &WbsNode, phase: &str) {
        let phase_path = task.child(phase);
        let process = self.process;
        let Some(phase_id) = process.phase_id(phase) else {
            self.changes.push(Change::CouldNotCreate {
                path: phase_path,
                reason: "unrecognized process phase".to_string(),
            });
            return;
        };
        match self.worker.template_id(&phase_path) {
            None if !self.worker.exists(&phase_path) => {
                match self.worker.add_template(&phase_path, phase_id) {
                    Ok(()) => {
                        self.changes.push(Change::Created {
                            path: phase_path.clone(),
                        });
                        self.maybe_save_time_value(&phase_path, task, node, false);
                    }
                    Err(e) => {
                        warn!(path = %phase_path, error = %e, "could not create phase");
                        self.changes.push(Change::CouldNotCreate {
                            path: phase_path,
                            reason: e.reason(),
                        });
                    }
                }
            }
            Some(existing) if existing == phase_id => {
                self.maybe_save_time_value(&phase_path, task, node, false);
            }
            _ => {
                self.changes.push(Change::CouldNotCreate {
                    path: phase_path,
                    reason: "existing node is in the way".to_string(),
                });
            }
        }
    }

    /// Write the individual's planned time to `target` and check it against
    /// the plan recorded under `task`
    fn maybe_save_time_value(&mut self, target: &HierarchyPath, task: &HierarchyPath, node: &WbsNode, psp: bool) {
        let Some(initials) = self.initials() else {
            return;
        };
        let Some(hours) = node.time.hours_for(initials) else {
            return;
        };

        let undone = if psp {
            self.worker.mark_psp_task_incomplete(target)
        } else {
            self.worker.mark_leaf_incomplete(target)
        };
        if undone {
            self.changes.push(Change::MarkedIncomplete { path: task.clone() });
        }

        let ok_to_change = if psp {
            is_false(self.worker.get_value(target, PSP_PLANNING_COMPLETED).as_ref())
        } else {
            match self.style {
                TaskStyle::Legacy => true,
                TaskStyle::Current => self.worker.is_leaf(target),
            }
        };
        if ok_to_change {
            if let Some(last) = node.sync_time.hours_for(initials) {
                self.worker
                    .set_last_reverse_synced(Some(Value::Number(last.max(0.0))));
            }
            self.worker
                .put_value(target, ESTIMATED_TIME, Some(Value::Number(hours)));
        }

        let local = survey::total_plan_time(&*self.worker, task);
        if (local - hours).abs() > PLAN_TIME_TOLERANCE {
            debug!(path = %task, wbs = hours, local, "plan time differs from WBS");
            self.discrepancies.push(Discrepancy::PlanTime {
                path: task.clone(),
                wbs_id: Some(node.id.clone()),
                wbs: hours,
                local,
            });
        }
    }

    /// Drop an estimate sync wrote on a task that has since been subdivided
    fn maybe_clear_time_value(&mut self, path: &HierarchyPath) {
        let current = self.worker.get_value(path, ESTIMATED_TIME);
        let companion = sync_name(ESTIMATED_TIME);
        if current.is_some() && current == self.worker.get_value(path, &companion) {
            debug!(%path, "clearing estimate of subdivided task");
            self.worker.put_value_force(path, ESTIMATED_TIME, None);
            self.worker.put_value_force(path, &companion, None);
            self.misc = true;
        }
    }

    fn sync_effective_phase(&mut self, path: &HierarchyPath, node: &WbsNode) {
        let Some(wbs_phase) = node.phase_name.as_deref().or(node.effective_phase.as_deref()) else {
            return;
        };
        if wbs_phase == UNKNOWN_PHASE {
            return;
        }
        let name = self.process.effective_phase_data_name();
        self.worker
            .set_last_reverse_synced(node.sync_phase_name.clone().map(Value::Text));
        self.worker.put_value(path, &name, Some(Value::from(wbs_phase)));

        let local = self.worker.get_value(path, &name);
        if let Some(local) = local.as_ref().and_then(Value::as_text) {
            if !local.is_empty() && !local.starts_with('?') && local != wbs_phase {
                self.discrepancies.push(Discrepancy::NodeType {
                    path: path.clone(),
                    wbs_id: Some(node.id.clone()),
                    wbs_phase: wbs_phase.to_string(),
                    local_phase: local.to_string(),
                });
            }
        }
    }

    // ---- deferred deletions and completions -----------------------------

    fn process_deferred(&mut self) {
        if self.worker.nodes_were_renamed() {
            debug!(queued = self.deferred.len(), "nodes moved; postponing deletions");
            self.follow_on = true;
            self.deferred.clear();
            return;
        }
        let mut queue = std::mem::take(&mut self.deferred);
        queue.sort();
        queue.dedup();
        let mut handled: Vec<HierarchyPath> = Vec::new();
        for path in queue {
            if handled.iter().any(|done| done.is_prefix_of(&path)) {
                continue;
            }
            handled.push(path.clone());
            if self.worker.exists(&path) {
                self.complete_or_delete(&path);
            }
        }
    }

    fn delete(&mut self, path: &HierarchyPath) {
        match self.worker.delete_node(path) {
            Ok(true) => debug!(%path, "deleted node"),
            Ok(false) => debug!(%path, "deletion not permitted"),
            Err(e) => {
                warn!(%path, error = %e, "could not delete node");
                self.changes.push(Change::CouldNotDelete {
                    path: self.worker.original_path(path),
                    reason: e.reason(),
                });
            }
        }
    }

    fn complete_or_delete(&mut self, path: &HierarchyPath) {
        if self.options.role.is_team_side() {
            self.delete(path);
            return;
        }
        if is_user_created(&*self.worker, self.process, self.style, path) {
            return;
        }
        let original = self.worker.original_path(path);
        if self.deletable.contains(&original) {
            self.delete(path);
        } else if self.worker.is_leaf(path) {
            self.worker.mark_leaf_complete(path);
        } else {
            self.worker.put_value(path, TASK_IDS, None);
            if survey::is_psp_template(self.worker.template_id(path).as_deref()) {
                self.worker.mark_psp_task_complete(path);
            } else {
                for child in self.worker.child_names(path) {
                    self.complete_or_delete(&path.child(child));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_style_follows_root_template() {
        assert_eq!(TaskStyle::for_root(Some("TSP/Indiv2Root")), TaskStyle::Current);
        assert_eq!(TaskStyle::for_root(Some("TSP/IndivRoot")), TaskStyle::Legacy);
        assert_eq!(TaskStyle::for_root(None), TaskStyle::Legacy);
    }

    #[test]
    fn specs_accept_compatible_templates() {
        let spec = NodeSpec {
            template: PSP_TEMPLATE.into(),
            compatible: PSP_COMPATIBLE.iter().map(|t| (*t).to_string()).collect(),
            keep_compatible: true,
            suffix: "",
        };
        assert!(spec.accepts(Some("PSP1.1")));
        assert!(spec.accepts(Some("PSP2.1")));
        assert!(!spec.accepts(Some("TSP/Indiv2Task")));
        assert!(!spec.accepts(None));
    }

    #[test]
    fn ids_split_on_commas() {
        assert_eq!(split_ids(" a:1, ,b:2,").collect::<Vec<_>>(), ["a:1", "b:2"]);
    }
}
