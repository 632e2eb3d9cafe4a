//! Individual schedule merge
//!
//! The team plan gives each member hours per week, a start date, an end week
//! and per-week exceptions. Those are copied to the individual's project root.
//! Exceptions the individual edited locally since the last sync are kept and
//! reported as a [`Discrepancy::Schedule`].

use std::collections::BTreeMap;

use tracing::debug;
use wbs_hierarchy::Value;
use wbs_model::{HierarchyPath, TeamMember};
use wbs_worker::names::sync_name;
use wbs_worker::SyncWorker;

use crate::discrepancy::Discrepancy;
use crate::names::{SCHEDULE_END_WEEK, SCHEDULE_EXCEPTIONS, SCHEDULE_HOURS, SCHEDULE_START};

/// Week → hours
pub(crate) type Exceptions = BTreeMap<i32, f64>;

/// Encode exceptions as `week=hours` list entries
pub(crate) fn encode_exceptions(exceptions: &Exceptions) -> Value {
    Value::List(exceptions.iter().map(|(w, h)| format!("{w}={h}")).collect())
}

/// Decode a stored exception list; malformed entries are skipped
pub(crate) fn decode_exceptions(value: Option<&Value>) -> Option<Exceptions> {
    let items = value?.as_list()?;
    Some(
        items
            .iter()
            .filter_map(|item| {
                let (week, hours) = item.split_once('=')?;
                Some((week.trim().parse().ok()?, hours.trim().parse().ok()?))
            })
            .collect(),
    )
}

/// Result of merging one member's schedule
#[derive(Debug, Default)]
pub(crate) struct ScheduleMerge {
    pub(crate) changed: bool,
    pub(crate) discrepancy: Option<Discrepancy>,
}

/// Copy `member`'s schedule to `root`, keeping local exception edits
pub(crate) fn sync_schedule<W: SyncWorker + ?Sized>(
    worker: &mut W,
    root: &HierarchyPath,
    member: &TeamMember,
) -> ScheduleMerge {
    let mut merge = ScheduleMerge::default();
    if member.hours_per_week.is_none() && member.start_date.is_none() {
        return merge;
    }

    if let Some(hours) = member.hours_per_week {
        merge.changed |= worker.put_value(root, SCHEDULE_HOURS, Some(Value::Number(hours)));
    }
    if let Some(start) = &member.start_date {
        merge.changed |= worker.put_value(root, SCHEDULE_START, Some(Value::from(start.as_str())));
    }
    let end_week = member.end_week.map(|w| Value::Number(f64::from(w)));
    merge.changed |= worker.put_value(root, SCHEDULE_END_WEEK, end_week);

    let companion = sync_name(SCHEDULE_EXCEPTIONS);
    let current = decode_exceptions(worker.get_value(root, SCHEDULE_EXCEPTIONS).as_ref());
    let last_synced = decode_exceptions(worker.get_value(root, &companion).as_ref());

    let mut edits: BTreeMap<i32, Option<f64>> = BTreeMap::new();
    if let (Some(current), Some(last_synced)) = (&current, &last_synced) {
        let in_range = |week: i32| week >= 0 && member.end_week.map_or(true, |end| week < end);
        for (week, hours) in current {
            if last_synced.get(week) != Some(hours) && in_range(*week) {
                edits.insert(*week, Some(*hours));
            }
        }
        for week in last_synced.keys() {
            if !current.contains_key(week) && in_range(*week) {
                edits.insert(*week, None);
            }
        }
    }

    let mut merged = member.exceptions.clone();
    for (week, edit) in &edits {
        match edit {
            Some(hours) => merged.insert(*week, *hours),
            None => merged.remove(week),
        };
    }

    if current.as_ref() != Some(&merged) && !(current.is_none() && merged.is_empty()) {
        debug!(%root, weeks = merged.len(), "updating schedule exceptions");
        worker.put_value_force(root, SCHEDULE_EXCEPTIONS, Some(encode_exceptions(&merged)));
        merge.changed = true;
    }
    worker.put_value_force(root, &companion, Some(encode_exceptions(&member.exceptions)));

    if !edits.is_empty() {
        merge.discrepancy = Some(Discrepancy::Schedule { edits });
    }
    merge
}

#[cfg(test)]
mod tests {
    use super::*;
    use wbs_hierarchy::MemoryStore;
    use wbs_worker::{LiveWorker, Permissions};

    fn member(exceptions: &[(i32, f64)]) -> TeamMember {
        TeamMember {
            initials: "ab".into(),
            name: "Alice Brown".into(),
            hours_per_week: Some(10.0),
            start_date: Some("2024-01-08".into()),
            end_week: Some(20),
            exceptions: exceptions.iter().copied().collect(),
        }
    }

    #[test]
    fn first_sync_copies_everything() {
        let store = MemoryStore::new();
        let root: HierarchyPath = "/Proj".parse().unwrap();
        let mut worker = LiveWorker::new(&store, Permissions::all(), Permissions::all());
        let merge = sync_schedule(&mut worker, &root, &member(&[(2, 0.0)]));
        assert!(merge.changed);
        assert!(merge.discrepancy.is_none());
        assert_eq!(
            decode_exceptions(worker.get_value(&root, SCHEDULE_EXCEPTIONS).as_ref()),
            Some(Exceptions::from([(2, 0.0)]))
        );

        let again = sync_schedule(&mut worker, &root, &member(&[(2, 0.0)]));
        assert!(!again.changed);
    }

    #[test]
    fn local_edits_survive_and_are_reported() {
        let store = MemoryStore::new();
        let root: HierarchyPath = "/Proj".parse().unwrap();
        let mut worker = LiveWorker::new(&store, Permissions::all(), Permissions::all());
        sync_schedule(&mut worker, &root, &member(&[(2, 0.0)]));

        // the individual takes week 5 off and drops the week 2 exception
        worker.put_value_force(&root, SCHEDULE_EXCEPTIONS, Some(encode_exceptions(&Exceptions::from([(5, 0.0)]))));

        let merge = sync_schedule(&mut worker, &root, &member(&[(2, 0.0), (9, 4.0)]));
        assert!(merge.changed);
        assert_eq!(
            decode_exceptions(worker.get_value(&root, SCHEDULE_EXCEPTIONS).as_ref()),
            Some(Exceptions::from([(5, 0.0), (9, 4.0)]))
        );
        assert_eq!(
            merge.discrepancy,
            Some(Discrepancy::Schedule {
                edits: BTreeMap::from([(2, None), (5, Some(0.0))]),
            })
        );
    }
}
