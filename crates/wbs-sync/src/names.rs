//! Data names and template suffixes the synchronizer reads and writes

/// WBS identifier of a synchronized node
pub const WBS_ID: &str = "WBS_Unique_ID";

/// Externally visible task-list IDs
pub const TASK_IDS: &str = "EV_Task_IDs";

/// Dependencies copied from the WBS
pub const TASK_DEPENDENCIES: &str = "EV_Task_Dependencies";

/// Label list recorded at the project root
pub const LABEL_LIST: &str = "Synchronized_Task_Labels";

/// Task IDs in WBS order, recorded at the project root
pub const NODE_ORDER: &str = "Synchronized_Task_ID_WBS_Order";

/// Set on template nodes the process instantiates
pub const PROCESS_ID: &str = "Process_ID";

/// Defect counts that keep a node from being deleted
pub const DEFECT_COUNTS: [&str; 2] = ["Defects Injected", "Defects Removed"];

/// Estimated size of a sized object
pub const EST_SIZE: &str = "Sized_Objects/0/Estimated Size";

/// Units of [`EST_SIZE`]
pub const SIZE_UNITS: &str = "Sized_Objects/0/Sized_Object_Units";

/// PSP size names for base, deleted, modified, added, reused and new & changed
/// size, with whether the individual's time ratio applies
pub const PSP_SIZE_FIELDS: [(&str, bool); 6] = [
    ("Estimated Base LOC", false),
    ("Estimated Deleted LOC", true),
    ("Estimated Modified LOC", true),
    ("New Objects/0/LOC", true),
    ("Reused Objects/0/LOC", false),
    ("Estimated New & Changed LOC", true),
];

/// Completion date of the first PSP phase
pub const PSP_PLANNING_COMPLETED: &str = "Planning/Completed";

/// Template of a newly created PSP task
pub const PSP_TEMPLATE: &str = "PSP2.1";

/// Older PSP templates accepted in place of [`PSP_TEMPLATE`]
pub const PSP_COMPATIBLE: [&str; 4] = ["PSP0.1", "PSP1", "PSP1.1", "PSP2"];

/// Individual schedule values at the project root
pub const SCHEDULE_HOURS: &str = "Schedule/Hours_Per_Week";
pub const SCHEDULE_START: &str = "Schedule/Start_Date";
pub const SCHEDULE_END_WEEK: &str = "Schedule/End_Week";
pub const SCHEDULE_EXCEPTIONS: &str = "Schedule/Exceptions";

/// Dump version that introduced team member schedules
pub const SCHEDULE_DUMP_VERSION: &str = "3.1.0";

/// Effective phase value that means "not known"
pub const UNKNOWN_PHASE: &str = "Unknown";

/// Project root template suffixes, in lookup order
pub const MASTER_ROOT: &str = "MasterRoot";
pub const TEAM_ROOT: &str = "TeamRoot";
pub const INDIV_ROOT: &str = "IndivRoot";
pub const INDIV2_ROOT: &str = "Indiv2Root";

/// Size units of source code
pub const LOC_UNITS: &str = "LOC";
