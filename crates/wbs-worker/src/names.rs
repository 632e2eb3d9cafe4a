//! Data names written by workers and synchronizers

/// Suffix of the companion value remembering what sync last wrote
pub const LAST_SYNCED_SUFFIX: &str = "_Last_Synced_Val";

/// Completion date of a task
pub const COMPLETED: &str = "Completed";

/// Planned time
pub const ESTIMATED_TIME: &str = "Estimated Time";

/// Recorded actual time
pub const ACTUAL_TIME: &str = "Time";

/// Phases of a PSP2.1 task, in order
pub const PSP_PHASES: [&str; 8] = [
    "Planning",
    "Design",
    "Design Review",
    "Code",
    "Code Review",
    "Compile",
    "Test",
    "Postmortem",
];

/// Name of the last-synced companion of `name`
#[must_use]
pub fn sync_name(name: &str) -> String {
    format!("{name}{LAST_SYNCED_SUFFIX}")
}
