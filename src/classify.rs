use chrono::NaiveDate;

use crate::models::Task;

/// Scores strictly below this are behind.
pub const BEHIND_BELOW: i32 = 5;
/// Scores at or above this (and below `COMPLETED_SCORE`) are on track.
pub const ON_TRACK_FROM: i32 = 7;
/// A status score of exactly this value marks the task complete.
pub const COMPLETED_SCORE: i32 = 10;
/// A task not yet on track and due in fewer than this many days is at risk.
pub const AT_RISK_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFlags {
    pub completed: bool,
    pub on_track: bool,
    pub behind: bool,
    pub at_risk: bool,
}

/// Classifies one scored task against the policy thresholds above.
///
/// Returns `None` for unscored tasks, which belong to no bucket. `behind`
/// and `at_risk` are independent flags and can both be set for the same
/// task; the tally counts them separately. A score in
/// [`BEHIND_BELOW`, `ON_TRACK_FROM`) with no near due date sets no flag at
/// all: in progress, not otherwise flagged.
pub fn classify_task(task: &Task, today: NaiveDate) -> Option<TaskFlags> {
    let score = task.status_score?;
    let mut flags = TaskFlags::default();

    if score == COMPLETED_SCORE {
        flags.completed = true;
    } else if score >= ON_TRACK_FROM {
        flags.on_track = true;
    }

    if score < BEHIND_BELOW {
        flags.behind = true;
    }

    if score < ON_TRACK_FROM {
        if let Some(due) = task.due_date {
            let days_until_due = (due - today).num_days();
            if days_until_due < AT_RISK_WINDOW_DAYS {
                flags.at_risk = true;
            }
        }
    }

    Some(flags)
}
