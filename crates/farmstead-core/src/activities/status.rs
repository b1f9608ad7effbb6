//! Per-step activity outcome states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one activity for one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityStatus {
    /// All resources obtained and the task ran
    Success,
    /// Ran with less than it asked for
    Partial,
    /// Disabled, not due, or skipped for lack of resources
    Ignored,
    /// Stopped the run for lack of resources
    Critical,
    /// A timer that was due this step
    Timer,
    /// Performed a calculation only
    Calculation,
    /// Had resources but found no work to do
    NotNeeded,
    /// Ran, but its task reported a problem
    Warning,
    /// A folder with nothing of its own to do
    NoTask,
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What an activity's own task reports after running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskOutcome {
    #[default]
    Done,
    NotNeeded,
    Warning,
    Calculation,
}

/// Fold a task's outcome into the status left by the allocation pipeline.
pub fn apply_outcome(status: ActivityStatus, outcome: TaskOutcome) -> ActivityStatus {
    match outcome {
        TaskOutcome::Done => status,
        TaskOutcome::NotNeeded => match status {
            ActivityStatus::Success | ActivityStatus::Partial => ActivityStatus::NotNeeded,
            other => other,
        },
        TaskOutcome::Warning => ActivityStatus::Warning,
        TaskOutcome::Calculation => ActivityStatus::Calculation,
    }
}

/// Mark real work as done, upgrading `NotNeeded` (or unset) to `Success`.
pub fn set_status_success(status: &mut Option<ActivityStatus>) {
    if matches!(status, None | Some(ActivityStatus::NotNeeded)) {
        *status = Some(ActivityStatus::Success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_keeps_pipeline_status() {
        assert_eq!(
            apply_outcome(ActivityStatus::Partial, TaskOutcome::Done),
            ActivityStatus::Partial
        );
    }

    #[test]
    fn test_not_needed_overrides_success_only() {
        assert_eq!(
            apply_outcome(ActivityStatus::Success, TaskOutcome::NotNeeded),
            ActivityStatus::NotNeeded
        );
        assert_eq!(
            apply_outcome(ActivityStatus::Ignored, TaskOutcome::NotNeeded),
            ActivityStatus::Ignored
        );
    }

    #[test]
    fn test_set_status_success() {
        let mut s = Some(ActivityStatus::NotNeeded);
        set_status_success(&mut s);
        assert_eq!(s, Some(ActivityStatus::Success));

        let mut s = Some(ActivityStatus::Partial);
        set_status_success(&mut s);
        assert_eq!(s, Some(ActivityStatus::Partial));
    }
}
