//! Error type shared by the automation engine.

use crate::id::TaskId;
use crate::task::TaskStatus;

/// Errors surfaced by task submission, transitions and resource accounting.
#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    /// Malformed task definition
    #[error("validation failed: {0}")]
    Validation(String),

    /// A dependency id does not exist in the registry
    #[error("unknown dependency: {0}")]
    UnknownDependency(TaskId),

    /// The dependency edge would make a task a prerequisite of itself
    #[error("cyclic dependency: {}", format_path(.0))]
    CyclicDependency(Vec<TaskId>),

    /// Illegal lifecycle transition
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status
        from: TaskStatus,
        /// Requested status
        to: TaskStatus,
    },

    /// Resource release without a matching reservation (clamped, non-fatal)
    #[error("resource inconsistency: {0}")]
    ResourceInconsistency(String),

    /// Unknown task id
    #[error("task not found: {0}")]
    NotFound(TaskId),
}

fn format_path(path: &[TaskId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
