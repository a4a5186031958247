//! Task model - the unit of work driven by the automation engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::id::TaskId;
use crate::resource::ResourceRequirements;
use crate::Time;

/// A task tracked by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Display name
    pub name: String,

    /// Detailed description
    pub description: String,

    /// Opaque instruction handed to a command executor
    pub command: String,

    /// Scheduling priority
    pub priority: TaskPriority,

    /// Current lifecycle status
    pub status: TaskStatus,

    /// Tasks that must complete before this one becomes ready
    pub dependencies: Vec<TaskId>,

    /// Duration estimate, used for analytics only
    pub estimated_duration: Duration,

    /// Resources this task reserves while running
    pub resource_requirements: ResourceRequirements,

    /// Registry-assigned submission order, the creation-order tie-break
    pub sequence: u64,

    /// Creation timestamp
    pub created_at: Time,

    /// When the task entered Running
    pub started_at: Option<Time>,

    /// When the task entered Completed or Failed
    pub completed_at: Option<Time>,

    /// Failure detail reported by the executor
    pub failure: Option<String>,
}

/// Scheduling priority. Higher values are scheduled first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Background work
    Low,
    /// Everyday work
    #[default]
    Normal,
    /// Expedited work
    High,
    /// Jump the queue
    Critical,
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskPriority::Low => "low",
            TaskPriority::Normal => "normal",
            TaskPriority::High => "high",
            TaskPriority::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// Task lifecycle status.
///
/// ```text
/// Pending -> Ready -> Running -> {Completed | Failed}
/// Pending/Ready -> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Submitted, dependencies not yet satisfied
    Pending,
    /// Dependencies satisfied, waiting for resource admission
    Ready,
    /// Admitted and handed to an executor
    Running,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// Cancelled before it started running
    Cancelled,
}

impl TaskStatus {
    /// True for states a task can never leave.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Whether the lifecycle state machine allows `self -> to`.
    ///
    /// Running never transitions to Cancelled: a running task must finish
    /// or fail, cancellation of running work is the executor's concern.
    pub fn can_transition(self, to: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, to),
            (Pending, Ready)
                | (Ready, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Pending, Cancelled)
                | (Ready, Cancelled)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Ready => "ready",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// The submission shape of a task, built up with `with_*` methods and
/// turned into a [`Task`] by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Display name (must be non-empty)
    pub name: String,

    /// Detailed description
    pub description: String,

    /// Opaque instruction for the executor (must be non-empty)
    pub command: String,

    /// Scheduling priority
    pub priority: TaskPriority,

    /// Ids of prerequisite tasks
    pub dependencies: Vec<TaskId>,

    /// Duration estimate (must be positive)
    pub estimated_duration: Duration,

    /// Resources to reserve while running
    pub resource_requirements: ResourceRequirements,
}

impl TaskDefinition {
    /// Create a definition with the given name and command and defaults
    /// everywhere else (normal priority, one minute estimate, no
    /// dependencies, no resource requirements).
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            command: command.into(),
            priority: TaskPriority::Normal,
            dependencies: Vec::new(),
            estimated_duration: Duration::from_secs(60),
            resource_requirements: ResourceRequirements::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Replace the dependency list.
    pub fn with_dependencies(mut self, dependencies: Vec<TaskId>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Add a single dependency.
    pub fn with_dependency(mut self, dependency: TaskId) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Set the duration estimate.
    pub fn with_estimated_duration(mut self, duration: Duration) -> Self {
        self.estimated_duration = duration;
        self
    }

    /// Add a resource requirement.
    pub fn with_requirement(mut self, kind: crate::ResourceKind, amount: f64) -> Self {
        self.resource_requirements.set(kind, amount);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(TaskPriority::Critical > TaskPriority::High);
        assert!(TaskPriority::High > TaskPriority::Normal);
        assert!(TaskPriority::Normal > TaskPriority::Low);
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        use TaskStatus::*;
        for from in [Completed, Failed, Cancelled] {
            for to in [Pending, Ready, Running, Completed, Failed, Cancelled] {
                assert!(!from.can_transition(to), "{from} -> {to} must be illegal");
            }
        }
    }

    #[test]
    fn test_running_cannot_be_cancelled() {
        assert!(!TaskStatus::Running.can_transition(TaskStatus::Cancelled));
        assert!(TaskStatus::Pending.can_transition(TaskStatus::Cancelled));
        assert!(TaskStatus::Ready.can_transition(TaskStatus::Cancelled));
    }

    #[test]
    fn test_happy_path_transitions() {
        use TaskStatus::*;
        assert!(Pending.can_transition(Ready));
        assert!(Ready.can_transition(Running));
        assert!(Running.can_transition(Completed));
        assert!(Running.can_transition(Failed));
        assert!(!Pending.can_transition(Running));
        assert!(!Ready.can_transition(Completed));
    }
}
