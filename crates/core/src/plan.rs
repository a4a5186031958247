//! Plan files - name-addressed batches of task definitions.
//!
//! A plan is what a user writes by hand: tasks are addressed by symbolic
//! name and dependencies refer to those names. The automation crate resolves
//! names to task ids when the plan is submitted.

use serde::{Deserialize, Serialize};

use crate::resource::ResourceRequirements;
use crate::task::TaskPriority;

/// A plan file: an ordered list of named tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPlan {
    /// Optional plan name, used in reports
    #[serde(default)]
    pub name: Option<String>,

    /// The tasks, in author order
    pub tasks: Vec<PlannedTask>,
}

/// One task in a plan, addressed by a unique symbolic name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedTask {
    /// Unique symbolic name within the plan
    pub name: String,

    /// Detailed description
    #[serde(default)]
    pub description: String,

    /// Command handed to the executor
    pub command: String,

    /// Scheduling priority
    #[serde(default)]
    pub priority: TaskPriority,

    /// Names of prerequisite tasks within this plan
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Duration estimate in seconds
    #[serde(default = "default_estimated_secs")]
    pub estimated_secs: u64,

    /// Resources to reserve while running
    #[serde(default)]
    pub resources: ResourceRequirements,
}

fn default_estimated_secs() -> u64 {
    60
}
