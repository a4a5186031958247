//! Task registry - the canonical task store.
//!
//! The registry owns every task record, validates submissions and enforces
//! the lifecycle state machine. It never schedules anything itself; the
//! scheduler drives it through `update_status`.

use std::collections::HashMap;

use goalkit_core::{AutomationError, Task, TaskDefinition, TaskId, TaskStatus, Time};

use crate::dependency::DependencyResolver;

/// In-memory store of all tasks known to one engine instance.
///
/// Ids are ULIDs, so they are unique for the registry's lifetime and never
/// reused after removal.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<TaskId, Task>,
    next_sequence: u64,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a definition and store it as a Pending task.
    ///
    /// Submission is atomic: a failed submit leaves the registry untouched.
    pub fn submit(
        &mut self,
        definition: TaskDefinition,
        now: Time,
    ) -> Result<TaskId, AutomationError> {
        if definition.name.trim().is_empty() {
            return Err(AutomationError::Validation("task name is empty".into()));
        }
        if definition.command.trim().is_empty() {
            return Err(AutomationError::Validation(format!(
                "task '{}' has an empty command",
                definition.name
            )));
        }
        if definition.estimated_duration.is_zero() {
            return Err(AutomationError::Validation(format!(
                "task '{}' has a zero duration estimate",
                definition.name
            )));
        }
        for (kind, amount) in definition.resource_requirements.iter() {
            if !amount.is_finite() || amount < 0.0 {
                return Err(AutomationError::Validation(format!(
                    "task '{}' requires an invalid amount of {kind}: {amount}",
                    definition.name
                )));
            }
        }
        for dep in &definition.dependencies {
            if !self.tasks.contains_key(dep) {
                return Err(AutomationError::UnknownDependency(*dep));
            }
        }

        // A fresh id cannot already appear in the graph, so submission cannot
        // close a cycle; cycles are guarded in add_dependency instead.
        let id = TaskId::new();
        let mut dependencies = definition.dependencies;
        dependencies.sort();
        dependencies.dedup();

        let task = Task {
            id,
            name: definition.name,
            description: definition.description,
            command: definition.command,
            priority: definition.priority,
            status: TaskStatus::Pending,
            dependencies,
            estimated_duration: definition.estimated_duration,
            resource_requirements: definition.resource_requirements,
            sequence: self.next_sequence,
            created_at: now,
            started_at: None,
            completed_at: None,
            failure: None,
        };
        self.next_sequence += 1;
        self.tasks.insert(id, task);
        Ok(id)
    }

    /// Look up a task by id.
    pub fn get(&self, id: TaskId) -> Result<&Task, AutomationError> {
        self.tasks.get(&id).ok_or(AutomationError::NotFound(id))
    }

    /// Look up a task and clone it out.
    pub fn get_cloned(&self, id: TaskId) -> Result<Task, AutomationError> {
        self.get(id).cloned()
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Result<&mut Task, AutomationError> {
        self.tasks.get_mut(&id).ok_or(AutomationError::NotFound(id))
    }

    /// Whether a task with this id exists.
    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Apply a lifecycle transition, stamping `started_at` / `completed_at`
    /// on the way through.
    pub fn update_status(
        &mut self,
        id: TaskId,
        new_status: TaskStatus,
        now: Time,
    ) -> Result<(), AutomationError> {
        let task = self.get_mut(id)?;
        if !task.status.can_transition(new_status) {
            return Err(AutomationError::InvalidTransition {
                from: task.status,
                to: new_status,
            });
        }
        task.status = new_status;
        match new_status {
            TaskStatus::Running => task.started_at = Some(now),
            TaskStatus::Completed | TaskStatus::Failed => task.completed_at = Some(now),
            _ => {}
        }
        Ok(())
    }

    /// Add a dependency edge `task -> depends_on` after submission.
    ///
    /// Edges may only be added while the dependent is still Pending, and an
    /// edge that would make a task reachable from itself is rejected.
    pub fn add_dependency(
        &mut self,
        task: TaskId,
        depends_on: TaskId,
    ) -> Result<(), AutomationError> {
        let status = self.get(task)?.status;
        if status != TaskStatus::Pending {
            return Err(AutomationError::Validation(format!(
                "dependencies may only be added to pending tasks, task is {status}"
            )));
        }
        if !self.contains(depends_on) {
            return Err(AutomationError::UnknownDependency(depends_on));
        }
        if task == depends_on {
            return Err(AutomationError::CyclicDependency(vec![task, task]));
        }
        if let Some(path) = DependencyResolver.would_cycle(task, depends_on, self) {
            return Err(AutomationError::CyclicDependency(path));
        }

        let entry = self.get_mut(task)?;
        if !entry.dependencies.contains(&depends_on) {
            entry.dependencies.push(depends_on);
        }
        Ok(())
    }

    /// Snapshot every task, cloned, in submission order.
    pub fn list(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.values().cloned().collect();
        tasks.sort_by_key(|t| t.sequence);
        tasks
    }

    /// Remove a task. Only terminal tasks may be removed; the id is never
    /// reused afterwards.
    pub fn remove(&mut self, id: TaskId) -> Result<Task, AutomationError> {
        let status = self.get(id)?.status;
        if !status.is_terminal() {
            return Err(AutomationError::Validation(format!(
                "only terminal tasks can be removed, task is {status}"
            )));
        }
        self.tasks
            .remove(&id)
            .ok_or(AutomationError::NotFound(id))
    }

    /// Number of tasks currently stored.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// True when no tasks are stored.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
