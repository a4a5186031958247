//! Plan submission - resolving symbolic names to task ids.
//!
//! Plans address tasks by name; the registry addresses them by id. This
//! module checks a plan (unique names, resolvable `depends_on`, no name
//! cycles) and submits it in dependency order so every dependency already
//! has an id when its dependent goes in.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use goalkit_core::{AutomationError, TaskDefinition, TaskId, TaskPlan};
use tracing::debug;

use crate::scheduler::AutomationEngine;

/// A structural problem in a plan file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanProblem {
    /// Two tasks share a name
    #[error("duplicate task name '{0}'")]
    DuplicateName(String),

    /// A depends_on entry names no task in the plan
    #[error("task '{task}' depends on unknown task '{depends_on}'")]
    UnknownDependency {
        /// The dependent task's name
        task: String,
        /// The missing name
        depends_on: String,
    },

    /// The depends_on edges form a cycle
    #[error("dependency cycle through {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    /// A task has an empty command
    #[error("task '{0}' has an empty command")]
    EmptyCommand(String),

    /// The plan contains no tasks
    #[error("plan contains no tasks")]
    Empty,
}

/// Check a plan without touching any engine. Returns every problem found.
pub fn check_plan(plan: &TaskPlan) -> Vec<PlanProblem> {
    let mut problems = Vec::new();

    if plan.tasks.is_empty() {
        problems.push(PlanProblem::Empty);
        return problems;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for task in &plan.tasks {
        if !seen.insert(task.name.as_str()) {
            problems.push(PlanProblem::DuplicateName(task.name.clone()));
        }
        if task.command.trim().is_empty() {
            problems.push(PlanProblem::EmptyCommand(task.name.clone()));
        }
    }

    for task in &plan.tasks {
        for dep in &task.depends_on {
            if !seen.contains(dep.as_str()) {
                problems.push(PlanProblem::UnknownDependency {
                    task: task.name.clone(),
                    depends_on: dep.clone(),
                });
            }
        }
    }

    // Only look for cycles on a structurally sound graph
    if problems.is_empty() {
        if let Err(cycle) = topo_order(plan) {
            problems.push(PlanProblem::Cycle(cycle));
        }
    }

    problems
}

/// Submit every task of a checked plan, in dependency order.
///
/// Returns the name -> id mapping. The plan is checked up front and
/// rejected wholesale on structural problems; an engine-level rejection of
/// one task (unknown pool resource, say) aborts the rest of the plan but
/// leaves already submitted tasks in place.
pub async fn submit_plan(
    engine: &AutomationEngine,
    plan: &TaskPlan,
) -> Result<BTreeMap<String, TaskId>, AutomationError> {
    let problems = check_plan(plan);
    if !problems.is_empty() {
        let detail = problems
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AutomationError::Validation(detail));
    }

    let order = topo_order(plan).map_err(|cycle| {
        AutomationError::Validation(
            PlanProblem::Cycle(cycle).to_string(),
        )
    })?;

    let mut ids: BTreeMap<String, TaskId> = BTreeMap::new();
    for index in order {
        let planned = &plan.tasks[index];
        let dependencies = planned
            .depends_on
            .iter()
            .filter_map(|name| ids.get(name).copied())
            .collect();
        let definition = TaskDefinition {
            name: planned.name.clone(),
            description: planned.description.clone(),
            command: planned.command.clone(),
            priority: planned.priority,
            dependencies,
            estimated_duration: Duration::from_secs(planned.estimated_secs),
            resource_requirements: planned.resources.clone(),
        };
        let id = engine.submit(definition).await?;
        ids.insert(planned.name.clone(), id);
    }
    debug!(tasks = ids.len(), "plan submitted");
    Ok(ids)
}

/// Kahn's algorithm over task names. Returns indices into `plan.tasks` in
/// an order where every dependency precedes its dependents, or the names
/// left over when the edges contain a cycle.
fn topo_order(plan: &TaskPlan) -> Result<Vec<usize>, Vec<String>> {
    let index_of: HashMap<&str, usize> = plan
        .tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.name.as_str(), i))
        .collect();

    let mut in_degree = vec![0usize; plan.tasks.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); plan.tasks.len()];
    for (i, task) in plan.tasks.iter().enumerate() {
        for dep in &task.depends_on {
            if let Some(&d) = index_of.get(dep.as_str()) {
                in_degree[i] += 1;
                dependents[d].push(i);
            }
        }
    }

    // Seed with tasks that have no dependencies, in author order
    let mut queue: Vec<usize> = (0..plan.tasks.len())
        .filter(|&i| in_degree[i] == 0)
        .collect();
    let mut order = Vec::with_capacity(plan.tasks.len());
    let mut cursor = 0;
    while cursor < queue.len() {
        let i = queue[cursor];
        cursor += 1;
        order.push(i);
        for &dependent in &dependents[i] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push(dependent);
            }
        }
    }

    if order.len() == plan.tasks.len() {
        Ok(order)
    } else {
        let stuck: Vec<String> = plan
            .tasks
            .iter()
            .enumerate()
            .filter(|(i, _)| !order.contains(i))
            .map(|(_, t)| t.name.clone())
            .collect();
        Err(stuck)
    }
}
