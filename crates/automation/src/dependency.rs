//! Dependency resolution for tasks.
//!
//! The dependency graph is directed: a task's dependency set points at its
//! prerequisites. Readiness means every prerequisite is Completed; a
//! prerequisite that is Failed, Cancelled or missing blocks the dependent
//! forever, which is reported rather than silently swallowed.

use std::collections::HashSet;

use goalkit_core::{Task, TaskId, TaskStatus};

use crate::registry::TaskRegistry;

/// Resolves task readiness, blockage and would-be cycles.
#[derive(Debug, Default, Clone, Copy)]
pub struct DependencyResolver;

impl DependencyResolver {
    /// Create a new resolver.
    pub fn new() -> Self {
        Self
    }

    /// True iff every dependency of `task` is Completed.
    ///
    /// A missing dependency (removed after completion, say) is not
    /// Completed, so the task never becomes ready through this path.
    pub fn is_ready(&self, task: &Task, registry: &TaskRegistry) -> bool {
        task.dependencies.iter().all(|dep| {
            registry
                .get(*dep)
                .map(|d| d.status == TaskStatus::Completed)
                .unwrap_or(false)
        })
    }

    /// Dependencies of `task` that can never complete: Failed, Cancelled or
    /// missing from the registry. Non-empty means the task is blocked.
    pub fn blocking(&self, task: &Task, registry: &TaskRegistry) -> Vec<TaskId> {
        task.dependencies
            .iter()
            .filter(|dep| match registry.get(**dep) {
                Ok(d) => matches!(d.status, TaskStatus::Failed | TaskStatus::Cancelled),
                Err(_) => true,
            })
            .copied()
            .collect()
    }

    /// Check whether adding the edge `dependent -> new_dep` would make
    /// `dependent` a prerequisite of itself. Returns the offending path
    /// (starting and ending with `dependent`) when it would.
    ///
    /// Iterative DFS with a visited set, so it terminates on any graph shape.
    pub fn would_cycle(
        &self,
        dependent: TaskId,
        new_dep: TaskId,
        registry: &TaskRegistry,
    ) -> Option<Vec<TaskId>> {
        let mut visited: HashSet<TaskId> = HashSet::new();
        let mut stack: Vec<(TaskId, Vec<TaskId>)> = vec![(new_dep, vec![dependent, new_dep])];

        while let Some((current, path)) = stack.pop() {
            if current == dependent {
                return Some(path);
            }
            if !visited.insert(current) {
                continue;
            }
            if let Ok(task) = registry.get(current) {
                for dep in &task.dependencies {
                    let mut next = path.clone();
                    next.push(*dep);
                    stack.push((*dep, next));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use goalkit_core::TaskDefinition;

    fn submit(registry: &mut TaskRegistry, name: &str, deps: Vec<TaskId>) -> TaskId {
        registry
            .submit(
                TaskDefinition::new(name, "true").with_dependencies(deps),
                Utc::now(),
            )
            .unwrap()
    }

    fn complete(registry: &mut TaskRegistry, id: TaskId) {
        registry.update_status(id, TaskStatus::Ready, Utc::now()).unwrap();
        registry.update_status(id, TaskStatus::Running, Utc::now()).unwrap();
        registry
            .update_status(id, TaskStatus::Completed, Utc::now())
            .unwrap();
    }

    #[test]
    fn test_ready_only_after_all_dependencies_complete() {
        let mut registry = TaskRegistry::new();
        let a = submit(&mut registry, "a", vec![]);
        let b = submit(&mut registry, "b", vec![]);
        let c = submit(&mut registry, "c", vec![a, b]);

        let resolver = DependencyResolver::new();
        let task_c = registry.get_cloned(c).unwrap();
        assert!(!resolver.is_ready(&task_c, &registry));

        complete(&mut registry, a);
        assert!(!resolver.is_ready(&task_c, &registry));

        complete(&mut registry, b);
        assert!(resolver.is_ready(&task_c, &registry));
    }

    #[test]
    fn test_failed_dependency_blocks_forever() {
        let mut registry = TaskRegistry::new();
        let a = submit(&mut registry, "a", vec![]);
        let b = submit(&mut registry, "b", vec![a]);

        registry.update_status(a, TaskStatus::Ready, Utc::now()).unwrap();
        registry.update_status(a, TaskStatus::Running, Utc::now()).unwrap();
        registry.update_status(a, TaskStatus::Failed, Utc::now()).unwrap();

        let resolver = DependencyResolver::new();
        let task_b = registry.get_cloned(b).unwrap();
        assert!(!resolver.is_ready(&task_b, &registry));
        assert_eq!(resolver.blocking(&task_b, &registry), vec![a]);
    }

    #[test]
    fn test_would_cycle_finds_transitive_path() {
        let mut registry = TaskRegistry::new();
        let a = submit(&mut registry, "a", vec![]);
        let b = submit(&mut registry, "b", vec![a]);
        let c = submit(&mut registry, "c", vec![b]);

        let resolver = DependencyResolver::new();
        // a -> c would close a -> c -> b -> a
        let path = resolver.would_cycle(a, c, &registry).unwrap();
        assert_eq!(path.first(), Some(&a));
        assert_eq!(path.last(), Some(&a));

        // c -> a is just a redundant edge, no cycle
        assert!(resolver.would_cycle(c, a, &registry).is_none());
    }

    #[test]
    fn test_would_cycle_terminates_on_diamonds() {
        let mut registry = TaskRegistry::new();
        let a = submit(&mut registry, "a", vec![]);
        let b = submit(&mut registry, "b", vec![a]);
        let c = submit(&mut registry, "c", vec![a]);
        let d = submit(&mut registry, "d", vec![b, c]);

        let resolver = DependencyResolver::new();
        assert!(resolver.would_cycle(a, d, &registry).is_some());
        assert!(resolver.would_cycle(d, a, &registry).is_none());
    }
}
