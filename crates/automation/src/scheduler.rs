//! The scheduler - drives tasks through their lifecycle.
//!
//! One engine owns one registry and one resource pool behind a single
//! mutex, so admission and state transitions are serialized: two ticks can
//! never double-reserve the same headroom or double-transition a task.
//! Execution itself happens outside the lock, several tasks at a time.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use goalkit_core::{
    AutomationError, ResourceKind, Task, TaskDefinition, TaskId, TaskStatus, Time,
};

use crate::admission::ResourcePool;
use crate::dependency::DependencyResolver;
use crate::executor::CommandExecutor;
use crate::registry::TaskRegistry;

type Clock = Arc<dyn Fn() -> Time + Send + Sync>;

struct EngineState {
    registry: TaskRegistry,
    pool: ResourcePool,
}

/// The automation engine: task registry + resource pool + scheduling logic.
///
/// All mutation goes through `&self` methods that take the internal lock,
/// so the engine can be shared behind an `Arc` between a scheduler loop and
/// concurrent analytics readers.
pub struct AutomationEngine {
    state: Mutex<EngineState>,
    resolver: DependencyResolver,
    clock: Clock,
}

impl AutomationEngine {
    /// Create an engine over the given resource pool.
    pub fn new(pool: ResourcePool) -> Self {
        Self {
            state: Mutex::new(EngineState {
                registry: TaskRegistry::new(),
                pool,
            }),
            resolver: DependencyResolver::new(),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the wall clock. Tests use this to pin timestamps.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> Time {
        (self.clock)()
    }

    /// Submit a task definition.
    ///
    /// On top of registry validation, every resource requirement must name a
    /// kind the pool actually carries; otherwise the task could wait forever
    /// on a resource that does not exist.
    pub async fn submit(&self, definition: TaskDefinition) -> Result<TaskId, AutomationError> {
        let mut state = self.state.lock().await;
        for (kind, amount) in definition.resource_requirements.iter() {
            if amount > 0.0 && !state.pool.has_kind(kind) {
                return Err(AutomationError::Validation(format!(
                    "task '{}' requires unknown resource {kind}",
                    definition.name
                )));
            }
            if amount > state.pool.capacity_of(kind) {
                return Err(AutomationError::Validation(format!(
                    "task '{}' requires {amount} {kind}, pool capacity is {}",
                    definition.name,
                    state.pool.capacity_of(kind)
                )));
            }
        }
        let now = self.now();
        let id = state.registry.submit(definition, now)?;
        debug!(task = %id, "task submitted");
        Ok(id)
    }

    /// Add a dependency edge to a still-pending task.
    pub async fn add_dependency(
        &self,
        task: TaskId,
        depends_on: TaskId,
    ) -> Result<(), AutomationError> {
        let mut state = self.state.lock().await;
        state.registry.add_dependency(task, depends_on)
    }

    /// Cancel a task that has not started running.
    ///
    /// Immediate and synchronous for Pending/Ready tasks; anything else is
    /// an invalid transition (running work is the executor's to stop).
    pub async fn cancel(&self, id: TaskId) -> Result<(), AutomationError> {
        let now = self.now();
        let mut state = self.state.lock().await;
        state.registry.update_status(id, TaskStatus::Cancelled, now)?;
        info!(task = %id, "task cancelled");
        Ok(())
    }

    /// Run one scheduling pass.
    ///
    /// 1. Pending tasks whose dependencies are all Completed become Ready;
    ///    blocked tasks stay Pending and are listed in the report.
    /// 2. Ready tasks are ordered by (priority desc, sequence asc).
    /// 3. In that order each is offered to the pool; admitted tasks become
    ///    Running and are handed out as dispatches. A task that does not
    ///    fit stays Ready and later tasks are still attempted, so a large
    ///    high-priority task never blocks smaller low-priority ones.
    pub async fn tick(&self) -> TickReport {
        let now = self.now();
        let mut state = self.state.lock().await;
        let mut report = TickReport::default();

        // Phase 1: readiness
        for task in state.registry.list() {
            if task.status != TaskStatus::Pending {
                continue;
            }
            if self.resolver.is_ready(&task, &state.registry) {
                // Pending -> Ready on a pending task cannot fail
                if state.registry.update_status(task.id, TaskStatus::Ready, now).is_ok() {
                    report.promoted.push(task.id);
                }
            } else {
                let blocked_by = self.resolver.blocking(&task, &state.registry);
                if !blocked_by.is_empty() {
                    report.blocked.push(BlockedTask {
                        id: task.id,
                        blocked_by,
                    });
                }
            }
        }

        // Phase 2: deterministic pick order
        let mut ready: Vec<Task> = state
            .registry
            .list()
            .into_iter()
            .filter(|t| t.status == TaskStatus::Ready)
            .collect();
        ready.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.sequence.cmp(&b.sequence))
        });

        // Phase 3: admission
        for task in ready {
            if state.pool.try_reserve(&task.resource_requirements) {
                if state.registry.update_status(task.id, TaskStatus::Running, now).is_ok() {
                    debug!(task = %task.id, command = %task.command, "task dispatched");
                    report.dispatched.push(Dispatch {
                        id: task.id,
                        command: task.command,
                    });
                } else {
                    // Should not happen; undo the reservation rather than leak it
                    let _ = state.pool.release(&task.resource_requirements);
                }
            } else {
                report.still_ready.push(task.id);
            }
        }

        report
    }

    /// Take an externally reported completion for a running task.
    ///
    /// Releases the task's reserved resources, transitions it to Completed
    /// or Failed and records the failure detail. A clamped release is logged
    /// and counted but never propagated, the loop must keep going.
    pub async fn report_completion(
        &self,
        id: TaskId,
        outcome: TaskOutcome,
    ) -> Result<(), AutomationError> {
        let now = self.now();
        let mut state = self.state.lock().await;

        let task = state.registry.get(id)?;
        if task.status != TaskStatus::Running {
            return Err(AutomationError::InvalidTransition {
                from: task.status,
                to: outcome.final_status(),
            });
        }
        let requirements = task.resource_requirements.clone();

        if let Err(err) = state.pool.release(&requirements) {
            warn!(task = %id, error = %err, "release clamped on completion");
        }
        state.registry.update_status(id, outcome.final_status(), now)?;
        if let TaskOutcome::Failure(detail) = outcome {
            info!(task = %id, detail = %detail, "task failed");
            state.registry.get_mut(id)?.failure = Some(detail);
        } else {
            debug!(task = %id, "task completed");
        }
        Ok(())
    }

    /// Describe one task's current state, including derived blockage.
    pub async fn status_report(&self, id: TaskId) -> Result<TaskStatusReport, AutomationError> {
        let state = self.state.lock().await;
        let task = state.registry.get_cloned(id)?;
        let blocked_by = if task.status == TaskStatus::Pending {
            self.resolver.blocking(&task, &state.registry)
        } else {
            Vec::new()
        };
        Ok(TaskStatusReport {
            blocked: !blocked_by.is_empty(),
            blocked_by,
            task,
        })
    }

    /// Deep-copy the engine state for analytics.
    ///
    /// The copy is taken under the lock, so readers always observe a
    /// consistent registry/pool pair, then computed on outside it.
    pub async fn snapshot(&self) -> EngineSnapshot {
        let state = self.state.lock().await;
        // Clock is read under the lock so no transition can stamp a task
        // after taken_at
        let taken_at = self.now();
        EngineSnapshot {
            taken_at,
            tasks: state.registry.list(),
            capacities: state.pool.capacities(),
            reserved: state.pool.reserved(),
            utilization: state.pool.utilization(),
            clamp_events: state.pool.clamp_events(),
        }
    }

    /// Drive the engine to quiescence with the given executor.
    ///
    /// Repeatedly ticks, spawns dispatched commands and feeds completions
    /// back in. Stops when every task is terminal, when no further progress
    /// is possible (everything left is blocked or unadmittable with nothing
    /// running), or after `max_ticks`. Reaching `max_ticks` stops further
    /// scheduling but still awaits commands already in flight, so no task
    /// is left Running and no reservation leaks.
    pub async fn run(
        &self,
        executor: Arc<dyn CommandExecutor>,
        config: RunConfig,
    ) -> RunSummary {
        let (tx, mut rx) = mpsc::unbounded_channel::<(TaskId, TaskOutcome)>();
        let mut running = 0usize;
        let mut ticks = 0usize;
        let mut stalled = false;

        loop {
            if let Some(max) = config.max_ticks {
                if ticks >= max {
                    info!(ticks, "reached max ticks");
                    // Stop scheduling but still take the completions already
                    // in flight; abandoning them would leave their tasks
                    // Running and their reservations held forever.
                    while running > 0 {
                        let Some((id, outcome)) = rx.recv().await else { break };
                        running -= 1;
                        if let Err(err) = self.report_completion(id, outcome).await {
                            warn!(task = %id, error = %err, "completion rejected");
                        }
                    }
                    stalled = self.has_open_tasks().await;
                    break;
                }
            }

            let report = self.tick().await;
            ticks += 1;

            for dispatch in report.dispatched {
                running += 1;
                let executor = Arc::clone(&executor);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let outcome = executor.execute(&dispatch.command).await;
                    let result = if outcome.succeeded() {
                        TaskOutcome::Success
                    } else {
                        TaskOutcome::Failure(outcome.failure_detail())
                    };
                    // Receiver only drops once the loop is done
                    let _ = tx.send((dispatch.id, result));
                });
            }

            if running == 0 {
                // Nothing in flight and nothing dispatched: either all done
                // or permanently stuck (blocked or unadmittable).
                stalled = self.has_open_tasks().await;
                if stalled {
                    warn!("automation stalled with unfinished tasks");
                }
                break;
            }

            // Wait for at least one completion before the next tick, then
            // drain whatever else already finished.
            match rx.recv().await {
                Some((id, outcome)) => {
                    running -= 1;
                    if let Err(err) = self.report_completion(id, outcome).await {
                        warn!(task = %id, error = %err, "completion rejected");
                    }
                    while let Ok((id, outcome)) = rx.try_recv() {
                        running -= 1;
                        if let Err(err) = self.report_completion(id, outcome).await {
                            warn!(task = %id, error = %err, "completion rejected");
                        }
                    }
                }
                None => break,
            }
        }

        let snapshot = self.snapshot().await;
        let mut summary = RunSummary {
            ticks,
            stalled,
            ..Default::default()
        };
        for task in &snapshot.tasks {
            match task.status {
                TaskStatus::Completed => summary.completed += 1,
                TaskStatus::Failed => summary.failed += 1,
                TaskStatus::Cancelled => summary.cancelled += 1,
                _ => summary.unfinished += 1,
            }
        }
        summary
    }

    async fn has_open_tasks(&self) -> bool {
        let state = self.state.lock().await;
        state
            .registry
            .list()
            .iter()
            .any(|t| !t.status.is_terminal())
    }
}

/// What one tick did.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Tasks promoted Pending -> Ready this tick
    pub promoted: Vec<TaskId>,
    /// Tasks admitted and handed to the executor
    pub dispatched: Vec<Dispatch>,
    /// Pending tasks whose dependencies can never complete
    pub blocked: Vec<BlockedTask>,
    /// Ready tasks that failed admission and will be retried
    pub still_ready: Vec<TaskId>,
}

/// A task handed out for execution.
#[derive(Debug, Clone)]
pub struct Dispatch {
    /// The running task
    pub id: TaskId,
    /// Its command, for the executor
    pub command: String,
}

/// A pending task that can never become ready.
#[derive(Debug, Clone)]
pub struct BlockedTask {
    /// The blocked task
    pub id: TaskId,
    /// Failed, cancelled or missing dependencies holding it back
    pub blocked_by: Vec<TaskId>,
}

/// Externally reported result of a task's command.
#[derive(Debug, Clone)]
pub enum TaskOutcome {
    /// The command exited cleanly
    Success,
    /// The command failed, with a short detail string
    Failure(String),
}

impl TaskOutcome {
    fn final_status(&self) -> TaskStatus {
        match self {
            TaskOutcome::Success => TaskStatus::Completed,
            TaskOutcome::Failure(_) => TaskStatus::Failed,
        }
    }
}

/// One task's state plus derived blockage, for `status` displays.
#[derive(Debug, Clone)]
pub struct TaskStatusReport {
    /// The task record (cloned)
    pub task: Task,
    /// True when a dependency is Failed, Cancelled or missing
    pub blocked: bool,
    /// The dependencies holding the task back
    pub blocked_by: Vec<TaskId>,
}

/// Consistent deep copy of engine state, the input to analytics.
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    /// When the snapshot was taken
    pub taken_at: Time,
    /// Every task, cloned, in submission order
    pub tasks: Vec<Task>,
    /// Pool capacity per resource
    pub capacities: BTreeMap<ResourceKind, f64>,
    /// Reserved amount per resource
    pub reserved: BTreeMap<ResourceKind, f64>,
    /// Utilization percentage per resource
    pub utilization: BTreeMap<ResourceKind, f64>,
    /// Release clamp count so far
    pub clamp_events: u64,
}

/// Knobs for [`AutomationEngine::run`].
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Stop after this many ticks (None = run to quiescence)
    pub max_ticks: Option<usize>,
}

/// What a run achieved.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Ticks executed
    pub ticks: usize,
    /// Tasks that completed
    pub completed: usize,
    /// Tasks that failed
    pub failed: usize,
    /// Tasks cancelled before running
    pub cancelled: usize,
    /// Tasks left non-terminal (blocked, unadmitted or never started)
    pub unfinished: usize,
    /// True when the run ended with unfinished tasks
    pub stalled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::CommandOutcome;
    use async_trait::async_trait;
    use goalkit_core::TaskPriority;
    use std::time::Duration;

    fn pool_cpu_mem() -> ResourcePool {
        ResourcePool::new([
            (ResourceKind::Cpu, 100.0),
            (ResourceKind::Memory, 200.0),
        ])
        .unwrap()
    }

    fn def(name: &str) -> TaskDefinition {
        TaskDefinition::new(name, format!("run {name}"))
    }

    #[tokio::test]
    async fn test_scenario_dependency_then_admission() {
        // A: high priority, cpu 20 / mem 100. B: normal, depends on A,
        // cpu 10 / mem 50. Pool: cpu 100 / mem 200.
        let engine = AutomationEngine::new(pool_cpu_mem());
        let a = engine
            .submit(
                def("a")
                    .with_priority(TaskPriority::High)
                    .with_requirement(ResourceKind::Cpu, 20.0)
                    .with_requirement(ResourceKind::Memory, 100.0),
            )
            .await
            .unwrap();
        let b = engine
            .submit(
                def("b")
                    .with_dependency(a)
                    .with_requirement(ResourceKind::Cpu, 10.0)
                    .with_requirement(ResourceKind::Memory, 50.0),
            )
            .await
            .unwrap();

        // Tick 1: A runs, B stays pending
        let report = engine.tick().await;
        assert_eq!(report.dispatched.len(), 1);
        assert_eq!(report.dispatched[0].id, a);
        let snap = engine.snapshot().await;
        assert_eq!(snap.reserved[&ResourceKind::Cpu], 20.0);
        assert_eq!(snap.reserved[&ResourceKind::Memory], 100.0);
        assert_eq!(
            engine.status_report(b).await.unwrap().task.status,
            TaskStatus::Pending
        );

        // A completes: resources drop back to zero
        engine.report_completion(a, TaskOutcome::Success).await.unwrap();
        let snap = engine.snapshot().await;
        assert_eq!(snap.reserved[&ResourceKind::Cpu], 0.0);
        assert_eq!(snap.reserved[&ResourceKind::Memory], 0.0);
        assert_eq!(
            engine.status_report(a).await.unwrap().task.status,
            TaskStatus::Completed
        );

        // Tick 2: B becomes ready, admitted, running
        let report = engine.tick().await;
        assert_eq!(report.promoted, vec![b]);
        assert_eq!(report.dispatched.len(), 1);
        assert_eq!(report.dispatched[0].id, b);
    }

    #[tokio::test]
    async fn test_priority_then_creation_order() {
        // Pool only fits one task at a time
        let pool = ResourcePool::new([(ResourceKind::Cpu, 100.0)]).unwrap();
        let engine = AutomationEngine::new(pool);

        let low = engine
            .submit(
                def("low")
                    .with_priority(TaskPriority::Low)
                    .with_requirement(ResourceKind::Cpu, 80.0),
            )
            .await
            .unwrap();
        let high_first = engine
            .submit(
                def("high-first")
                    .with_priority(TaskPriority::High)
                    .with_requirement(ResourceKind::Cpu, 80.0),
            )
            .await
            .unwrap();
        let high_second = engine
            .submit(
                def("high-second")
                    .with_priority(TaskPriority::High)
                    .with_requirement(ResourceKind::Cpu, 80.0),
            )
            .await
            .unwrap();

        let report = engine.tick().await;
        // Highest priority wins; equal priorities break ties by submission
        assert_eq!(report.dispatched.len(), 1);
        assert_eq!(report.dispatched[0].id, high_first);
        assert_eq!(report.still_ready, vec![high_second, low]);
    }

    #[tokio::test]
    async fn test_no_head_of_line_blocking() {
        let pool = ResourcePool::new([(ResourceKind::Cpu, 100.0)]).unwrap();
        let engine = AutomationEngine::new(pool);

        // Occupy 30 cpu first so the big task will not fit later
        let filler = engine
            .submit(def("filler").with_requirement(ResourceKind::Cpu, 30.0))
            .await
            .unwrap();
        let report = engine.tick().await;
        assert_eq!(report.dispatched.len(), 1);
        assert_eq!(report.dispatched[0].id, filler);

        // The critical task alone does not fit the remaining 70
        let big = engine
            .submit(
                def("big")
                    .with_priority(TaskPriority::Critical)
                    .with_requirement(ResourceKind::Cpu, 90.0),
            )
            .await
            .unwrap();
        let small_a = engine
            .submit(def("small-a").with_requirement(ResourceKind::Cpu, 40.0))
            .await
            .unwrap();
        let small_b = engine
            .submit(def("small-b").with_requirement(ResourceKind::Cpu, 40.0))
            .await
            .unwrap();

        // big is skipped, the first small task is still admitted this tick
        let report = engine.tick().await;
        let dispatched: Vec<TaskId> = report.dispatched.iter().map(|d| d.id).collect();
        assert!(!dispatched.contains(&big));
        assert!(dispatched.contains(&small_a));
        assert!(!dispatched.contains(&small_b), "40+40+30 exceeds the pool");
        assert_eq!(report.still_ready, vec![big, small_b]);
    }

    #[tokio::test]
    async fn test_failed_dependency_reports_blocked() {
        let engine = AutomationEngine::new(pool_cpu_mem());
        let a = engine.submit(def("a")).await.unwrap();
        let b = engine.submit(def("b").with_dependency(a)).await.unwrap();

        engine.tick().await;
        engine
            .report_completion(a, TaskOutcome::Failure("boom".into()))
            .await
            .unwrap();

        let report = engine.tick().await;
        assert_eq!(report.blocked.len(), 1);
        assert_eq!(report.blocked[0].id, b);
        assert_eq!(report.blocked[0].blocked_by, vec![a]);

        let status = engine.status_report(b).await.unwrap();
        assert_eq!(status.task.status, TaskStatus::Pending);
        assert!(status.blocked);
        assert_eq!(status.blocked_by, vec![a]);

        let failed = engine.status_report(a).await.unwrap();
        assert_eq!(failed.task.status, TaskStatus::Failed);
        assert_eq!(failed.task.failure.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_cancel_before_running_only() {
        let engine = AutomationEngine::new(pool_cpu_mem());
        let a = engine.submit(def("a")).await.unwrap();
        let b = engine.submit(def("b")).await.unwrap();

        engine.cancel(a).await.unwrap();
        assert_eq!(
            engine.status_report(a).await.unwrap().task.status,
            TaskStatus::Cancelled
        );

        engine.tick().await;
        let err = engine.cancel(b).await.unwrap_err();
        assert!(matches!(err, AutomationError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_pool_resource() {
        let engine = AutomationEngine::new(pool_cpu_mem());
        let err = engine
            .submit(def("a").with_requirement(ResourceKind::Custom("gpu".into()), 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::Validation(_)));

        let err = engine
            .submit(def("b").with_requirement(ResourceKind::Cpu, 500.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::Validation(_)));
    }

    #[tokio::test]
    async fn test_completion_for_non_running_task_is_rejected() {
        let engine = AutomationEngine::new(pool_cpu_mem());
        let a = engine.submit(def("a")).await.unwrap();
        let err = engine
            .report_completion(a, TaskOutcome::Success)
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::InvalidTransition { .. }));
    }

    struct ScriptedExecutor;

    #[async_trait]
    impl CommandExecutor for ScriptedExecutor {
        async fn execute(&self, command: &str) -> CommandOutcome {
            if command.contains("fail") {
                CommandOutcome::failure(1, "scripted failure")
            } else {
                CommandOutcome::success()
            }
        }
    }

    #[tokio::test]
    async fn test_run_drives_chain_to_completion() {
        let engine = AutomationEngine::new(pool_cpu_mem());
        let a = engine
            .submit(def("a").with_requirement(ResourceKind::Cpu, 50.0))
            .await
            .unwrap();
        let _b = engine
            .submit(
                def("b")
                    .with_dependency(a)
                    .with_requirement(ResourceKind::Cpu, 50.0),
            )
            .await
            .unwrap();

        let summary = engine
            .run(Arc::new(ScriptedExecutor), RunConfig::default())
            .await;
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed, 0);
        assert!(!summary.stalled);

        let snap = engine.snapshot().await;
        assert_eq!(snap.reserved[&ResourceKind::Cpu], 0.0);
    }

    #[tokio::test]
    async fn test_run_reports_stall_on_failed_dependency() {
        let engine = AutomationEngine::new(pool_cpu_mem());
        let a = engine
            .submit(TaskDefinition::new("a", "fail now"))
            .await
            .unwrap();
        let _b = engine
            .submit(def("b").with_dependency(a))
            .await
            .unwrap();

        let summary = engine
            .run(Arc::new(ScriptedExecutor), RunConfig::default())
            .await;
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.unfinished, 1);
        assert!(summary.stalled);
    }

    #[tokio::test]
    async fn test_run_awaits_in_flight_work_at_max_ticks() {
        // Two tasks that each need the whole pool, one tick allowed: the
        // first must still be driven to completion and release its
        // reservation before run returns.
        let pool = ResourcePool::new([(ResourceKind::Cpu, 100.0)]).unwrap();
        let engine = AutomationEngine::new(pool);
        let _first = engine
            .submit(def("first").with_requirement(ResourceKind::Cpu, 100.0))
            .await
            .unwrap();
        let _second = engine
            .submit(def("second").with_requirement(ResourceKind::Cpu, 100.0))
            .await
            .unwrap();

        let summary = engine
            .run(
                Arc::new(ScriptedExecutor),
                RunConfig { max_ticks: Some(1) },
            )
            .await;
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.unfinished, 1);
        assert!(summary.stalled);

        let snap = engine.snapshot().await;
        assert!(snap.tasks.iter().all(|t| t.status != TaskStatus::Running));
        assert_eq!(snap.reserved[&ResourceKind::Cpu], 0.0);
    }

    #[tokio::test]
    async fn test_snapshot_time_is_not_before_any_start() {
        // Stepping clock: every now() call advances one second
        let counter = Arc::new(std::sync::atomic::AtomicI64::new(0));
        let clock_counter = Arc::clone(&counter);
        let engine = AutomationEngine::new(pool_cpu_mem()).with_clock(Arc::new(move || {
            let step = clock_counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            chrono::DateTime::from_timestamp(1_700_000_000 + step, 0).unwrap()
        }));

        engine.submit(def("a")).await.unwrap();
        engine.tick().await;

        let snap = engine.snapshot().await;
        for task in &snap.tasks {
            if let Some(started) = task.started_at {
                assert!(started <= snap.taken_at);
            }
        }
    }

    #[tokio::test]
    async fn test_estimated_duration_validation() {
        let engine = AutomationEngine::new(pool_cpu_mem());
        let err = engine
            .submit(def("a").with_estimated_duration(Duration::ZERO))
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::Validation(_)));
    }
}
