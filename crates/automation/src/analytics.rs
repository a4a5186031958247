//! Progress analytics over engine snapshots.
//!
//! The reporter works on an [`EngineSnapshot`], never on live engine state,
//! so it can run concurrently with ticks and never observes a half-applied
//! transition. Everything here is read-only.

use std::collections::{BTreeMap, HashMap};

use goalkit_core::{ResourceKind, TaskId, TaskStatus};

use crate::scheduler::EngineSnapshot;

/// Per-status task totals. Blocked is a sub-state of Pending and is
/// reported separately; `pending` counts only non-blocked pending tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// Pending, not blocked
    pub pending: usize,
    /// Pending with a dependency that can never complete
    pub blocked: usize,
    /// Waiting for admission
    pub ready: usize,
    /// Currently executing
    pub running: usize,
    /// Finished successfully
    pub completed: usize,
    /// Finished with an error
    pub failed: usize,
    /// Cancelled before running
    pub cancelled: usize,
    /// All tasks
    pub total: usize,
}

/// Derives utilization, efficiency and a text report from one snapshot.
pub struct AnalyticsReporter {
    snapshot: EngineSnapshot,
}

impl AnalyticsReporter {
    /// Wrap a snapshot.
    pub fn new(snapshot: EngineSnapshot) -> Self {
        Self { snapshot }
    }

    /// Utilization percentage per resource, from the pool snapshot.
    pub fn resource_utilization(&self) -> &BTreeMap<ResourceKind, f64> {
        &self.snapshot.utilization
    }

    /// Ratio of estimated work completed to wall-clock time spent.
    ///
    /// Sum of estimated durations of Completed tasks divided by the elapsed
    /// time since the first task started, as of the snapshot. 0.0 when
    /// nothing has completed. Elapsed time is floored at one millisecond so
    /// a completed task always yields a positive finite value.
    pub fn schedule_efficiency(&self) -> f64 {
        let completed_secs: f64 = self
            .snapshot
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .map(|t| t.estimated_duration.as_secs_f64())
            .sum();
        if completed_secs == 0.0 {
            return 0.0;
        }

        let Some(first_start) = self
            .snapshot
            .tasks
            .iter()
            .filter_map(|t| t.started_at)
            .min()
        else {
            return 0.0;
        };
        let elapsed_ms = (self.snapshot.taken_at - first_start).num_milliseconds().max(1);
        completed_secs / (elapsed_ms as f64 / 1000.0)
    }

    /// Count tasks per status, deriving blockage from the snapshot itself.
    pub fn status_counts(&self) -> StatusCounts {
        let blocked = self.blocked_ids();
        let mut counts = StatusCounts::default();
        for task in &self.snapshot.tasks {
            counts.total += 1;
            match task.status {
                TaskStatus::Pending if blocked.contains(&task.id) => counts.blocked += 1,
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Ready => counts.ready += 1,
                TaskStatus::Running => counts.running += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Failed => counts.failed += 1,
                TaskStatus::Cancelled => counts.cancelled += 1,
            }
        }
        counts
    }

    /// Pending tasks with a dependency that is Failed, Cancelled or gone.
    fn blocked_ids(&self) -> Vec<TaskId> {
        let statuses: HashMap<TaskId, TaskStatus> = self
            .snapshot
            .tasks
            .iter()
            .map(|t| (t.id, t.status))
            .collect();
        self.snapshot
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .filter(|t| {
                t.dependencies.iter().any(|dep| {
                    !matches!(
                        statuses.get(dep),
                        Some(
                            TaskStatus::Pending
                                | TaskStatus::Ready
                                | TaskStatus::Running
                                | TaskStatus::Completed
                        )
                    )
                })
            })
            .map(|t| t.id)
            .collect()
    }

    /// Render a deterministic, human-readable summary.
    pub fn generate_report(&self) -> String {
        let counts = self.status_counts();
        let mut out = String::new();

        out.push_str("Automation Report\n");
        out.push_str("=================\n");
        out.push_str(&format!("Tasks: {} total\n", counts.total));
        out.push_str(&format!("  pending:   {}\n", counts.pending));
        out.push_str(&format!("  blocked:   {}\n", counts.blocked));
        out.push_str(&format!("  ready:     {}\n", counts.ready));
        out.push_str(&format!("  running:   {}\n", counts.running));
        out.push_str(&format!("  completed: {}\n", counts.completed));
        out.push_str(&format!("  failed:    {}\n", counts.failed));
        out.push_str(&format!("  cancelled: {}\n", counts.cancelled));

        out.push_str("Resources:\n");
        for (kind, capacity) in &self.snapshot.capacities {
            let reserved = self.snapshot.reserved.get(kind).copied().unwrap_or(0.0);
            let percent = self.snapshot.utilization.get(kind).copied().unwrap_or(0.0);
            out.push_str(&format!(
                "  {:<10} {reserved:.1} / {capacity:.1} ({percent:.1}%)\n",
                format!("{kind}:")
            ));
        }

        out.push_str(&format!(
            "Schedule efficiency: {:.2}\n",
            self.schedule_efficiency()
        ));
        if self.snapshot.clamp_events > 0 {
            out.push_str(&format!(
                "Resource releases clamped: {}\n",
                self.snapshot.clamp_events
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use goalkit_core::{ResourceRequirements, Task, TaskPriority, Time};
    use std::time::Duration;

    fn task(name: &str, status: TaskStatus, sequence: u64) -> Task {
        Task {
            id: TaskId::new(),
            name: name.to_string(),
            description: String::new(),
            command: "true".to_string(),
            priority: TaskPriority::Normal,
            status,
            dependencies: Vec::new(),
            estimated_duration: Duration::from_secs(60),
            resource_requirements: ResourceRequirements::new(),
            sequence,
            created_at: base_time(),
            started_at: None,
            completed_at: None,
            failure: None,
        }
    }

    fn base_time() -> Time {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn snapshot(tasks: Vec<Task>, taken_at: Time) -> EngineSnapshot {
        EngineSnapshot {
            taken_at,
            tasks,
            capacities: [(ResourceKind::Cpu, 100.0)].into_iter().collect(),
            reserved: [(ResourceKind::Cpu, 25.0)].into_iter().collect(),
            utilization: [(ResourceKind::Cpu, 25.0)].into_iter().collect(),
            clamp_events: 0,
        }
    }

    #[test]
    fn test_efficiency_zero_without_completions() {
        let mut running = task("a", TaskStatus::Running, 0);
        running.started_at = Some(base_time());
        let reporter = AnalyticsReporter::new(snapshot(
            vec![running],
            base_time() + ChronoDuration::seconds(30),
        ));
        assert_eq!(reporter.schedule_efficiency(), 0.0);
    }

    #[test]
    fn test_efficiency_positive_after_completion() {
        // 60s of estimated work done in 30s of wall clock: efficiency 2.0
        let mut done = task("a", TaskStatus::Completed, 0);
        done.started_at = Some(base_time());
        done.completed_at = Some(base_time() + ChronoDuration::seconds(30));
        let reporter = AnalyticsReporter::new(snapshot(
            vec![done],
            base_time() + ChronoDuration::seconds(30),
        ));
        let efficiency = reporter.schedule_efficiency();
        assert!((efficiency - 2.0).abs() < 1e-9, "got {efficiency}");
    }

    #[test]
    fn test_efficiency_floors_elapsed_time() {
        // Snapshot taken at the same instant the task started
        let mut done = task("a", TaskStatus::Completed, 0);
        done.started_at = Some(base_time());
        let reporter = AnalyticsReporter::new(snapshot(vec![done], base_time()));
        let efficiency = reporter.schedule_efficiency();
        assert!(efficiency.is_finite());
        assert!(efficiency > 0.0);
    }

    #[test]
    fn test_status_counts_separate_blocked() {
        let failed = task("dep", TaskStatus::Failed, 0);
        let mut blocked = task("blocked", TaskStatus::Pending, 1);
        blocked.dependencies = vec![failed.id];
        let plain = task("plain", TaskStatus::Pending, 2);

        let reporter =
            AnalyticsReporter::new(snapshot(vec![failed, blocked, plain], base_time()));
        let counts = reporter.status_counts();
        assert_eq!(counts.pending, 1);
        assert_eq!(counts.blocked, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.total, 3);
    }

    #[test]
    fn test_report_is_deterministic_and_readonly() {
        let reporter = AnalyticsReporter::new(snapshot(
            vec![task("a", TaskStatus::Ready, 0)],
            base_time(),
        ));
        let first = reporter.generate_report();
        let second = reporter.generate_report();
        assert_eq!(first, second);
        assert!(first.contains("Tasks: 1 total"));
        assert!(first.contains("ready:     1"));
        assert!(first.contains("cpu:"));
        assert!(first.contains("25.0 / 100.0 (25.0%)"));
        assert!(first.contains("Schedule efficiency: 0.00"));
        assert!(!first.contains("clamped"));
    }
}
