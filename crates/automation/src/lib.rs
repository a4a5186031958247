//! Goal Kit automation engine.
//!
//! An in-memory task scheduler with dependency resolution, resource-budget
//! admission control and progress analytics. One engine instance owns one
//! task registry and one resource pool; all state lives for the lifetime of
//! the engine and nothing is persisted.

#![warn(missing_docs)]

pub mod admission;
pub mod analytics;
pub mod dependency;
pub mod executor;
pub mod plan;
pub mod registry;
pub mod scheduler;

pub use admission::ResourcePool;
pub use analytics::{AnalyticsReporter, StatusCounts};
pub use dependency::DependencyResolver;
pub use executor::{CommandExecutor, CommandOutcome};
pub use plan::{check_plan, submit_plan, PlanProblem};
pub use registry::TaskRegistry;
pub use scheduler::{
    AutomationEngine, BlockedTask, Dispatch, EngineSnapshot, RunConfig, RunSummary, TaskOutcome,
    TaskStatusReport, TickReport,
};
