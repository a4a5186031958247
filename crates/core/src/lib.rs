//! Goal Kit core data models.
//!
//! This crate defines the fundamental data structures shared by the
//! automation engine, the project scaffolding layer and the CLI.

#![warn(missing_docs)]

// Core identities
mod id;

// Task model and lifecycle
mod task;

// Resource kinds and requirement maps
mod resource;

// Plan files (name-addressed task batches)
mod plan;

// Shared error type
mod error;

// Re-exports
pub use id::TaskId;

pub use task::{Task, TaskDefinition, TaskPriority, TaskStatus};
pub use resource::{ResourceKind, ResourceRequirements};
pub use plan::{PlannedTask, TaskPlan};
pub use error::AutomationError;

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
