//! Command executors for the automation engine.
//!
//! Implementations of the engine's `CommandExecutor` seam: a shell-backed
//! executor for real runs and an instant one for dry runs and tests.

#![warn(missing_docs)]

pub mod shell;

pub use shell::{InstantExecutor, ShellExecutor};
