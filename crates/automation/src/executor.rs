//! The command executor seam.
//!
//! The engine never runs commands itself. It hands a task's opaque command
//! string to a [`CommandExecutor`] and takes whatever outcome comes back.
//! Shell and OS details live behind this trait, in the tools crate.

use async_trait::async_trait;
use std::time::Duration;

/// Executes a task's command and reports the outcome.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Execute the command to completion and describe what happened.
    ///
    /// Implementations report failure through the outcome's exit code, not
    /// by panicking or hanging; the engine stays alive either way.
    async fn execute(&self, command: &str) -> CommandOutcome;
}

/// What happened when a command ran.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    /// Process exit code, 0 means success
    pub exit_code: i32,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Wall-clock execution time
    pub duration: Duration,
}

impl CommandOutcome {
    /// An immediately successful outcome with empty output.
    pub fn success() -> Self {
        Self {
            exit_code: 0,
            stdout: String::new(),
            stderr: String::new(),
            duration: Duration::ZERO,
        }
    }

    /// A failed outcome with the given exit code and stderr.
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
            duration: Duration::ZERO,
        }
    }

    /// True when the command exited cleanly.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// A short failure description for the task record.
    pub fn failure_detail(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            format!("exit code {}", self.exit_code)
        } else {
            format!("exit code {}: {stderr}", self.exit_code)
        }
    }
}
