//! Shell-backed and instant command executors.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use goalkit_automation::{CommandExecutor, CommandOutcome};

/// Runs commands through `sh -c`, optionally bounded by a wall-clock
/// timeout. A timed-out command is reported as a failed outcome, never as
/// a hang.
pub struct ShellExecutor {
    timeout: Option<Duration>,
}

impl ShellExecutor {
    /// Executor without a timeout.
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Bound every command by this wall-clock timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn run(&self, command: &str) -> std::io::Result<CommandOutcome> {
        let start = Instant::now();
        let output = Command::new("sh").arg("-c").arg(command).output().await?;
        Ok(CommandOutcome {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration: start.elapsed(),
        })
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, command: &str) -> CommandOutcome {
        debug!(command, "executing");
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.run(command)).await {
                Ok(result) => result,
                Err(_) => {
                    return CommandOutcome::failure(
                        -1,
                        format!("timed out after {:.1}s", limit.as_secs_f64()),
                    );
                }
            },
            None => self.run(command).await,
        };
        match result {
            Ok(outcome) => outcome,
            Err(err) => CommandOutcome::failure(-1, format!("failed to spawn: {err}")),
        }
    }
}

/// Succeeds immediately without running anything. Used for dry runs and in
/// tests that only exercise scheduling.
pub struct InstantExecutor;

#[async_trait]
impl CommandExecutor for InstantExecutor {
    async fn execute(&self, command: &str) -> CommandOutcome {
        debug!(command, "dry run");
        CommandOutcome::success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shell_reports_exit_codes() {
        let executor = ShellExecutor::new();
        assert!(executor.execute("true").await.succeeded());

        let outcome = executor.execute("exit 3").await;
        assert!(!outcome.succeeded());
        assert_eq!(outcome.exit_code, 3);
    }

    #[tokio::test]
    async fn test_shell_captures_output() {
        let executor = ShellExecutor::new();
        let outcome = executor.execute("echo hello; echo oops >&2").await;
        assert_eq!(outcome.stdout.trim(), "hello");
        assert_eq!(outcome.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn test_shell_timeout_becomes_failure() {
        let executor = ShellExecutor::new().with_timeout(Duration::from_millis(50));
        let outcome = executor.execute("sleep 5").await;
        assert!(!outcome.succeeded());
        assert!(outcome.stderr.contains("timed out"));
    }

    #[tokio::test]
    async fn test_instant_always_succeeds() {
        let outcome = InstantExecutor.execute("exit 1").await;
        assert!(outcome.succeeded());
    }
}
