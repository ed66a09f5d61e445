//! Terminal outcome of one external programmer process.

use std::time::Duration;

/// Why a process could not be launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnFailure {
    /// The executable could not be located on the search path.
    NotFound,
    /// Any other launch failure (permissions, resource exhaustion, ...).
    Os(String),
}

/// What happened to a spawned programmer.
///
/// Produced exactly once per execution by a
/// [`ProcessExecutor`](crate::ports::ProcessExecutor) and consumed once by
/// the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process ran and exited. Signal deaths report `exit_code == -1`.
    Completed {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    /// The process never started.
    SpawnFailed(SpawnFailure),
    /// The process started but waiting on it failed; it has been killed.
    WaitFailed(String),
    /// The process exceeded the configured time limit and was killed.
    TimedOut {
        after: Duration,
        stdout: String,
        stderr: String,
    },
    /// The caller cancelled the request and the process was killed.
    Cancelled,
}

impl ProcessOutcome {
    /// Convenience constructor used by executors and tests.
    pub fn completed(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::Completed {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}
