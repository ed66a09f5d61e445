//! `ProcessExecutor` backed by `tokio::process`.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use papilio_core::{CommandSpec, ProcessExecutor, ProcessOutcome, SpawnFailure};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::capture::OutputCapture;
use super::shutdown::{DEFAULT_SHUTDOWN_GRACE, shutdown_child};

/// Runs one programmer process per call.
///
/// The child gets no stdin and both output pipes. It is never run through a
/// shell, so paths with spaces or metacharacters stay single arguments.
#[derive(Debug, Clone)]
pub struct TokioProcessExecutor {
    timeout: Option<Duration>,
    shutdown_grace: Duration,
}

impl Default for TokioProcessExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// How the wait for the child ended.
enum Ended {
    Exited(io::Result<ExitStatus>),
    TimedOut(Duration),
    Cancelled,
}

impl TokioProcessExecutor {
    /// Executor without a time limit.
    pub const fn new() -> Self {
        Self {
            timeout: None,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    /// Terminate programmers that run longer than `timeout`. `None` waits forever.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// How long a terminated programmer gets before SIGKILL.
    #[must_use]
    pub const fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    fn spawn(spec: &CommandSpec) -> io::Result<Child> {
        Command::new(spec.program())
            .args(spec.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
    }

    async fn wait(&self, child: &mut Child, cancel: &CancellationToken) -> Ended {
        let deadline = async {
            match self.timeout {
                Some(limit) => {
                    tokio::time::sleep(limit).await;
                    limit
                }
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            status = child.wait() => Ended::Exited(status),
            limit = deadline => Ended::TimedOut(limit),
            () = cancel.cancelled() => Ended::Cancelled,
        }
    }

    async fn terminate(&self, child: &mut Child, program: &str) {
        if let Err(e) = shutdown_child(child, self.shutdown_grace).await {
            warn!(program = %program, error = %e, "Failed to shut down programmer");
        }
    }
}

#[async_trait]
impl ProcessExecutor for TokioProcessExecutor {
    async fn execute(&self, spec: &CommandSpec, cancel: CancellationToken) -> ProcessOutcome {
        let program = spec.program();

        let mut child = match Self::spawn(spec) {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(program = %program, "Programmer not found");
                return ProcessOutcome::SpawnFailed(SpawnFailure::NotFound);
            }
            Err(e) => return ProcessOutcome::SpawnFailed(SpawnFailure::Os(e.to_string())),
        };
        debug!(program = %program, pid = ?child.id(), "Programmer spawned");

        let capture = OutputCapture::spawn(&mut child, program);

        match self.wait(&mut child, &cancel).await {
            Ended::Exited(Ok(status)) => {
                let (stdout, stderr) = capture.finish().await;
                // Killed by a signal: no exit code
                let exit_code = status.code().unwrap_or(-1);
                debug!(program = %program, exit_code, "Programmer exited");
                ProcessOutcome::Completed {
                    exit_code,
                    stdout,
                    stderr,
                }
            }
            Ended::Exited(Err(e)) => {
                warn!(program = %program, error = %e, "Lost track of running programmer");
                self.terminate(&mut child, program).await;
                ProcessOutcome::WaitFailed(e.to_string())
            }
            Ended::TimedOut(after) => {
                warn!(program = %program, timeout_secs = after.as_secs(), "Programmer timed out");
                self.terminate(&mut child, program).await;
                let (stdout, stderr) = capture.finish().await;
                ProcessOutcome::TimedOut {
                    after,
                    stdout,
                    stderr,
                }
            }
            Ended::Cancelled => {
                debug!(program = %program, "Flash cancelled, stopping programmer");
                self.terminate(&mut child, program).await;
                ProcessOutcome::Cancelled
            }
        }
    }
}
