//! The flashing facade both transports call into.
//!
//! A request moves through `Validating → Locking → Resolving → Executing →
//! Classified` exactly once. Nothing is retried and every failure comes back
//! as a [`FlashFailure`] value.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};

use crate::domain::{
    DEFAULT_SUCCESS_MESSAGE, DeviceClass, FlashErrorKind, FlashFailure, FlashRequest,
    FlashResult, FlashSuccess, ProcessOutcome, SpawnFailure,
};
use crate::leases::PortLeases;
use crate::ports::ProcessExecutor;
use crate::resolver::CommandResolver;

/// Orchestrates one flash per call: artifact check, port lease, command
/// resolution, execution and outcome classification.
#[derive(Clone)]
pub struct FlashOrchestrator {
    resolver: CommandResolver,
    executor: Arc<dyn ProcessExecutor>,
    leases: PortLeases,
}

impl FlashOrchestrator {
    pub fn new(resolver: CommandResolver, executor: Arc<dyn ProcessExecutor>) -> Self {
        Self {
            resolver,
            executor,
            leases: PortLeases::new(),
        }
    }

    /// Share a lease registry with another orchestrator (e.g. HTTP and MCP
    /// running in one process).
    #[must_use]
    pub fn with_leases(mut self, leases: PortLeases) -> Self {
        self.leases = leases;
        self
    }

    pub const fn resolver(&self) -> &CommandResolver {
        &self.resolver
    }

    pub const fn leases(&self) -> &PortLeases {
        &self.leases
    }

    /// Flash without an external cancellation signal.
    ///
    /// Dropping the returned future still kills the programmer.
    pub async fn flash(&self, request: FlashRequest) -> FlashResult {
        self.flash_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Flash, killing the programmer if `cancel` fires first.
    pub async fn flash_with_cancel(
        &self,
        request: FlashRequest,
        cancel: CancellationToken,
    ) -> FlashResult {
        let span = info_span!(
            "flash",
            device = %request.device_class(),
            port = %request.port_path(),
        );
        self.run(request, cancel).instrument(span).await
    }

    async fn run(&self, request: FlashRequest, cancel: CancellationToken) -> FlashResult {
        ensure_readable(request.artifact_path()).await?;

        let port = request.port_path();
        let _lease = self.leases.try_acquire(port).ok_or_else(|| {
            FlashFailure::new(
                FlashErrorKind::PortBusy,
                format!("Serial port {port} is busy with another flash operation"),
            )
        })?;

        let spec = self.resolver.resolve(&request);
        info!(command = %spec, "Starting programmer");

        let outcome = self.executor.execute(&spec, cancel).await;
        let result = classify(request.device_class(), spec.program(), &outcome);

        match &result {
            Ok(_) => info!("Flash completed"),
            Err(failure) => warn!(kind = %failure.kind, "Flash failed: {}", failure.detail),
        }
        result
    }
}

/// The artifact must be an existing regular file that opens for reading.
async fn ensure_readable(path: &Path) -> Result<(), FlashFailure> {
    let unreadable = || {
        FlashFailure::new(
            FlashErrorKind::ArtifactUnreadable,
            format!("File not found or not readable: {}", path.display()),
        )
    };

    let metadata = tokio::fs::metadata(path).await.map_err(|_| unreadable())?;
    if !metadata.is_file() {
        return Err(unreadable());
    }
    tokio::fs::File::open(path)
        .await
        .map_err(|_| unreadable())?;
    Ok(())
}

/// Attach business meaning to a raw process outcome.
///
/// Pure: the same inputs always give the same result. This is the only place
/// exit codes are interpreted; transports must not repeat it.
pub fn classify(device_class: DeviceClass, program: &str, outcome: &ProcessOutcome) -> FlashResult {
    match outcome {
        ProcessOutcome::Completed {
            exit_code: 0,
            stdout,
            ..
        } => Ok(FlashSuccess {
            message: if stdout.is_empty() {
                DEFAULT_SUCCESS_MESSAGE.to_string()
            } else {
                stdout.clone()
            },
            raw_output: stdout.clone(),
        }),
        ProcessOutcome::Completed {
            exit_code,
            stdout,
            stderr,
        } => Err(FlashFailure::new(
            FlashErrorKind::ProgrammerExitedNonZero,
            with_output(
                format!("Failed to load firmware (exit code {exit_code})"),
                stderr,
                stdout,
            ),
        )),
        ProcessOutcome::SpawnFailed(SpawnFailure::NotFound) => Err(FlashFailure::new(
            FlashErrorKind::ProgrammerNotInstalled,
            format!(
                "Command '{program}' not found. Please install {program} \
                 (required for {device_class} devices)"
            ),
        )),
        ProcessOutcome::SpawnFailed(SpawnFailure::Os(message)) => Err(FlashFailure::new(
            FlashErrorKind::SystemError,
            format!("Failed to start '{program}': {message}"),
        )),
        ProcessOutcome::WaitFailed(message) => Err(FlashFailure::new(
            FlashErrorKind::SystemError,
            format!("Lost track of '{program}' while it was running: {message}"),
        )),
        ProcessOutcome::TimedOut {
            after,
            stdout,
            stderr,
        } => Err(FlashFailure::new(
            FlashErrorKind::TimedOut,
            with_output(
                format!(
                    "'{program}' did not finish within {}s and was terminated",
                    after.as_secs()
                ),
                stderr,
                stdout,
            ),
        )),
        ProcessOutcome::Cancelled => Err(FlashFailure::new(
            FlashErrorKind::Cancelled,
            format!("Flash cancelled before '{program}' finished; the programmer was terminated"),
        )),
    }
}

/// Append the preferred stream, or `fallback` when it is empty, to a headline.
fn with_output(headline: String, preferred: &str, fallback: &str) -> String {
    let output = if preferred.is_empty() {
        fallback
    } else {
        preferred
    };
    let output = output.trim_end();
    if output.trim().is_empty() {
        headline
    } else {
        format!("{headline}: {output}")
    }
}
