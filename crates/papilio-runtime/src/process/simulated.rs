//! Executor that pretends every programmer succeeded.

use std::time::Duration;

use async_trait::async_trait;
use papilio_core::{CommandSpec, ProcessExecutor, ProcessOutcome};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Simulated programming delay.
const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Never spawns anything. Useful for exercising the transports on a machine
/// without programmers or boards attached.
#[derive(Debug, Clone)]
pub struct SimulatedExecutor {
    delay: Duration,
}

impl Default for SimulatedExecutor {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
        }
    }
}

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ProcessExecutor for SimulatedExecutor {
    async fn execute(&self, spec: &CommandSpec, cancel: CancellationToken) -> ProcessOutcome {
        info!(command = %spec, "Simulating programmer run");

        tokio::select! {
            () = tokio::time::sleep(self.delay) => {
                ProcessOutcome::completed(0, format!("[SIMULATION] Successfully ran {spec}"), "")
            }
            () = cancel.cancelled() => ProcessOutcome::Cancelled,
        }
    }
}
