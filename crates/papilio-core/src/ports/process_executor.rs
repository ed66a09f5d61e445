//! Process executor trait definition.
//!
//! This port runs one resolved programmer command to completion.
//! Implementations handle spawning, stream capture, time limits and
//! cancellation internally and always resolve to a [`ProcessOutcome`].

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{CommandSpec, ProcessOutcome};

/// Runs one external process per call.
///
/// Implementations must not retry, must not interpret arguments through a
/// shell, and must kill the child when `cancel` fires.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    async fn execute(&self, spec: &CommandSpec, cancel: CancellationToken) -> ProcessOutcome;
}
