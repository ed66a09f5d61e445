//! Programmer process execution.
//!
//! - `executor`: the real `TokioProcessExecutor`
//! - `simulated`: a no-spawn stand-in for bench testing
//! - `capture`: concurrent stdout/stderr accumulation
//! - `shutdown`: SIGTERM → SIGKILL escalation for a running child

mod capture;
mod executor;
mod shutdown;
mod simulated;

pub use executor::TokioProcessExecutor;
pub use shutdown::{DEFAULT_SHUTDOWN_GRACE, shutdown_child};
pub use simulated::SimulatedExecutor;
