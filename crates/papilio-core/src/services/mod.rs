//! Core services.
//!
//! `FlashOrchestrator` is the single entry point transports use; it owns
//! outcome classification so adapters never interpret exit codes.

mod orchestrator;

pub use orchestrator::{FlashOrchestrator, classify};
