//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `tokio::process` types in any signature
//! - Executors report outcomes as values, never as errors
//! - Traits are object-safe so adapters can hold `Arc<dyn ...>`

pub mod process_executor;
pub mod serial_ports;

pub use process_executor::ProcessExecutor;
pub use serial_ports::{PortListError, SerialPortInfo, SerialPortLister};
