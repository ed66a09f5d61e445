#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod compose;
pub mod process;
pub mod serial;

pub use compose::{FlasherServices, build_services};
pub use process::{
    DEFAULT_SHUTDOWN_GRACE, SimulatedExecutor, TokioProcessExecutor, shutdown_child,
};
pub use serial::SerialPortEnumerator;
