#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

pub mod artifact;
pub mod domain;
pub mod leases;
pub mod ports;
pub mod resolver;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use artifact::{ArtifactCheck, ArtifactDetection, Confidence};
pub use domain::{
    CommandSpec, DEFAULT_FLASH_ADDRESS, DeviceClass, FlashErrorKind, FlashFailure, FlashRequest,
    FlashResult, FlashSuccess, ProcessOutcome, SpawnFailure, UnknownDeviceClass,
};
pub use leases::{PortLease, PortLeases};
pub use ports::{PortListError, ProcessExecutor, SerialPortInfo, SerialPortLister};
pub use resolver::{CommandResolver, PROGRAMMERS, ProgrammerProfile};
pub use services::{FlashOrchestrator, classify};
pub use settings::{
    DEFAULT_FLASH_TIMEOUT_SECS, DEFAULT_HTTP_PORT, DEFAULT_MAX_UPLOAD_BYTES, Settings,
    SettingsError, validate_settings,
};

// Re-exported so adapters share the exact token type the core expects
pub use tokio_util::sync::CancellationToken;
