//! Core domain types.
//!
//! These types describe a single flash request from the moment a transport
//! hands it to the core until its result is rendered. None of them outlive
//! the request.
//!
//! # Structure
//!
//! - `device` - Device classes and the immutable `FlashRequest`
//! - `command` - The resolved external command (`CommandSpec`)
//! - `outcome` - What happened to the spawned process (`ProcessOutcome`)
//! - `result` - The transport-facing `FlashResult`

mod command;
mod device;
mod outcome;
mod result;

pub use command::CommandSpec;
pub use device::{DEFAULT_FLASH_ADDRESS, DeviceClass, FlashRequest, UnknownDeviceClass};
pub use outcome::{ProcessOutcome, SpawnFailure};
pub use result::{FlashErrorKind, FlashFailure, FlashResult, FlashSuccess};

pub(crate) use result::DEFAULT_SUCCESS_MESSAGE;
