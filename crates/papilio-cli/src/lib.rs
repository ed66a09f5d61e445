#![doc = include_str!("../README.md")]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;

// Used by the binary target only
use dotenvy as _;

pub mod commands;
pub mod handlers;
pub mod logging;
pub mod parser;

pub use commands::{Commands, FlashArgs, WebArgs};
pub use parser::Cli;
