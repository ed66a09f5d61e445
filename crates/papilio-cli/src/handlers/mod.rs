//! Command handlers. Each receives services already built from settings.

pub mod flash;
pub mod ports;
pub mod serve;
