//! HTTP handlers. Each delegates to the core; none interprets exit codes.

pub mod flash;
pub mod health;
pub mod ports;
