//! Per-port mutual exclusion for flash sessions.
//!
//! At most one programmer may drive a physical serial port at a time. A
//! [`PortLease`] is taken before the command is resolved and released when
//! the guard drops, whatever the outcome.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

/// Shared registry of serial ports currently in use.
///
/// Cloning is cheap and every clone sees the same registry.
#[derive(Debug, Clone, Default)]
pub struct PortLeases {
    held: Arc<Mutex<HashSet<String>>>,
}

impl PortLeases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to take the port. Returns `None` if another request holds it.
    pub fn try_acquire(&self, port_path: &str) -> Option<PortLease> {
        let key = port_key(port_path);
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(key.clone()) {
            debug!(port = %key, "Port lease contended");
            return None;
        }
        debug!(port = %key, "Port lease acquired");
        Some(PortLease {
            key,
            held: Arc::clone(&self.held),
        })
    }

    /// Whether the port is currently leased.
    pub fn is_held(&self, port_path: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&port_key(port_path))
    }
}

/// Exclusive use of one serial port. Released on drop.
#[derive(Debug)]
pub struct PortLease {
    key: String,
    held: Arc<Mutex<HashSet<String>>>,
}

impl PortLease {
    pub fn port(&self) -> &str {
        &self.key
    }
}

impl Drop for PortLease {
    fn drop(&mut self) {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
        debug!(port = %self.key, "Port lease released");
    }
}

/// Windows device names are case-insensitive (`com3` is `COM3`).
fn port_key(port_path: &str) -> String {
    let trimmed = port_path.trim();
    if cfg!(windows) {
        trimmed.to_ascii_uppercase()
    } else {
        trimmed.to_string()
    }
}
