//! Serial port enumeration port.
//!
//! Listing ports is a passthrough query used by both transports; it carries
//! no orchestration logic.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A serial port visible to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerialPortInfo {
    /// OS path or name (`/dev/ttyUSB0`, `COM3`).
    pub path: String,
    pub manufacturer: Option<String>,
    pub serial_number: Option<String>,
    /// USB vendor id as four lowercase hex digits.
    pub vendor_id: Option<String>,
    /// USB product id as four lowercase hex digits.
    pub product_id: Option<String>,
    pub product: Option<String>,
}

impl SerialPortInfo {
    /// A port with only its path known.
    pub fn bare(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            manufacturer: None,
            serial_number: None,
            vendor_id: None,
            product_id: None,
            product: None,
        }
    }
}

/// Enumeration failed.
#[derive(Debug, Clone, Error)]
#[error("Failed to list serial ports: {0}")]
pub struct PortListError(pub String);

/// Lists serial ports.
pub trait SerialPortLister: Send + Sync {
    fn list_ports(&self) -> Result<Vec<SerialPortInfo>, PortListError>;
}
