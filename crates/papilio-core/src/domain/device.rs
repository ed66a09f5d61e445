//! Device classes and flash requests.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Flash offset used for microcontroller images when the caller gives none.
pub const DEFAULT_FLASH_ADDRESS: &str = "0x1000";

/// Category of hardware target.
///
/// The set is closed: every variant has exactly one entry in the
/// programmer table used by [`CommandResolver`](crate::resolver::CommandResolver).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// FPGA bitstream target programmed by `papilio-prog`.
    Fpga,
    /// ESP32 microcontroller programmed through its serial bootloader.
    #[serde(alias = "esp32")]
    Microcontroller,
}

impl DeviceClass {
    /// Every supported device class, in table order.
    pub const ALL: [Self; 2] = [Self::Fpga, Self::Microcontroller];

    /// Wire name of the device class.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fpga => "fpga",
            Self::Microcontroller => "microcontroller",
        }
    }

    /// Human-readable name of the artifact this class consumes.
    pub const fn artifact_noun(self) -> &'static str {
        match self {
            Self::Fpga => "FPGA bitfile",
            Self::Microcontroller => "ESP32 firmware",
        }
    }

    /// Whether a flash address parameter means anything for this class.
    pub const fn accepts_flash_address(self) -> bool {
        matches!(self, Self::Microcontroller)
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown device class name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown device type: {0}")]
pub struct UnknownDeviceClass(pub String);

impl FromStr for DeviceClass {
    type Err = UnknownDeviceClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fpga" => Ok(Self::Fpga),
            "microcontroller" | "esp32" | "mcu" => Ok(Self::Microcontroller),
            other => Err(UnknownDeviceClass(other.to_string())),
        }
    }
}

/// A single request to flash an artifact onto a device.
///
/// Immutable once built. The port path is opaque to the core; the external
/// programmer is the one that validates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashRequest {
    device_class: DeviceClass,
    port_path: String,
    artifact_path: PathBuf,
    flash_address: Option<String>,
}

impl FlashRequest {
    /// Create a request with no flash address.
    pub fn new(
        device_class: DeviceClass,
        port_path: impl Into<String>,
        artifact_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            device_class,
            port_path: port_path.into(),
            artifact_path: artifact_path.into(),
            flash_address: None,
        }
    }

    /// Set the flash address. Blank values are treated as absent.
    #[must_use]
    pub fn with_flash_address(mut self, address: Option<String>) -> Self {
        self.flash_address = address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());
        self
    }

    pub const fn device_class(&self) -> DeviceClass {
        self.device_class
    }

    pub fn port_path(&self) -> &str {
        &self.port_path
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// The address the caller asked for, if any.
    pub fn flash_address(&self) -> Option<&str> {
        self.flash_address.as_deref()
    }

    /// The address that will actually be written to, applying the default.
    pub fn effective_flash_address(&self) -> &str {
        self.flash_address().unwrap_or(DEFAULT_FLASH_ADDRESS)
    }
}
