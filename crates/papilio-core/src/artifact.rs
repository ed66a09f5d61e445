//! Firmware artifact sniffing.
//!
//! Looks at the first bytes of an artifact to guess which device class it
//! was built for. The result is advisory: transports surface a warning when
//! the guess contradicts the requested device, but the flash still runs.

use std::path::Path;

use serde::Serialize;
use tokio::io::AsyncReadExt;

use crate::domain::DeviceClass;

/// Number of leading bytes inspected.
pub const HEADER_LEN: usize = 32;

/// First byte of every ESP32 application image.
const ESP_IMAGE_MAGIC: u8 = 0xE9;

/// Xilinx `.bit` files open with a fixed-length field header.
const XILINX_BIT_HEADER: [u8; 13] = [
    0x00, 0x09, 0x0F, 0xF0, 0x0F, 0xF0, 0x0F, 0xF0, 0x0F, 0xF0, 0x00, 0x00, 0x01,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// What the header looks like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactDetection {
    /// `None` when no known pattern matched.
    pub detected: Option<DeviceClass>,
    pub confidence: Confidence,
    pub reason: &'static str,
}

/// Guess the device class from an artifact header.
pub fn detect(header: &[u8]) -> ArtifactDetection {
    if header.len() < HEADER_LEN {
        return ArtifactDetection {
            detected: None,
            confidence: Confidence::Low,
            reason: "File too small to identify",
        };
    }
    let header = &header[..HEADER_LEN];

    if header[0] == ESP_IMAGE_MAGIC {
        return ArtifactDetection {
            detected: Some(DeviceClass::Microcontroller),
            confidence: Confidence::High,
            reason: "ESP32 image magic byte (0xE9) detected at start",
        };
    }

    if header.starts_with(&XILINX_BIT_HEADER) {
        return ArtifactDetection {
            detected: Some(DeviceClass::Fpga),
            confidence: Confidence::High,
            reason: "Xilinx bitstream header detected",
        };
    }

    // Gowin bitstreams lead with 0xFF padding followed by a sync word.
    let padding = header[..22].iter().filter(|&&b| b == 0xFF).count();
    if padding >= 20 {
        let has_sync = header
            .windows(2)
            .any(|w| w[0] == 0xA5 && matches!(w[1], 0xC3 | 0x5C));
        return if has_sync {
            ArtifactDetection {
                detected: Some(DeviceClass::Fpga),
                confidence: Confidence::High,
                reason: "Gowin FPGA bitstream pattern detected (0xFF padding + sync word)",
            }
        } else {
            ArtifactDetection {
                detected: Some(DeviceClass::Fpga),
                confidence: Confidence::Medium,
                reason: "FPGA bitstream pattern detected (0xFF padding)",
            }
        };
    }

    ArtifactDetection {
        detected: None,
        confidence: Confidence::Low,
        reason: "No recognizable pattern detected",
    }
}

/// Outcome of comparing a detection with the requested device class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactCheck {
    pub detection: ArtifactDetection,
    /// Set only when the artifact looks like firmware for the other class.
    pub warning: Option<String>,
}

impl ArtifactCheck {
    pub const fn is_mismatch(&self) -> bool {
        self.warning.is_some()
    }
}

/// Compare an artifact header against the device it is about to be flashed to.
///
/// Unrecognized artifacts pass without a warning.
pub fn check(header: &[u8], intended: DeviceClass) -> ArtifactCheck {
    let detection = detect(header);
    let warning = match detection.detected {
        Some(detected) if detected != intended => Some(format!(
            "This appears to be {}, but it is being flashed as {}",
            detected.artifact_noun(),
            intended.artifact_noun()
        )),
        _ => None,
    };
    ArtifactCheck { detection, warning }
}

/// Read the header of `path` and [`check`] it.
pub async fn inspect_file(path: &Path, intended: DeviceClass) -> std::io::Result<ArtifactCheck> {
    let file = tokio::fs::File::open(path).await?;
    let mut header = Vec::with_capacity(HEADER_LEN);
    file.take(HEADER_LEN as u64)
        .read_to_end(&mut header)
        .await?;
    Ok(check(&header, intended))
}
