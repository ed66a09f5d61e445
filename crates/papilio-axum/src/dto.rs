//! Response bodies.

use papilio_core::SerialPortInfo;
use serde::Serialize;

/// Reported when a port has no manufacturer string.
pub const UNKNOWN_MANUFACTURER: &str = "Unknown";

/// Body of a successful flash.
#[derive(Debug, Clone, Serialize)]
pub struct FlashResponse {
    pub success: bool,
    /// `"<artifact> loaded successfully to <port>"`.
    pub message: String,
    /// Programmer output (or the default success message).
    pub details: String,
    /// Set when the artifact looks like firmware for the other device class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDto {
    pub path: String,
    pub manufacturer: String,
    pub serial_number: Option<String>,
    pub vendor_id: Option<String>,
    pub product_id: Option<String>,
}

impl From<SerialPortInfo> for PortDto {
    fn from(info: SerialPortInfo) -> Self {
        Self {
            path: info.path,
            manufacturer: info
                .manufacturer
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| UNKNOWN_MANUFACTURER.to_string()),
            serial_number: info.serial_number,
            vendor_id: info.vendor_id,
            product_id: info.product_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PortsResponse {
    pub success: bool,
    pub ports: Vec<PortDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_manufacturer_becomes_unknown() {
        let dto = PortDto::from(SerialPortInfo::bare("COM3"));
        assert_eq!(dto.manufacturer, UNKNOWN_MANUFACTURER);

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["path"], "COM3");
        assert!(json["serialNumber"].is_null());
    }

    #[test]
    fn warning_is_omitted_when_absent() {
        let body = FlashResponse {
            success: true,
            message: "FPGA bitfile loaded successfully to COM3".to_string(),
            details: "done".to_string(),
            warning: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("warning").is_none());
    }
}
