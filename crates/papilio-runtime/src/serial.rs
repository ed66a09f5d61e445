//! Serial port enumeration via the `serialport` crate.

use papilio_core::{PortListError, SerialPortInfo, SerialPortLister};
use serialport::{SerialPortType, UsbPortInfo};
use tracing::debug;

/// Lists the host's serial ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialPortEnumerator;

impl SerialPortEnumerator {
    pub const fn new() -> Self {
        Self
    }
}

impl SerialPortLister for SerialPortEnumerator {
    fn list_ports(&self) -> Result<Vec<SerialPortInfo>, PortListError> {
        let ports = serialport::available_ports().map_err(|e| PortListError(e.to_string()))?;
        debug!(count = ports.len(), "Enumerated serial ports");
        Ok(ports.into_iter().map(port_info).collect())
    }
}

fn port_info(port: serialport::SerialPortInfo) -> SerialPortInfo {
    match port.port_type {
        SerialPortType::UsbPort(usb) => from_usb(port.port_name, usb),
        _ => SerialPortInfo::bare(port.port_name),
    }
}

fn from_usb(path: String, usb: UsbPortInfo) -> SerialPortInfo {
    SerialPortInfo {
        path,
        manufacturer: usb.manufacturer,
        serial_number: usb.serial_number,
        vendor_id: Some(format!("{:04x}", usb.vid)),
        product_id: Some(format!("{:04x}", usb.pid)),
        product: usb.product,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usb_ids_are_four_hex_digits() {
        let info = port_info(serialport::SerialPortInfo {
            port_name: "/dev/ttyUSB0".to_string(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid: 0x0403,
                pid: 0x6010,
                serial_number: Some("FT123".to_string()),
                manufacturer: Some("FTDI".to_string()),
                product: Some("Papilio DUO".to_string()),
            }),
        });

        assert_eq!(info.path, "/dev/ttyUSB0");
        assert_eq!(info.vendor_id.as_deref(), Some("0403"));
        assert_eq!(info.product_id.as_deref(), Some("6010"));
        assert_eq!(info.manufacturer.as_deref(), Some("FTDI"));
        assert_eq!(info.serial_number.as_deref(), Some("FT123"));
    }

    #[test]
    fn non_usb_ports_carry_only_the_path() {
        let info = port_info(serialport::SerialPortInfo {
            port_name: "/dev/ttyS0".to_string(),
            port_type: SerialPortType::Unknown,
        });
        assert_eq!(info, SerialPortInfo::bare("/dev/ttyS0"));
    }
}
