use std::io::Write;

use anyhow::Result;
use papilio_core::SerialPortInfo;
use papilio_runtime::FlasherServices;

pub async fn execute(services: FlasherServices) -> Result<()> {
    let lister = services.ports;
    let ports = tokio::task::spawn_blocking(move || lister.list_ports()).await??;
    let mut out = std::io::stdout().lock();
    write_table(&mut out, &ports)?;
    Ok(())
}

/// One line per port: path, manufacturer, then USB ids when known.
pub fn write_table(out: &mut impl Write, ports: &[SerialPortInfo]) -> std::io::Result<()> {
    if ports.is_empty() {
        return writeln!(out, "No serial ports found");
    }
    let width = ports.iter().map(|p| p.path.len()).max().unwrap_or(0);
    for port in ports {
        let manufacturer = port
            .manufacturer
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or("Unknown");
        write!(out, "{:<width$}  {manufacturer}", port.path)?;
        if let (Some(vid), Some(pid)) = (&port.vendor_id, &port.product_id) {
            write!(out, " ({vid}:{pid})")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
