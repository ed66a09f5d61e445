//! Shared composition root for the transports.
//!
//! Wires the concrete executor and port lister behind the core's ports. The
//! HTTP and MCP adapters receive the same [`FlasherServices`], so running
//! both in one process shares a single port lease registry.

use std::sync::Arc;

use papilio_core::{FlashOrchestrator, ProcessExecutor, SerialPortLister, Settings};
use tracing::{info, warn};

use crate::process::{SimulatedExecutor, TokioProcessExecutor};
use crate::serial::SerialPortEnumerator;

/// Everything a transport needs to serve requests.
#[derive(Clone)]
pub struct FlasherServices {
    pub orchestrator: FlashOrchestrator,
    pub ports: Arc<dyn SerialPortLister>,
}

impl FlasherServices {
    pub fn new(orchestrator: FlashOrchestrator, ports: Arc<dyn SerialPortLister>) -> Self {
        Self {
            orchestrator,
            ports,
        }
    }
}

/// Build the services described by `settings`.
pub fn build_services(settings: &Settings) -> FlasherServices {
    let resolver = settings.command_resolver();

    let executor: Arc<dyn ProcessExecutor> = if settings.simulate {
        warn!("Simulation mode: no programmer will be launched");
        Arc::new(SimulatedExecutor::new())
    } else {
        Arc::new(TokioProcessExecutor::new().with_timeout(settings.flash_timeout()))
    };

    info!(
        fpga_programmer = %resolver.program_for(papilio_core::DeviceClass::Fpga),
        mcu_programmer = %resolver.program_for(papilio_core::DeviceClass::Microcontroller),
        timeout_secs = settings.flash_timeout_secs,
        "Flash services ready"
    );

    FlasherServices::new(
        FlashOrchestrator::new(resolver, executor),
        Arc::new(SerialPortEnumerator::new()),
    )
}
