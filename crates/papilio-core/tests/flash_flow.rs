//! End-to-end flows through the public core API with a recording executor.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use papilio_core::{
    CancellationToken, CommandResolver, CommandSpec, DeviceClass, FlashErrorKind,
    FlashOrchestrator, FlashRequest, PortLeases, ProcessExecutor, ProcessOutcome, SpawnFailure,
};

/// Records every command it is asked to run and replays a fixed outcome.
struct RecordingExecutor {
    seen: Mutex<Vec<CommandSpec>>,
    outcome: ProcessOutcome,
}

impl RecordingExecutor {
    fn new(outcome: ProcessOutcome) -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            outcome,
        })
    }

    fn seen(&self) -> Vec<CommandSpec> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProcessExecutor for RecordingExecutor {
    async fn execute(&self, spec: &CommandSpec, _cancel: CancellationToken) -> ProcessOutcome {
        self.seen.lock().unwrap().push(spec.clone());
        self.outcome.clone()
    }
}

fn write_artifact(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, [0xE9, 0x03, 0x02, 0x20]).unwrap();
    path
}

#[tokio::test]
async fn esp32_flash_runs_esptool_once_with_default_address() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = write_artifact(&dir, "app.bin");
    let exec = RecordingExecutor::new(ProcessOutcome::completed(0, "Hash of data verified.", ""));
    let orch = FlashOrchestrator::new(CommandResolver::new(), exec.clone());

    let result = orch
        .flash(FlashRequest::new(DeviceClass::Microcontroller, "/dev/ttyUSB0", &artifact))
        .await
        .unwrap();

    assert_eq!(result.message, "Hash of data verified.");
    let seen = exec.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].program(), "esptool.py");
    assert_eq!(seen[0].args()[8], "0x1000");
    assert_eq!(seen[0].args()[9], artifact.to_string_lossy());
}

#[tokio::test]
async fn not_installed_programmer_is_reported_for_each_device_class() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = write_artifact(&dir, "design.bit");

    for (class, program) in [
        (DeviceClass::Fpga, "papilio-prog"),
        (DeviceClass::Microcontroller, "esptool.py"),
    ] {
        let exec = RecordingExecutor::new(ProcessOutcome::SpawnFailed(SpawnFailure::NotFound));
        let orch = FlashOrchestrator::new(CommandResolver::new(), exec);
        let failure = orch
            .flash(FlashRequest::new(class, "COM4", &artifact))
            .await
            .unwrap_err();

        assert_eq!(failure.kind, FlashErrorKind::ProgrammerNotInstalled);
        assert!(failure.detail.contains(&format!("Command '{program}' not found")));
    }
}

#[tokio::test]
async fn shared_leases_are_released_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = write_artifact(&dir, "design.bit");
    let leases = PortLeases::new();
    let exec = RecordingExecutor::new(ProcessOutcome::completed(2, "", "Device not found"));
    let orch = FlashOrchestrator::new(CommandResolver::new(), exec).with_leases(leases.clone());

    let failure = orch
        .flash(FlashRequest::new(DeviceClass::Fpga, "/dev/ttyUSB3", &artifact))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FlashErrorKind::ProgrammerExitedNonZero);
    assert_eq!(
        failure.detail,
        "Failed to load firmware (exit code 2): Device not found"
    );
    assert!(!leases.is_held("/dev/ttyUSB3"));
}

#[tokio::test]
async fn port_held_elsewhere_is_busy_without_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = write_artifact(&dir, "design.bit");
    let leases = PortLeases::new();
    let exec = RecordingExecutor::new(ProcessOutcome::completed(0, "", ""));
    let orch =
        FlashOrchestrator::new(CommandResolver::new(), exec.clone()).with_leases(leases.clone());

    let _held = leases.try_acquire("/dev/ttyUSB0").unwrap();
    let failure = orch
        .flash(FlashRequest::new(DeviceClass::Fpga, "/dev/ttyUSB0", &artifact))
        .await
        .unwrap_err();

    assert_eq!(failure.kind, FlashErrorKind::PortBusy);
    assert!(exec.seen().is_empty());
}
