//! Device class → programmer command resolution.
//!
//! The mapping is a static table of [`ProgrammerProfile`]s. Each profile
//! names the programmer executable and an argument template; resolving a
//! request substitutes the request's values into the template. Adding a
//! device class means adding one table entry.

use std::collections::HashMap;

use crate::domain::{CommandSpec, DeviceClass, FlashRequest};

/// One token of an argument template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgToken {
    /// Passed through verbatim.
    Literal(&'static str),
    /// The artifact path.
    Artifact,
    /// The serial port path.
    Port,
    /// The flash address, defaulted when the request has none.
    Address,
}

/// Programmer executable and argument template for one device class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgrammerProfile {
    pub device_class: DeviceClass,
    pub program: &'static str,
    pub template: &'static [ArgToken],
}

use ArgToken::{Address, Artifact, Literal, Port};

/// The programmer table. Argument contracts here are fixed by the external
/// tools; changing them means changing outcome classification too.
pub const PROGRAMMERS: &[ProgrammerProfile] = &[
    ProgrammerProfile {
        device_class: DeviceClass::Fpga,
        program: "papilio-prog",
        template: &[
            Literal("-v"),
            Literal("-f"),
            Artifact,
            Literal("-b"),
            Port,
        ],
    },
    ProgrammerProfile {
        device_class: DeviceClass::Microcontroller,
        program: "esptool.py",
        template: &[
            Literal("--chip"),
            Literal("esp32"),
            Literal("--port"),
            Port,
            Literal("--baud"),
            Literal("921600"),
            Literal("write_flash"),
            Literal("-z"),
            Address,
            Artifact,
        ],
    },
];

/// Look up the table entry for a device class.
pub fn profile_for(device_class: DeviceClass) -> &'static ProgrammerProfile {
    PROGRAMMERS
        .iter()
        .find(|p| p.device_class == device_class)
        .unwrap_or_else(|| unreachable!("no programmer profile for {device_class}"))
}

/// Pure mapping from a [`FlashRequest`] to a [`CommandSpec`].
///
/// Executable overrides replace only the program; the argument template
/// always comes from [`PROGRAMMERS`].
#[derive(Debug, Clone, Default)]
pub struct CommandResolver {
    overrides: HashMap<DeviceClass, String>,
}

impl CommandResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `program` instead of the default executable for `device_class`.
    #[must_use]
    pub fn with_program(mut self, device_class: DeviceClass, program: impl Into<String>) -> Self {
        self.overrides.insert(device_class, program.into());
        self
    }

    /// Executable that will be launched for `device_class`.
    pub fn program_for(&self, device_class: DeviceClass) -> &str {
        self.overrides
            .get(&device_class)
            .map_or(profile_for(device_class).program, String::as_str)
    }

    pub fn resolve(&self, request: &FlashRequest) -> CommandSpec {
        let profile = profile_for(request.device_class());
        let artifact = request.artifact_path().to_string_lossy();

        let args = profile.template.iter().map(|token| match token {
            Literal(s) => (*s).to_string(),
            Artifact => artifact.to_string(),
            Port => request.port_path().to_string(),
            Address => request.effective_flash_address().to_string(),
        });

        CommandSpec::new(self.program_for(request.device_class()), args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_device_class_has_exactly_one_profile() {
        for class in DeviceClass::ALL {
            let count = PROGRAMMERS
                .iter()
                .filter(|p| p.device_class == class)
                .count();
            assert_eq!(count, 1, "{class}");
        }
    }

    #[test]
    fn fpga_arguments_follow_fixed_order() {
        let req = FlashRequest::new(DeviceClass::Fpga, "/dev/ttyUSB0", "/tmp/design.bit")
            .with_flash_address(Some("0x2000".to_string()));
        let spec = CommandResolver::new().resolve(&req);

        assert_eq!(spec.program(), "papilio-prog");
        assert_eq!(
            spec.args(),
            ["-v", "-f", "/tmp/design.bit", "-b", "/dev/ttyUSB0"]
        );
    }

    #[test]
    fn microcontroller_defaults_address() {
        let req = FlashRequest::new(DeviceClass::Microcontroller, "COM3", "/tmp/app.bin");
        let spec = CommandResolver::new().resolve(&req);

        assert_eq!(spec.program(), "esptool.py");
        assert_eq!(
            spec.args(),
            [
                "--chip",
                "esp32",
                "--port",
                "COM3",
                "--baud",
                "921600",
                "write_flash",
                "-z",
                "0x1000",
                "/tmp/app.bin"
            ]
        );
    }

    #[test]
    fn microcontroller_uses_requested_address() {
        let req = FlashRequest::new(DeviceClass::Microcontroller, "COM3", "/tmp/app.bin")
            .with_flash_address(Some("0x10000".to_string()));
        let spec = CommandResolver::new().resolve(&req);

        let tail = &spec.args()[spec.args().len() - 4..];
        assert_eq!(tail, ["write_flash", "-z", "0x10000", "/tmp/app.bin"]);
    }

    #[test]
    fn override_changes_program_only() {
        let resolver = CommandResolver::new().with_program(DeviceClass::Fpga, "/opt/bin/papilio-prog");
        let req = FlashRequest::new(DeviceClass::Fpga, "/dev/ttyUSB1", "/tmp/a.bit");
        let spec = resolver.resolve(&req);

        assert_eq!(spec.program(), "/opt/bin/papilio-prog");
        assert_eq!(spec.args(), ["-v", "-f", "/tmp/a.bit", "-b", "/dev/ttyUSB1"]);
        assert_eq!(resolver.program_for(DeviceClass::Microcontroller), "esptool.py");
    }

    #[test]
    fn paths_with_spaces_stay_one_argument() {
        let req = FlashRequest::new(DeviceClass::Fpga, "/dev/ttyUSB0", "/tmp/my design; rm -rf.bit");
        let spec = CommandResolver::new().resolve(&req);
        assert_eq!(spec.args()[2], "/tmp/my design; rm -rf.bit");
        assert_eq!(spec.args().len(), 5);
    }
}
