//! Root parser and global options.

use std::path::PathBuf;

use clap::Parser;
use papilio_core::Settings;

use crate::commands::Commands;

/// Flash Papilio FPGA boards and ESP32 modules over HTTP, MCP or the shell.
#[derive(Debug, Parser)]
#[command(name = "papilio-loader")]
#[command(version)]
pub struct Cli {
    /// Answer flash requests without launching any programmer
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Programmer time limit in seconds (0 disables it)
    #[arg(long = "timeout", value_name = "SECS", global = true)]
    pub timeout_secs: Option<u64>,

    /// Path to the papilio-prog executable
    #[arg(long, value_name = "PATH", global = true)]
    pub fpga_programmer: Option<PathBuf>,

    /// Path to the esptool.py executable
    #[arg(long, value_name = "PATH", global = true)]
    pub mcu_programmer: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Layer command-line flags over settings loaded from the environment.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if self.simulate {
            settings.simulate = true;
        }
        if let Some(secs) = self.timeout_secs {
            settings.flash_timeout_secs = secs;
        }
        if let Some(path) = &self.fpga_programmer {
            settings.fpga_programmer = Some(path.to_string_lossy().into_owned());
        }
        if let Some(path) = &self.mcu_programmer {
            settings.mcu_programmer = Some(path.to_string_lossy().into_owned());
        }
        if let Commands::Web(web) | Commands::Both(web) = &self.command {
            web.apply_overrides(settings);
        }
    }

    /// Whether stdout is reserved for protocol frames.
    pub const fn stdout_is_protocol(&self) -> bool {
        matches!(self.command, Commands::Mcp | Commands::Both(_))
    }
}
