//! Subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use papilio_core::{DeviceClass, Settings};

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server (upload API and optional web UI)
    Web(WebArgs),

    /// Run the MCP server on stdin/stdout
    Mcp,

    /// Run the HTTP server and the MCP server in one process
    Both(WebArgs),

    /// List serial ports visible to this machine
    Ports,

    /// Flash one file and exit
    Flash(FlashArgs),
}

/// Options for the HTTP server.
#[derive(Debug, Clone, Default, Args)]
pub struct WebArgs {
    /// Address to bind to
    #[arg(long = "bind", value_name = "ADDR")]
    pub bind_address: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory with the built web UI
    #[arg(long, value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    /// Require this key in the X-API-Key header
    #[arg(long, env = "PAPILIO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Allowed CORS origin (repeatable; default allows any)
    #[arg(long = "cors-origin", value_name = "ORIGIN")]
    pub cors_origins: Vec<String>,
}

impl WebArgs {
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(bind) = &self.bind_address {
            settings.bind_address.clone_from(bind);
        }
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(dir) = &self.static_dir {
            settings.static_dir = Some(dir.clone());
        }
        if let Some(key) = self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
            settings.api_key = Some(key.to_string());
        }
        if !self.cors_origins.is_empty() {
            settings.cors_origins.clone_from(&self.cors_origins);
        }
    }
}

/// Options for a one-shot flash.
#[derive(Debug, Clone, Args)]
pub struct FlashArgs {
    /// Target device: fpga, or esp32 / microcontroller
    pub device: DeviceClass,

    /// Serial port the board is attached to
    #[arg(short, long)]
    pub port: String,

    /// Bitstream or firmware image
    pub file: PathBuf,

    /// Flash address for ESP32 images (default 0x1000)
    #[arg(short, long)]
    pub address: Option<String>,
}
