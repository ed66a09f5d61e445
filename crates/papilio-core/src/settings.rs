//! Settings domain types, environment loading and validation.
//!
//! Values come from `PAPILIO_*` environment variables layered over
//! [`Settings::with_defaults`]. Adapters may override individual fields
//! (e.g. from CLI flags) before calling [`validate_settings`].

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DeviceClass;
use crate::resolver::CommandResolver;

/// Prefix shared by every environment variable read here.
pub const ENV_PREFIX: &str = "PAPILIO_";

/// Default HTTP port.
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Default upload limit (50 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Default programmer time limit.
pub const DEFAULT_FLASH_TIMEOUT_SECS: u64 = 600;

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address the HTTP server binds to.
    pub bind_address: String,

    /// HTTP port.
    pub port: u16,

    /// When set, `/api/*` routes other than health require `X-API-Key`.
    pub api_key: Option<String>,

    /// Allowed CORS origins. Empty or `*` allows any origin.
    pub cors_origins: Vec<String>,

    /// Largest accepted upload, in bytes.
    pub max_upload_bytes: u64,

    /// Where uploaded artifacts are staged while they are flashed.
    pub upload_dir: PathBuf,

    /// Optional directory with the browser UI.
    pub static_dir: Option<PathBuf>,

    /// Programmer time limit in seconds. `0` disables the limit.
    pub flash_timeout_secs: u64,

    /// Answer flash requests without launching any programmer.
    pub simulate: bool,

    /// Override for the `papilio-prog` executable.
    pub fpga_programmer: Option<String>,

    /// Override for the `esptool.py` executable.
    pub mcu_programmer: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Settings {
    /// Create settings with sensible defaults.
    pub fn with_defaults() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_HTTP_PORT,
            api_key: None,
            cors_origins: Vec::new(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_dir: std::env::temp_dir().join("papilio-uploads"),
            static_dir: None,
            flash_timeout_secs: DEFAULT_FLASH_TIMEOUT_SECS,
            simulate: false,
            fpga_programmer: None,
            mcu_programmer: None,
        }
    }

    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup.
    ///
    /// `lookup` receives full variable names (`PAPILIO_PORT`, ...). Blank
    /// values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut settings = Self::with_defaults();

        if let Some(v) = get("BIND_ADDRESS") {
            settings.bind_address = v;
        }
        if let Some(v) = get("PORT") {
            settings.port = parse_var("PORT", &v)?;
        }
        settings.api_key = get("API_KEY");
        if let Some(v) = get("CORS_ORIGINS") {
            settings.cors_origins = v
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(ToString::to_string)
                .collect();
        }
        if let Some(v) = get("MAX_UPLOAD_BYTES") {
            settings.max_upload_bytes = parse_var("MAX_UPLOAD_BYTES", &v)?;
        }
        if let Some(v) = get("UPLOAD_DIR") {
            settings.upload_dir = PathBuf::from(v);
        }
        settings.static_dir = get("STATIC_DIR").map(PathBuf::from);
        if let Some(v) = get("FLASH_TIMEOUT_SECS") {
            settings.flash_timeout_secs = parse_var("FLASH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("SIMULATE") {
            settings.simulate = parse_bool("SIMULATE", &v)?;
        }
        settings.fpga_programmer = get("FPGA_PROGRAMMER");
        settings.mcu_programmer = get("MCU_PROGRAMMER");

        validate_settings(&settings)?;
        Ok(settings)
    }

    /// Programmer time limit, `None` when disabled.
    pub const fn flash_timeout(&self) -> Option<Duration> {
        if self.flash_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.flash_timeout_secs))
        }
    }

    /// Whether CORS should allow any origin.
    pub fn cors_allows_any(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }

    /// Command resolver with any configured executable overrides applied.
    pub fn command_resolver(&self) -> CommandResolver {
        let mut resolver = CommandResolver::new();
        if let Some(program) = &self.fpga_programmer {
            resolver = resolver.with_program(DeviceClass::Fpga, program.clone());
        }
        if let Some(program) = &self.mcu_programmer {
            resolver = resolver.with_program(DeviceClass::Microcontroller, program.clone());
        }
        resolver
    }
}

/// Settings validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Invalid value for {ENV_PREFIX}{name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Bind address must be an IP address, got {0:?}")]
    InvalidBindAddress(String),

    #[error("Max upload size must be greater than zero")]
    ZeroUploadLimit,

    #[error("Upload directory cannot be empty")]
    EmptyUploadDir,
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, SettingsError> {
    value.parse().map_err(|_| SettingsError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::InvalidValue {
            name,
            value: value.to_string(),
        }),
    }
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if settings.bind_address.parse::<IpAddr>().is_err() {
        return Err(SettingsError::InvalidBindAddress(
            settings.bind_address.clone(),
        ));
    }

    if settings.max_upload_bytes == 0 {
        return Err(SettingsError::ZeroUploadLimit);
    }

    if settings.upload_dir.as_os_str().is_empty() {
        return Err(SettingsError::EmptyUploadDir);
    }

    Ok(())
}
