//! The tool catalogue and argument parsing.

use papilio_core::DeviceClass;
use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

pub const LOAD_FPGA_BITFILE: &str = "load_fpga_bitfile";
pub const LOAD_ESP32_FIRMWARE: &str = "load_esp32_firmware";
pub const LIST_SERIAL_PORTS: &str = "list_serial_ports";

/// Tool entry returned by `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Every tool this server exposes.
pub fn catalogue() -> Vec<ToolDefinition> {
    let port = json!({
        "type": "string",
        "description": "Serial port path (e.g., /dev/ttyUSB0 or COM3)"
    });

    vec![
        ToolDefinition {
            name: LOAD_FPGA_BITFILE,
            description: "Load a bitfile (.bit) to a Papilio FPGA board",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "port": port.clone(),
                    "filepath": {
                        "type": "string",
                        "description": "Path to the .bit file to upload"
                    }
                },
                "required": ["port", "filepath"]
            }),
        },
        ToolDefinition {
            name: LOAD_ESP32_FIRMWARE,
            description: "Load firmware (.bin) to an ESP32 on a Papilio board",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "port": port,
                    "filepath": {
                        "type": "string",
                        "description": "Path to the .bin file to upload"
                    },
                    "address": {
                        "type": "string",
                        "description": "Flash address (default: 0x1000)",
                        "default": papilio_core::DEFAULT_FLASH_ADDRESS
                    }
                },
                "required": ["port", "filepath"]
            }),
        },
        ToolDefinition {
            name: LIST_SERIAL_PORTS,
            description: "List available serial ports for Papilio boards",
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
    ]
}

/// A parsed `tools/call`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    Flash {
        device: DeviceClass,
        port: String,
        filepath: String,
        address: Option<String>,
    },
    ListPorts,
}

/// Why a `tools/call` could not be turned into a [`ToolCall`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolCallError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("Argument '{0}' must be a string")]
    NotAString(&'static str),
}

impl ToolCall {
    /// Parse a tool name and its `arguments` object.
    pub fn parse(name: &str, arguments: &Map<String, Value>) -> Result<Self, ToolCallError> {
        let device = match name {
            LOAD_FPGA_BITFILE => DeviceClass::Fpga,
            LOAD_ESP32_FIRMWARE => DeviceClass::Microcontroller,
            LIST_SERIAL_PORTS => return Ok(Self::ListPorts),
            other => return Err(ToolCallError::UnknownTool(other.to_string())),
        };

        let port = required(arguments, "port")?;
        let filepath = required(arguments, "filepath")?;
        let address = if device.accepts_flash_address() {
            optional(arguments, "address")?
        } else {
            None
        };

        Ok(Self::Flash {
            device,
            port,
            filepath,
            address,
        })
    }
}

fn optional(args: &Map<String, Value>, key: &'static str) -> Result<Option<String>, ToolCallError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(ToolCallError::NotAString(key)),
    }
}

fn required(args: &Map<String, Value>, key: &'static str) -> Result<String, ToolCallError> {
    optional(args, key)?.ok_or(ToolCallError::MissingArgument(key))
}

/// `tools/call` result body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolResult {
    pub content: Vec<TextContent>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent::new(text)],
            is_error: false,
        }
    }

    /// `Error executing <tool>: <message>` with `isError` set.
    pub fn error(tool: &str, message: impl std::fmt::Display) -> Self {
        Self {
            content: vec![TextContent::new(format!("Error executing {tool}: {message}"))],
            is_error: true,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content.push(TextContent::new(text));
        self
    }
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            kind: "text",
            text: text.into(),
        }
    }
}
