//! Transport-facing flash results.
//!
//! `FlashResult` is the only value that crosses from the core into a
//! transport adapter. Adapters render it; they never re-derive meaning from
//! raw exit codes.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message used when a programmer succeeds without printing anything.
pub(crate) const DEFAULT_SUCCESS_MESSAGE: &str = "Firmware loaded successfully";

/// Result of one flash request.
pub type FlashResult = Result<FlashSuccess, FlashFailure>;

/// A flash that the programmer reported as successful.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashSuccess {
    /// Programmer stdout, or a default message when stdout was blank.
    pub message: String,
    /// Programmer stdout exactly as captured.
    pub raw_output: String,
}

/// Failure taxonomy for flash requests.
///
/// Every kind is terminal for its request; none is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlashErrorKind {
    /// The firmware file does not exist or cannot be read.
    ArtifactUnreadable,
    /// The external programmer executable could not be located.
    ProgrammerNotInstalled,
    /// The programmer ran and exited with a non-zero code.
    ProgrammerExitedNonZero,
    /// Any other process-launch failure.
    SystemError,
    /// Another flash currently holds the requested serial port.
    PortBusy,
    /// The programmer exceeded the configured time limit.
    TimedOut,
    /// The caller went away before the programmer finished.
    Cancelled,
}

impl FlashErrorKind {
    /// Stable discriminant for wire formats and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ArtifactUnreadable => "ARTIFACT_UNREADABLE",
            Self::ProgrammerNotInstalled => "PROGRAMMER_NOT_INSTALLED",
            Self::ProgrammerExitedNonZero => "PROGRAMMER_EXITED_NON_ZERO",
            Self::SystemError => "SYSTEM_ERROR",
            Self::PortBusy => "PORT_BUSY",
            Self::TimedOut => "TIMED_OUT",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for FlashErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed flash, with enough detail to act on without server logs.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{detail}")]
pub struct FlashFailure {
    pub kind: FlashErrorKind,
    pub detail: String,
}

impl FlashFailure {
    pub fn new(kind: FlashErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_serializes_kind_as_screaming_snake() {
        let failure = FlashFailure::new(FlashErrorKind::ProgrammerNotInstalled, "missing");
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["kind"], "PROGRAMMER_NOT_INSTALLED");
        assert_eq!(json["detail"], "missing");
        assert_eq!(failure.to_string(), "missing");
    }

    #[test]
    fn kind_display_matches_serde_name() {
        for kind in [
            FlashErrorKind::ArtifactUnreadable,
            FlashErrorKind::ProgrammerExitedNonZero,
            FlashErrorKind::SystemError,
            FlashErrorKind::PortBusy,
            FlashErrorKind::TimedOut,
            FlashErrorKind::Cancelled,
        ] {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.as_str());
        }
    }

    #[test]
    fn success_uses_camel_case_fields() {
        let success = FlashSuccess {
            message: "ok".to_string(),
            raw_output: String::new(),
        };
        let json = serde_json::to_value(&success).unwrap();
        assert!(json.get("rawOutput").is_some());
    }
}
