//! Axum-specific error types and mappings.
//!
//! Every failure leaves the server as `{ success: false, error, kind? }`.
//! Flash failures keep their `FlashErrorKind` as `kind`; adapter-level
//! rejections (missing fields, bad uploads, auth) carry no kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use papilio_core::{FlashErrorKind, FlashFailure, PortListError};
use serde::Serialize;
use thiserror::Error;

use crate::uploads::UploadError;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Bad request (missing or invalid input).
    #[error("{0}")]
    BadRequest(String),

    /// Upload larger than the configured limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Missing or wrong API key.
    #[error("Invalid or missing API key")]
    Unauthorized,

    /// The orchestrator rejected or failed the flash.
    #[error(transparent)]
    Flash(#[from] FlashFailure),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    /// Stable failure discriminant for client-side handling
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<FlashErrorKind>,
}

impl HttpError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Flash(failure) => match failure.kind {
                FlashErrorKind::PortBusy => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = match &self {
            Self::Flash(failure) => Some(failure.kind),
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{self}");
        } else {
            tracing::debug!(status = status.as_u16(), "{self}");
        }

        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            kind,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<UploadError> for HttpError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::TooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            UploadError::Storage(_) => Self::Internal(err.to_string()),
            UploadError::MissingFile
            | UploadError::BadExtension
            | UploadError::Malformed(_) => Self::BadRequest(err.to_string()),
        }
    }
}

impl From<PortListError> for HttpError {
    fn from(err: PortListError) -> Self {
        Self::Internal(err.to_string())
    }
}
