//! Upload-and-flash handlers.
//!
//! The staged artifact is owned by the handler future. It is deleted when
//! the handler returns, and if the client disconnects mid-flash the future
//! is dropped, which also kills the programmer and frees the port.

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use papilio_core::{DeviceClass, FlashRequest, artifact};
use tracing::{info, warn};

use crate::dto::FlashResponse;
use crate::error::HttpError;
use crate::state::AppState;
use crate::uploads::UploadError;

/// Upload a `.bit` file and program the FPGA.
pub async fn upload_fpga(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FlashResponse>, HttpError> {
    flash_upload(&state, DeviceClass::Fpga, multipart).await
}

/// Upload a `.bin` file and flash the ESP32. Accepts an optional `address`.
pub async fn upload_esp32(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FlashResponse>, HttpError> {
    flash_upload(&state, DeviceClass::Microcontroller, multipart).await
}

async fn flash_upload(
    state: &AppState,
    device: DeviceClass,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<FlashResponse>, HttpError> {
    let multipart = multipart.map_err(|e| HttpError::BadRequest(e.body_text()))?;
    let form = state.uploads.receive(multipart).await?;

    let staged = form.artifact.ok_or(UploadError::MissingFile)?;
    let port = form
        .port
        .ok_or_else(|| HttpError::BadRequest("Serial port not specified".to_string()))?;

    info!(
        device = %device,
        port = %port,
        file = %staged.original_name(),
        bytes = staged.size(),
        "Flash upload received"
    );

    let warning = match artifact::inspect_file(staged.path(), device).await {
        Ok(check) => check.warning,
        Err(e) => {
            warn!(error = %e, "Could not inspect uploaded artifact");
            None
        }
    };
    if let Some(warning) = &warning {
        warn!(file = %staged.original_name(), "{warning}");
    }

    let address = if device.accepts_flash_address() {
        form.address
    } else {
        None
    };
    let request = FlashRequest::new(device, port.as_str(), staged.path()).with_flash_address(address);
    let success = state.orchestrator.flash(request).await?;

    Ok(Json(FlashResponse {
        success: true,
        message: format!("{} loaded successfully to {port}", device.artifact_noun()),
        details: success.message,
        warning,
    }))
}
