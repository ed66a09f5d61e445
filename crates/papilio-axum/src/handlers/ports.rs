//! Serial port listing.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::dto::{PortDto, PortsResponse};
use crate::error::HttpError;
use crate::state::AppState;

/// List serial ports visible to the host.
pub async fn list(State(state): State<AppState>) -> Result<Json<PortsResponse>, HttpError> {
    let lister = Arc::clone(&state.ports);
    // Enumeration touches sysfs / the registry synchronously
    let ports = tokio::task::spawn_blocking(move || lister.list_ports())
        .await
        .map_err(|e| HttpError::Internal(format!("Port enumeration task failed: {e}")))??;

    Ok(Json(PortsResponse {
        success: true,
        ports: ports.into_iter().map(PortDto::from).collect(),
    }))
}
