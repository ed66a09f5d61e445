use axum::Json;

use crate::dto::HealthResponse;

pub const SERVICE_NAME: &str = "papilio-loader-web";

/// Liveness probe. Never requires an API key.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME,
    })
}
