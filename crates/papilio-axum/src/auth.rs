//! Optional API key check for `/api/*`.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::HttpError;
use crate::state::AppState;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Require `X-API-Key` to match the configured key. Passes everything
/// through when no key is configured.
pub async fn require_api_key(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(req).await;
    };

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    if provided == Some(expected) {
        next.run(req).await
    } else {
        tracing::warn!(
            path = %req.uri().path(),
            "Unauthorized API request - missing or invalid API key"
        );
        HttpError::Unauthorized.into_response()
    }
}
