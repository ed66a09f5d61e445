//! Route definitions and router construction.
//!
//! # Path Layout
//! - `POST /api/upload/fpga`, `POST /api/upload/esp32`: multipart upload + flash
//! - `GET /api/ports`: serial port listing
//! - `GET /api/health`: liveness, exempt from the API key
//! - everything else: the static UI, when configured

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::auth::require_api_key;
use crate::bootstrap::{AxumContext, CorsConfig};
use crate::handlers;
use crate::state::AppState;

/// Room for the non-file multipart fields and boundaries.
const FORM_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Build CORS layer from configuration.
fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    match config {
        CorsConfig::AllowAll => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsConfig::AllowOrigins(origins) => {
            let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

/// Build all API routes without `/api` prefix (for nesting under /api).
pub(crate) fn api_routes(state: &AppState) -> Router<AppState> {
    let body_limit = usize::try_from(state.uploads.max_bytes().saturating_add(FORM_OVERHEAD_BYTES))
        .unwrap_or(usize::MAX);

    let protected = Router::new()
        .route("/upload/fpga", post(handlers::flash::upload_fpga))
        .route("/upload/esp32", post(handlers::flash::upload_esp32))
        .route("/ports", get(handlers::ports::list))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(state),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(handlers::health::health))
        .merge(protected)
        .layer(DefaultBodyLimit::max(body_limit))
}

/// Create the main Axum router with all API routes.
///
/// For serving the browser UI as well, use [`create_spa_router`].
pub fn create_router(ctx: AxumContext, cors_config: &CorsConfig) -> Router {
    let state: AppState = Arc::new(ctx);
    let cors = build_cors_layer(cors_config);

    Router::new()
        .nest("/api", api_routes(&state).with_state(state).layer(cors))
        .layer(TraceLayer::new_for_http())
}

/// Create a router with API routes and static asset serving.
///
/// Unknown non-API paths fall back to `index.html`.
pub fn create_spa_router<P: AsRef<Path>>(
    ctx: AxumContext,
    static_dir: P,
    cors_config: &CorsConfig,
) -> Router {
    let static_path = static_dir.as_ref();
    let index_path = static_path.join("index.html");
    let serve_dir = ServeDir::new(static_path).fallback(ServeFile::new(index_path));

    create_router(ctx, cors_config).fallback_service(serve_dir)
}
