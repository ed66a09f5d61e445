//! Axum server bootstrap - the HTTP adapter's composition root.
//!
//! Receives the shared [`FlasherServices`] and adds what only the web
//! adapter needs: the upload staging directory, the API key and CORS.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use papilio_core::{FlashOrchestrator, SerialPortLister, Settings};
use papilio_runtime::FlasherServices;
use tracing::info;

use crate::uploads::UploadStore;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_address: String,
    /// Port for the HTTP server.
    pub port: u16,
    /// Optional path to static assets for the browser UI.
    pub static_dir: Option<PathBuf>,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Required `X-API-Key` value, if any.
    pub api_key: Option<String>,
    /// Where uploads are staged.
    pub upload_dir: PathBuf,
    /// Largest accepted upload.
    pub max_upload_bytes: u64,
}

impl ServerConfig {
    /// Take the web-related values from application settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let cors = if settings.cors_allows_any() {
            CorsConfig::AllowAll
        } else {
            CorsConfig::AllowOrigins(settings.cors_origins.clone())
        };

        Self {
            bind_address: settings.bind_address.clone(),
            port: settings.port,
            static_dir: settings.static_dir.clone(),
            cors,
            api_key: settings.api_key.clone(),
            upload_dir: settings.upload_dir.clone(),
            max_upload_bytes: settings.max_upload_bytes,
        }
    }

    /// Set the static directory for UI serving.
    #[must_use]
    pub fn with_static_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(path.into());
        self
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }

    /// Require an API key on `/api/*` (except health).
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.bind_address, self.port))
    }
}

/// Application context for the Axum adapter.
pub struct AxumContext {
    /// Flash facade shared with any other transport in the process.
    pub orchestrator: FlashOrchestrator,
    /// Serial port enumeration.
    pub ports: Arc<dyn SerialPortLister>,
    /// Upload staging.
    pub uploads: UploadStore,
    /// Expected `X-API-Key`, if auth is enabled.
    pub api_key: Option<Arc<str>>,
}

/// Build the web context from shared services.
pub async fn bootstrap(services: FlasherServices, config: &ServerConfig) -> Result<AxumContext> {
    let uploads = UploadStore::prepare(&config.upload_dir, config.max_upload_bytes)
        .await
        .with_context(|| {
            format!(
                "Failed to prepare upload directory {}",
                config.upload_dir.display()
            )
        })?;

    info!(
        upload_dir = %uploads.dir().display(),
        max_upload_bytes = config.max_upload_bytes,
        auth_enabled = config.api_key.is_some(),
        "Axum bootstrap complete"
    );

    Ok(AxumContext {
        orchestrator: services.orchestrator,
        ports: services.ports,
        uploads,
        api_key: config.api_key.as_deref().map(Arc::from),
    })
}

/// Bootstrap and serve until Ctrl+C.
pub async fn start_server(services: FlasherServices, config: ServerConfig) -> Result<()> {
    use tokio::net::TcpListener;

    let addr = config.socket_addr()?;
    let ctx = bootstrap(services, &config).await?;

    // Choose router based on whether static serving is configured
    let app = if let Some(ref static_dir) = config.static_dir {
        info!("Serving static assets from: {}", static_dir.display());
        crate::routes::create_spa_router(ctx, static_dir, &config.cors)
    } else {
        crate::routes::create_router(ctx, &config.cors)
    };

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    if config.static_dir.is_some() {
        info!("Papilio web server (with UI) listening on http://{}", addr);
    } else {
        info!("Papilio web server (API only) listening on http://{}", addr);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutting down web server");
            }
        })
        .await?;
    Ok(())
}
