//! Long-running transports.

use std::future::Future;

use anyhow::Result;
use papilio_axum::{ServerConfig, start_server};
use papilio_core::Settings;
use papilio_mcp::McpServer;
use papilio_runtime::FlasherServices;
use tracing::{info, warn};

pub async fn web(services: FlasherServices, settings: &Settings) -> Result<()> {
    start_server(services, ServerConfig::from_settings(settings)).await
}

pub async fn mcp(services: FlasherServices) -> Result<()> {
    McpServer::new(services).serve_stdio().await?;
    info!("MCP client disconnected");
    Ok(())
}

/// Run both transports over the same services.
///
/// The process lives as long as the web server; stdin closing (service
/// managers, `</dev/null`) only ends the MCP side.
pub async fn both(services: FlasherServices, settings: &Settings) -> Result<()> {
    outlive_mcp(web(services.clone(), settings), mcp(services)).await
}

async fn outlive_mcp<W, M>(web: W, mcp: M) -> Result<()>
where
    W: Future<Output = Result<()>>,
    M: Future<Output = Result<()>>,
{
    tokio::pin!(web);
    tokio::select! {
        result = &mut web => result,
        result = mcp => {
            match result {
                Ok(()) => info!("MCP input closed, web server keeps running"),
                Err(e) => warn!(error = %e, "MCP server stopped, web server keeps running"),
            }
            web.await
        }
    }
}
