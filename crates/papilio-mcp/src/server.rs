//! MCP stdio server.
//!
//! Requests are handled concurrently so `ping` and `tools/list` still answer
//! while a flash is running. Responses are written by a single writer task,
//! one JSON object per line. A `notifications/cancelled` for an in-flight
//! `tools/call` stops its programmer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use papilio_core::{FlashOrchestrator, FlashRequest, SerialPortLister, artifact};
use papilio_runtime::FlasherServices;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, Incoming, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
    METHOD_NOT_FOUND, PROTOCOL_VERSION, decode,
};
use crate::tools::{ToolCall, ToolCallError, ToolResult, catalogue};

/// Name reported in `initialize`.
pub const SERVER_NAME: &str = "papilio-loader-mcp";

/// Errors that end the server loop.
#[derive(Debug, Error)]
pub enum McpServerError {
    #[error("Failed to communicate over stdio: {0}")]
    Io(#[from] std::io::Error),

    #[error("Response writer stopped unexpectedly")]
    WriterGone,
}

/// In-flight requests by serialized JSON-RPC id.
type InFlight = Arc<Mutex<HashMap<String, CancellationToken>>>;

/// MCP server exposing the flashing tools.
#[derive(Clone)]
pub struct McpServer {
    orchestrator: FlashOrchestrator,
    ports: Arc<dyn SerialPortLister>,
    in_flight: InFlight,
}

impl McpServer {
    pub fn new(services: FlasherServices) -> Self {
        Self {
            orchestrator: services.orchestrator,
            ports: services.ports,
            in_flight: InFlight::default(),
        }
    }

    /// Serve on the process's stdin/stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<(), McpServerError> {
        info!("Papilio Loader MCP server running on stdio");
        self.serve(tokio::io::BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, answering on `writer`.
    ///
    /// Returns once `reader` reaches end of input and every in-flight request
    /// has been answered.
    pub async fn serve<R, W>(&self, mut reader: R, writer: W) -> Result<(), McpServerError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<JsonRpcResponse>(32);
        let writer_task = tokio::spawn(write_responses(writer, rx));
        let mut tasks = JoinSet::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&buf);
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match decode(line) {
                Incoming::Invalid(response) => {
                    warn!("Rejected undecodable message");
                    tx.send(response)
                        .await
                        .map_err(|_| McpServerError::WriterGone)?;
                }
                Incoming::Notification(notification) => self.handle_notification(&notification),
                Incoming::Request(request) => {
                    // Registered before the task starts so a cancellation read
                    // on the next line always finds it.
                    let cancel = request.id.as_ref().map(|id| self.register(id));
                    let server = self.clone();
                    let tx = tx.clone();
                    tasks.spawn(async move {
                        let id = request.id.clone();
                        let response = server
                            .dispatch_with_cancel(request, cancel.unwrap_or_default())
                            .await;
                        if let Some(id) = &id {
                            server.unregister(id);
                        }
                        if let Some(response) = response {
                            // Writer only goes away when stdout is closed
                            let _ = tx.send(response).await;
                        }
                    });
                }
            }

            while let Some(joined) = tasks.try_join_next() {
                if let Err(e) = joined {
                    warn!(error = %e, "MCP request task failed");
                }
            }
        }

        debug!(pending = tasks.len(), "Input closed, finishing in-flight requests");
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "MCP request task failed");
            }
        }

        drop(tx);
        writer_task
            .await
            .map_err(|_| McpServerError::WriterGone)??;
        Ok(())
    }

    fn handle_notification(&self, notification: &JsonRpcRequest) {
        match notification.method.as_str() {
            "notifications/cancelled" => {
                let Some(request_id) = notification
                    .params
                    .as_ref()
                    .and_then(|p| p.get("requestId"))
                else {
                    return;
                };
                let key = request_id.to_string();
                let token = self
                    .in_flight
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get(&key)
                    .cloned();
                if let Some(token) = token {
                    info!(request_id = %key, "Client cancelled request");
                    token.cancel();
                }
            }
            method => debug!(method, "Ignoring notification"),
        }
    }

    /// Answer one request. `None` only when the request was a notification.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        self.dispatch_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Like [`dispatch`](Self::dispatch); a `tools/call` stops when `cancel` fires.
    pub async fn dispatch_with_cancel(
        &self,
        request: JsonRpcRequest,
        cancel: CancellationToken,
    ) -> Option<JsonRpcResponse> {
        let id = request.id?;
        debug!(method = %request.method, id = %id, "MCP request");

        let result = match request.method.as_str() {
            "initialize" => Ok(initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": catalogue() })),
            "tools/call" => self.tools_call(request.params, cancel).await,
            other => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    async fn tools_call(
        &self,
        params: Option<Value>,
        cancel: CancellationToken,
    ) -> Result<Value, JsonRpcError> {
        let params = params.unwrap_or(Value::Null);
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::new(INVALID_PARAMS, "Missing tool name"))?;
        let empty = Map::new();
        let arguments = params
            .get("arguments")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let result = match ToolCall::parse(name, arguments) {
            Ok(call) => self.run_tool(name, call, cancel).await,
            Err(ToolCallError::UnknownTool(tool)) => {
                return Err(JsonRpcError::new(
                    INVALID_PARAMS,
                    format!("Unknown tool: {tool}"),
                ));
            }
            Err(e) => ToolResult::error(name, e),
        };

        serde_json::to_value(result).map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))
    }

    async fn run_tool(&self, name: &str, call: ToolCall, cancel: CancellationToken) -> ToolResult {
        match call {
            ToolCall::Flash {
                device,
                port,
                filepath,
                address,
            } => {
                let path = PathBuf::from(filepath);
                let warning = artifact::inspect_file(&path, device)
                    .await
                    .ok()
                    .and_then(|check| check.warning);

                let request = FlashRequest::new(device, port.as_str(), path).with_flash_address(address);
                match self.orchestrator.flash_with_cancel(request, cancel).await {
                    Ok(success) => {
                        let result = ToolResult::text(format!(
                            "Successfully loaded {} to {port}: {}",
                            device.artifact_noun(),
                            success.message
                        ));
                        match warning {
                            Some(warning) => result.with_text(format!("Warning: {warning}")),
                            None => result,
                        }
                    }
                    Err(failure) => ToolResult::error(name, failure),
                }
            }
            ToolCall::ListPorts => {
                let lister = Arc::clone(&self.ports);
                match tokio::task::spawn_blocking(move || lister.list_ports()).await {
                    Ok(Ok(ports)) => ToolResult::text(render_ports(&ports)),
                    Ok(Err(e)) => ToolResult::error(name, e),
                    Err(e) => ToolResult::error(name, e),
                }
            }
        }
    }

    fn register(&self, id: &Value) -> CancellationToken {
        let token = CancellationToken::new();
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), token.clone());
        token
    }

    fn unregister(&self, id: &Value) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id.to_string());
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn render_ports(ports: &[papilio_core::SerialPortInfo]) -> String {
    if ports.is_empty() {
        return "No serial ports found".to_string();
    }
    let lines: Vec<String> = ports
        .iter()
        .map(|p| {
            let manufacturer = p
                .manufacturer
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or("Unknown");
            format!("{} - {manufacturer}", p.path)
        })
        .collect();
    format!("Available serial ports:\n{}", lines.join("\n"))
}

async fn write_responses<W>(
    mut writer: W,
    mut rx: mpsc::Receiver<JsonRpcResponse>,
) -> Result<(), McpServerError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = match serde_json::to_vec(&response) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to encode response");
                continue;
            }
        };
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}
