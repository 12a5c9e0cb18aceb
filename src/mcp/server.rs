//! Newline-delimited JSON-RPC loop over stdio.
//!
//! Each request runs as its own tokio task, so slow gemini calls do not hold
//! up `ping` or other tool calls. A single writer drains finished responses
//! to the output in completion order.

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::gemini::Executor;
use crate::output::logger::{Direction, TrafficLog};

use super::tools::{self, ToolError};
use super::types::{
    Message, Response, RpcError, DEFAULT_PROTOCOL_VERSION, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND, PARSE_ERROR,
};

/// Handles decoded protocol messages for one server instance.
pub struct McpServer {
    executor: Executor,
    name: String,
    version: String,
}

impl McpServer {
    pub fn new(executor: Executor, name: impl Into<String>) -> Self {
        Self {
            executor,
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Handle one raw line. Returns `None` for notifications and blank lines.
    pub async fn handle_line(&self, line: &str) -> Option<Response> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let message: Message = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable message");
                return Some(Response::failure(
                    Value::Null,
                    RpcError::new(PARSE_ERROR, format!("Parse error: {e}")),
                ));
            }
        };

        let Some(id) = message.id else {
            if let Some(method) = &message.method {
                tracing::debug!(method = %method, "notification");
            }
            return None;
        };

        let Some(method) = message.method else {
            return Some(Response::failure(
                id,
                RpcError::new(INVALID_REQUEST, "Invalid request: missing method"),
            ));
        };

        tracing::debug!(method = %method, id = %id, "request");
        match self.handle_request(&method, message.params).await {
            Ok(result) => Some(Response::success(id, result)),
            Err(error) => Some(Response::failure(id, error)),
        }
    }

    async fn handle_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => {
                let protocol = params
                    .get("protocolVersion")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_PROTOCOL_VERSION);
                Ok(json!({
                    "protocolVersion": protocol,
                    "capabilities": { "tools": {} },
                    "serverInfo": { "name": self.name, "version": self.version }
                }))
            }
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tools::definitions() })),
            "tools/call" => {
                let name = params
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or_else(|| RpcError::new(INVALID_PARAMS, "tools/call requires a tool name"))?;
                let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

                tracing::info!(tool = %name, "tool call");
                match tools::call_tool(&self.executor, name, arguments).await {
                    Ok(result) => serde_json::to_value(result)
                        .map_err(|e| RpcError::new(INVALID_PARAMS, e.to_string())),
                    Err(e @ ToolError::UnknownTool(_)) => {
                        Err(RpcError::new(INVALID_PARAMS, e.to_string()))
                    }
                }
            }
            _ => Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {method}"),
            )),
        }
    }
}

/// Serve requests from `reader` until EOF, writing responses to `writer`.
///
/// In-flight requests are allowed to finish after EOF before returning.
pub async fn serve<R, W>(
    reader: R,
    mut writer: W,
    server: Arc<McpServer>,
    traffic: Option<Arc<TrafficLog>>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Response>();
    let inbound_log = traffic.clone();

    let read_loop = async move {
        let mut lines = reader.lines();
        let mut tasks = JoinSet::new();

        while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
            if let Some(log) = &inbound_log {
                log.record(Direction::Inbound, &line);
            }
            let server = Arc::clone(&server);
            let tx = tx.clone();
            tasks.spawn(async move {
                if let Some(response) = server.handle_line(&line).await {
                    let _ = tx.send(response);
                }
            });
            // Reap finished tasks so the set does not grow without bound.
            while tasks.try_join_next().is_some() {}
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "request task failed");
            }
        }
        tracing::debug!("input closed");
        Ok::<_, anyhow::Error>(())
    };

    let write_loop = async {
        while let Some(response) = rx.recv().await {
            let line = serde_json::to_string(&response).context("Failed to encode response")?;
            if let Some(log) = &traffic {
                log.record(Direction::Outbound, &line);
            }
            writer.write_all(line.as_bytes()).await.context("Failed to write to stdout")?;
            writer.write_all(b"\n").await.context("Failed to write to stdout")?;
            writer.flush().await.context("Failed to flush stdout")?;
        }
        Ok::<_, anyhow::Error>(())
    };

    let (read_result, write_result) = tokio::join!(read_loop, write_loop);
    read_result?;
    write_result
}

/// Run the server on the process's stdin and stdout.
pub async fn run_stdio(server: Arc<McpServer>, traffic: Option<Arc<TrafficLog>>) -> Result<()> {
    tracing::info!(name = %server.name, version = %server.version, "MCP server listening on stdio");
    serve(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        server,
        traffic,
    )
    .await
}
