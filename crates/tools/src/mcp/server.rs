//! Newline-delimited JSON-RPC server exposing the tool registry.
//!
//! Requests are handled one at a time, so driver calls never interleave.
//! Tool failures are reported as results flagged `isError`, never as
//! protocol errors.

use base64::Engine as _;
use pinpoint_core::Result;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use super::protocol::{
    CallToolParams, JsonRpcRequest, JsonRpcResponse, INVALID_PARAMS, INVALID_REQUEST, JSONRPC_VERSION,
    METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION,
};
use crate::{ToolContext, ToolRegistry};

pub struct McpServer {
    registry: ToolRegistry,
    ctx: ToolContext,
    name: String,
    version: String,
}

impl McpServer {
    pub fn new(registry: ToolRegistry, ctx: ToolContext) -> Self {
        Self {
            registry,
            ctx,
            name: "pinpoint".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub async fn serve_stdio(&self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve until `reader` reaches EOF, then close any open browser.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!(tools = self.registry.tool_names().len(), "Tool server listening on stdio");
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(response) = self.handle_line(line).await {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }
        info!("Input closed, shutting down");
        self.ctx.driver.lock().await.close_session().await;
        Ok(())
    }

    /// One request line in, at most one response out (notifications get none).
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let raw: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!("Unparseable request: {}", e);
                return Some(JsonRpcResponse::err(Value::Null, PARSE_ERROR, "Parse error"));
            }
        };
        let id_hint = raw.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(raw) {
            Ok(r) => r,
            Err(e) => {
                return Some(JsonRpcResponse::err(
                    id_hint,
                    INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                ))
            }
        };
        if request.jsonrpc.as_deref().is_some_and(|v| v != JSONRPC_VERSION) {
            return Some(JsonRpcResponse::err(
                id_hint,
                INVALID_REQUEST,
                "Unsupported jsonrpc version",
            ));
        }

        let Some(id) = request.id else {
            debug!(method = %request.method, "Notification");
            return None;
        };

        debug!(method = %request.method, "Request");
        let response = match request.method.as_str() {
            "initialize" => JsonRpcResponse::ok(
                id,
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": { "listChanged": false } },
                    "serverInfo": { "name": self.name, "version": self.version }
                }),
            ),
            "ping" => JsonRpcResponse::ok(id, json!({})),
            "tools/list" => {
                JsonRpcResponse::ok(id, json!({ "tools": self.registry.get_tool_schemas() }))
            }
            "tools/call" => {
                let params = request.params.unwrap_or(Value::Null);
                match serde_json::from_value::<CallToolParams>(params) {
                    Ok(call) => JsonRpcResponse::ok(id, self.call_tool(call).await),
                    Err(e) => JsonRpcResponse::err(
                        id,
                        INVALID_PARAMS,
                        format!("Invalid tools/call params: {}", e),
                    ),
                }
            }
            other => JsonRpcResponse::err(id, METHOD_NOT_FOUND, format!("Method not found: {}", other)),
        };
        Some(response)
    }

    async fn call_tool(&self, call: CallToolParams) -> Value {
        let args = match call.arguments {
            Some(Value::Null) | None => json!({}),
            Some(args) => args,
        };
        match self.registry.execute(&call.name, self.ctx.clone(), args).await {
            Ok(output) => json!({ "content": content_items(&output), "isError": false }),
            Err(e) => {
                if e.is_precondition() {
                    debug!(tool = %call.name, error = %e, "Tool precondition not met");
                } else {
                    warn!(tool = %call.name, error = %e, "Tool failed");
                }
                json!({
                    "content": [{ "type": "text", "text": e.to_string() }],
                    "isError": true
                })
            }
        }
    }
}

/// Tool output → content items. Image screenshots become `image` items;
/// text-only renderings are decoded into a second text item.
fn content_items(output: &Value) -> Vec<Value> {
    let mut items = Vec::new();
    if let Some(text) = output.get("text").and_then(Value::as_str) {
        items.push(json!({ "type": "text", "text": text }));
    }
    if let Some(shot) = output.get("screenshot") {
        let mime = shot.get("mimeType").and_then(Value::as_str).unwrap_or_default();
        let data = shot.get("data").and_then(Value::as_str).unwrap_or_default();
        if mime.starts_with("image/") {
            items.push(json!({ "type": "image", "data": data, "mimeType": mime }));
        } else if let Ok(bytes) = base64::engine::general_purpose::STANDARD.decode(data) {
            items.push(json!({ "type": "text", "text": String::from_utf8_lossy(&bytes) }));
        }
    }
    if items.is_empty() {
        items.push(json!({ "type": "text", "text": output.to_string() }));
    }
    items
}
