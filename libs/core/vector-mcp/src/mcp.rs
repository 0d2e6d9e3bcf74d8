//! MCP (Model Context Protocol) handler
//!
//! Implements the JSON-RPC side of an MCP tool server. Every catalogue
//! operation is exposed as one tool; `tools/call` is forwarded to the
//! [`OperationRouter`].

use domain_vector::VectorRepository;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, warn};

use crate::error::ErrorContext;
use crate::router::OperationRouter;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "qdrant-mcp-server";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// ============================================================================
// MCP Protocol Types
// ============================================================================

/// MCP request structure
///
/// A request without `id` is a notification and gets no response.
/// An explicit `"id": null` is still a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    #[serde(default, deserialize_with = "present_id")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl McpRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

fn present_id<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// MCP response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

/// MCP error structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl McpResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(McpError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Reply to input that is not JSON at all; the id is unknown
    pub fn parse_error(detail: impl std::fmt::Display) -> Self {
        Self::error(None, PARSE_ERROR, format!("Parse error: {}", detail))
    }
}

/// Serialize a response as one protocol line
pub fn encode(response: &McpResponse) -> Option<String> {
    match serde_json::to_string(response).with_context("MCP response") {
        Ok(text) => Some(text),
        Err(e) => {
            error!(error = %e, "Failed to serialize MCP response");
            None
        }
    }
}

// ============================================================================
// MCP Handler
// ============================================================================

#[derive(Debug, Clone, Serialize)]
struct ServerInfo {
    name: String,
    version: String,
}

/// MCP request handler
pub struct McpHandler<R: VectorRepository + ?Sized> {
    router: OperationRouter<R>,
    server_info: ServerInfo,
}

impl<R: VectorRepository + ?Sized> McpHandler<R> {
    pub fn new(router: OperationRouter<R>) -> Self {
        Self {
            router,
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }

    /// Handle an MCP request. Notifications yield `None`.
    pub async fn handle(&self, request: McpRequest) -> Option<McpResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "Received notification");
            return None;
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "ping" => McpResponse::success(request.id, json!({})),
            "tools/list" => self.handle_list_tools(request.id),
            "tools/call" => self.handle_call_tool(request.id, request.params).await,
            method => {
                warn!(method, "Unsupported MCP method");
                McpResponse::error(request.id, METHOD_NOT_FOUND, "Method not found")
            }
        };

        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>) -> McpResponse {
        McpResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": self.server_info,
                "capabilities": {
                    "tools": {}
                }
            }),
        )
    }

    fn handle_list_tools(&self, id: Option<Value>) -> McpResponse {
        let tools: Vec<Value> = self
            .router
            .catalogue()
            .iter()
            .map(|descriptor| {
                json!({
                    "name": descriptor.name,
                    "description": descriptor.description,
                    "inputSchema": descriptor.input_schema()
                })
            })
            .collect();

        McpResponse::success(id, json!({ "tools": tools }))
    }

    /// Unknown tools and bad arguments are tool-level failures (`isError`),
    /// not protocol errors.
    async fn handle_call_tool(&self, id: Option<Value>, params: Value) -> McpResponse {
        let tool_name = match params.get("name").and_then(Value::as_str) {
            Some(name) => name,
            None => return McpResponse::error(id, INVALID_PARAMS, "Missing tool name"),
        };

        let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
        let envelope = self.router.call(tool_name, &arguments).await;
        let text = match envelope.to_text() {
            Ok(text) => text,
            Err(e) => {
                error!(tool = tool_name, error = %e, "Failed to render tool result");
                return McpResponse::error(id, INTERNAL_ERROR, e.to_string());
            }
        };

        McpResponse::success(
            id,
            json!({
                "content": [{
                    "type": "text",
                    "text": text
                }],
                "isError": !envelope.is_success()
            }),
        )
    }

    /// Parse and handle one JSON-RPC message
    ///
    /// Returns the serialized response, or `None` for notifications.
    /// Text that is not JSON is a parse error; JSON that is not a request
    /// object (a batch array, a missing `method`) is an invalid request.
    pub async fn handle_json(&self, json: &str) -> Option<String> {
        let message: Value = match serde_json::from_str(json) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Unparseable MCP message");
                return encode(&McpResponse::parse_error(e));
            }
        };

        let id = message.get("id").cloned();
        let response = match serde_json::from_value::<McpRequest>(message) {
            Ok(request) => self.handle(request).await?,
            Err(e) => {
                warn!(error = %e, "Invalid MCP request");
                McpResponse::error(id, INVALID_REQUEST, format!("Invalid Request: {}", e))
            }
        };

        encode(&response)
    }
}
