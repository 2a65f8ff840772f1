//! MCP Server implementation and lifecycle management.
//!
//! [`McpServer`] implements the rmcp `ServerHandler` for the stdio transport
//! and exposes the same operations as plain JSON for the HTTP transport. Both
//! paths list tools from the registry and call them through the
//! [`Dispatcher`], so a tool behaves identically on either transport.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult,
        PaginatedRequestParam, ServerCapabilities, ServerInfo,
    },
    service::RequestContext,
};
use serde_json::{Value, json};
use tracing::{info, instrument};

use super::config::Config;
use super::error::Result;
use super::session::SessionTracker;
use crate::domains::tools::{Dispatcher, ToolOutput, ToolRegistry, build_registry};

const INSTRUCTIONS: &str = "Development assistant: filesystem access, shell commands, \
     a key/value cache, a page store, documentation search and server status. \
     Every tool returns a JSON envelope with a `success` flag.";

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Routes tool calls to their capability groups.
    dispatcher: Dispatcher,

    /// Session counters shared with the HTTP transport.
    sessions: Arc<SessionTracker>,

    started_at: Instant,
}

impl McpServer {
    /// Create a new MCP server, registering every capability group.
    ///
    /// Fails if the tool catalog cannot be built (e.g. a duplicate name).
    pub fn new(config: Config, sessions: Arc<SessionTracker>) -> Result<Self> {
        let started_at = Instant::now();
        let registry = build_registry(&config, sessions.clone(), started_at)?;

        Ok(Self {
            config: Arc::new(config),
            dispatcher: Dispatcher::new(Arc::new(registry)),
            sessions,
            started_at,
        })
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.dispatcher.registry()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn sessions(&self) -> &Arc<SessionTracker> {
        &self.sessions
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn instructions(&self) -> &'static str {
        INSTRUCTIONS
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools in `tools/list` shape.
    pub fn list_tools_json(&self) -> Vec<Value> {
        self.registry()
            .list()
            .map(|d| {
                json!({
                    "name": d.name,
                    "description": d.description,
                    "inputSchema": Value::Object(d.schema.to_json_schema()),
                })
            })
            .collect()
    }

    /// Call a tool and return the envelope.
    pub async fn call_tool_envelope(&self, name: &str, arguments: Value) -> ToolOutput {
        self.dispatcher.invoke(name, arguments).await
    }

    /// Call a tool and return the serialized MCP `CallToolResult`.
    pub async fn call_tool_json(&self, name: &str, arguments: Value) -> Value {
        let result = self.call_tool_envelope(name, arguments).await.to_call_result();
        serde_json::to_value(&result).unwrap_or_else(|e| {
            json!({
                "content": [{ "type": "text", "text": format!("Failed to encode tool result: {}", e) }],
                "isError": true,
            })
        })
    }

    /// Release capability backends. Called once when the transport stops.
    pub async fn shutdown(&self) {
        info!("Shutting down capability groups");
        self.registry().shutdown().await;
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name().to_string(),
                version: self.version().to_string(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        info!("Listing tools");
        Ok(ListToolsResult {
            tools: self.registry().to_tools(),
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        let output = self.dispatcher.invoke_map(&request.name, arguments).await;
        Ok(output.to_call_result())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> McpServer {
        McpServer::new(Config::default(), Arc::new(SessionTracker::new())).unwrap()
    }

    #[test]
    fn test_server_info_advertises_tools_only() {
        let info = server().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_none());
        assert!(info.capabilities.prompts.is_none());
        assert_eq!(info.server_info.name, "ultimate-dev-assistant");
    }

    #[test]
    fn test_list_tools_json_shape() {
        let tools = server().list_tools_json();
        assert_eq!(tools.len(), 13);
        assert_eq!(tools[0]["name"], "hello_world");
        assert_eq!(tools[0]["inputSchema"]["type"], "object");
        assert_eq!(
            tools[0]["inputSchema"]["properties"]["name"]["default"],
            "Developer"
        );
    }

    #[tokio::test]
    async fn test_call_tool_json_success() {
        let result = server()
            .call_tool_json("hello_world", json!({ "name": "Ada" }))
            .await;

        assert_eq!(result["isError"], false);
        assert_eq!(result["structuredContent"]["success"], true);
        assert_eq!(result["structuredContent"]["data"]["message"], "Hello, Ada!");
    }

    #[tokio::test]
    async fn test_call_tool_json_unknown_tool() {
        let result = server().call_tool_json("nope", Value::Null).await;

        assert_eq!(result["isError"], true);
        assert_eq!(result["structuredContent"]["code"], "UnknownTool");
    }

    #[tokio::test]
    async fn test_rmcp_client_round_trip() {
        use rmcp::ServiceExt;

        let (server_io, client_io) = tokio::io::duplex(64 * 1024);
        let server_task = tokio::spawn(async move {
            let service = server().serve(server_io).await?;
            service.waiting().await?;
            anyhow::Ok(())
        });

        let client = ().serve(client_io).await.unwrap();

        let tools = client.list_tools(None).await.unwrap();
        assert_eq!(tools.tools.len(), 13);
        assert_eq!(tools.tools[0].name, "hello_world");

        let request: CallToolRequestParam = serde_json::from_value(json!({
            "name": "hello_world",
            "arguments": { "name": "Linus" }
        }))
        .unwrap();
        let result = client.call_tool(request).await.unwrap();
        assert_eq!(result.is_error, Some(false));
        let envelope = result.structured_content.unwrap();
        assert_eq!(envelope["data"]["message"], "Hello, Linus!");

        let request: CallToolRequestParam =
            serde_json::from_value(json!({ "name": "read_file" })).unwrap();
        let result = client.call_tool(request).await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(
            result.structured_content.unwrap()["code"],
            "MissingRequiredParameter"
        );

        client.cancel().await.unwrap();
        server_task.await.unwrap().unwrap();
    }
}
