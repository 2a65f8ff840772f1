//! HTTP transport implementation.
//!
//! A client `POST`s one JSON-RPC message to the SSE endpoint (default
//! `/mcp/sse`) and receives the reply as a server-sent event stream carrying a
//! single `message` event. Keep-alive comments flow while a slow tool runs.
//! Each stream is one session in the [`SessionTracker`]: it opens when the
//! stream is created and closes when the stream is dropped, whether it ran to
//! completion or the client went away.
//!
//! Also served: `/` (server info), `/health`, `/stats`, `/debug/tools`, and a
//! JSON 404 listing these endpoints.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use bytes::Bytes;
use futures::StreamExt;
use http::{StatusCode, Uri};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

use super::{TransportConfig, TransportError, TransportResult, config::HttpConfig, shutdown_signal};
use crate::core::McpServer;
use crate::core::session::SessionTracker;

const PROTOCOL_VERSION: &str = "2024-11-05";

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Parse error.
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::error(None, -32700, msg)
    }

    /// Invalid request error.
    pub fn invalid_request(id: Option<Value>) -> Self {
        Self::error(id, -32600, "Invalid Request")
    }

    /// Method not found error.
    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(id, -32601, format!("Method not found: {}", method))
    }

    /// Invalid params error.
    pub fn invalid_params(id: Option<Value>, msg: impl Into<String>) -> Self {
        Self::error(id, -32602, msg)
    }
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    server: McpServer,
    sessions: Arc<SessionTracker>,
    sse_path: Arc<str>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Create from TransportConfig (extracts HTTP config).
    pub fn from_transport_config(config: &TransportConfig) -> Option<Self> {
        match config {
            TransportConfig::Http(http_config) => Some(Self::new(http_config.clone())),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the HTTP transport until a shutdown signal arrives.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let app = router(server, &self.config);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (JSON-RPC over SSE, CORS {})",
            addr, cors_status
        );
        info!("  → SSE:         POST {}", self.config.sse_path);
        info!("  → Health:      GET /health");
        info!("  → Stats:       GET /stats");
        info!("  → Tool schema: GET /debug/tools");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        info!("HTTP transport stopped");
        Ok(())
    }
}

/// Build the router for `server`.
pub fn router(server: McpServer, config: &HttpConfig) -> Router {
    let state = AppState {
        sessions: server.sessions().clone(),
        sse_path: Arc::from(config.sse_path.as_str()),
        server,
    };

    let mut app = Router::new()
        .route(&config.sse_path, post(handle_sse))
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/stats", get(stats_handler))
        .route("/debug/tools", get(debug_tools))
        .fallback(not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

fn endpoints(sse_path: &str) -> Value {
    json!({
        "sse": format!("POST {}", sse_path),
        "health": "GET /health",
        "stats": "GET /stats",
        "debugTools": "GET /debug/tools",
    })
}

/// Root handler - status summary.
async fn root_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.server.registry();
    let categories: serde_json::Map<String, Value> = registry
        .categories()
        .into_iter()
        .map(|(group, count)| (group.to_string(), json!(count)))
        .collect();

    Json(json!({
        "name": state.server.name(),
        "version": state.server.version(),
        "status": "running",
        "transport": "HTTP+SSE",
        "protocol": "JSON-RPC 2.0",
        "endpoints": endpoints(&state.sse_path),
        "tools": {
            "total": registry.len(),
            "categories": categories,
        },
        "sessions": state.sessions.snapshot(),
        "uptime": state.server.uptime().as_secs(),
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let backends = &state.server.config().backends;
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime": state.server.uptime().as_secs(),
        "backends": {
            "cache": backends.cache.as_str(),
            "pages": backends.pages.as_str(),
            "docs": "stub",
        },
        "tools": state.server.registry().len(),
        "sessions": state.sessions.snapshot(),
    }))
}

/// Server info, tool catalog and session counters.
async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    let registry = state.server.registry();
    let list: Vec<Value> = registry
        .list()
        .map(|d| json!({ "name": d.name, "description": d.description }))
        .collect();

    Json(json!({
        "server": {
            "name": state.server.name(),
            "version": state.server.version(),
            "uptime": state.server.uptime().as_secs(),
            "platform": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        },
        "tools": {
            "total": registry.len(),
            "list": list,
        },
        "sessions": state.sessions.snapshot(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// Full descriptor dump of every registered tool.
async fn debug_tools(State(state): State<AppState>) -> impl IntoResponse {
    let tools: Vec<Value> = state.server.registry().list().map(|d| d.to_json()).collect();
    Json(json!({
        "count": tools.len(),
        "tools": tools,
    }))
}

async fn not_found(State(state): State<AppState>, uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "path": uri.path(),
            "availableEndpoints": [
                "GET /",
                "GET /health",
                "GET /stats",
                "GET /debug/tools",
                format!("POST {}", state.sse_path),
            ],
        })),
    )
}

/// Accept one JSON-RPC message and stream the reply.
#[instrument(skip_all, fields(method))]
async fn handle_sse(State(state): State<AppState>, body: Bytes) -> Response {
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            state.sessions.on_error();
            warn!("Rejected malformed JSON-RPC message: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::parse_error(format!("Parse error: {}", e))),
            )
                .into_response();
        }
    };
    tracing::Span::current().record("method", request.method.as_str());

    if request.id.is_none() {
        info!("Received notification: {}", request.method);
        return StatusCode::ACCEPTED.into_response();
    }

    let guard = state.sessions.open();
    let reply = futures::stream::once(async move {
        let response = process_request(&state.server, request).await;
        Event::default().event("message").json_data(&response)
    });

    // The guard lives in the closure, so the session closes when the
    // stream is dropped.
    let stream = reply.map(move |event| match event {
        Ok(event) => Ok::<Event, Infallible>(event),
        Err(e) => {
            guard.record_error();
            error!("Failed to encode SSE event: {}", e);
            Ok(Event::default().event("error").data(e.to_string()))
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default()).into_response()
}

/// Process a JSON-RPC request and return the response.
async fn process_request(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    if request.jsonrpc != "2.0" {
        return JsonRpcResponse::invalid_request(request.id);
    }

    match request.method.as_str() {
        "initialize" => handle_initialize(server, request),
        "tools/list" => {
            info!("Processing tools/list request");
            JsonRpcResponse::success(request.id, json!({ "tools": server.list_tools_json() }))
        }
        "tools/call" => handle_tools_call(server, request).await,
        "ping" => JsonRpcResponse::success(request.id, json!({})),
        method => {
            warn!("Unknown method: {}", method);
            JsonRpcResponse::method_not_found(request.id, method)
        }
    }
}

fn handle_initialize(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    info!("Processing initialize request");

    let protocol_version = request
        .params
        .as_ref()
        .and_then(|p| p.get("protocolVersion"))
        .and_then(Value::as_str)
        .unwrap_or(PROTOCOL_VERSION)
        .to_string();

    JsonRpcResponse::success(
        request.id,
        json!({
            "protocolVersion": protocol_version,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": server.name(),
                "version": server.version(),
            },
            "instructions": server.instructions(),
        }),
    )
}

async fn handle_tools_call(server: &McpServer, request: JsonRpcRequest) -> JsonRpcResponse {
    let Some(params) = request.params else {
        return JsonRpcResponse::invalid_params(request.id, "Missing params");
    };
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::invalid_params(request.id, "Missing tool name");
    };
    info!("Processing tools/call request: {}", name);

    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
    let result = server.call_tool_json(name, arguments).await;
    JsonRpcResponse::success(request.id, result)
}
