//! Transport configuration types.

use serde::{Deserialize, Serialize};

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// HTTP transport answering JSON-RPC over server-sent events.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path of the streaming JSON-RPC endpoint.
    #[serde(default = "default_sse_path")]
    pub sse_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,
}

#[cfg(feature = "http")]
fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[cfg(feature = "http")]
fn default_sse_path() -> String {
    "/mcp/sse".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(feature = "http")]
const DEFAULT_HTTP_PORT: u16 = 3000;

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            return Self::Stdio;
        }

        #[cfg(all(not(feature = "stdio"), feature = "http"))]
        {
            return Self::Http(HttpConfig::default());
        }

        #[cfg(not(any(feature = "stdio", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or http");
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_HTTP_PORT,
            host: default_host(),
            sse_path: default_sse_path(),
            enable_cors: default_cors(),
        }
    }
}

#[cfg(feature = "http")]
impl HttpConfig {
    /// Load HTTP settings from environment variables.
    ///
    /// `MCP_HTTP_PORT` wins over the conventional `PORT`.
    pub fn from_env() -> Self {
        let port = std::env::var("MCP_HTTP_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_HTTP_PORT);
        let host = std::env::var("MCP_HTTP_HOST").unwrap_or_else(|_| default_host());
        let sse_path = std::env::var("MCP_HTTP_PATH").unwrap_or_else(|_| default_sse_path());
        let enable_cors = std::env::var("MCP_HTTP_CORS")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true);
        Self {
            port,
            host,
            sse_path,
            enable_cors,
        }
    }
}

impl TransportConfig {
    /// Create a STDIO transport config.
    #[cfg(feature = "stdio")]
    pub fn stdio() -> Self {
        Self::Stdio
    }

    /// Create an HTTP transport config.
    #[cfg(feature = "http")]
    pub fn http(port: u16, host: impl Into<String>) -> Self {
        Self::Http(HttpConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Load transport config from environment variables.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT")
            .unwrap_or_default()
            .to_lowercase();

        match transport.as_str() {
            #[cfg(feature = "http")]
            "http" | "sse" => Self::Http(HttpConfig::from_env()),
            #[cfg(feature = "stdio")]
            _ => Self::Stdio,
            #[cfg(all(not(feature = "stdio"), feature = "http"))]
            _ => Self::Http(HttpConfig::from_env()),
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}:{}{}", cfg.host, cfg.port, cfg.sse_path),
        }
    }

    /// Check if this transport is the standard STDIO mode.
    pub fn is_stdio(&self) -> bool {
        #[cfg(feature = "stdio")]
        {
            matches!(self, Self::Stdio)
        }
        #[cfg(not(feature = "stdio"))]
        {
            false
        }
    }
}

#[cfg(all(test, feature = "http", feature = "stdio"))]
mod tests {
    use super::*;
    use crate::core::config::tests::ENV_TEST_LOCK;

    #[test]
    fn test_default_is_stdio() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::remove_var("MCP_TRANSPORT");
        }
        assert!(TransportConfig::from_env().is_stdio());
    }

    #[test]
    fn test_http_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_TRANSPORT", "http");
            std::env::set_var("PORT", "4100");
            std::env::remove_var("MCP_HTTP_PORT");
            std::env::set_var("MCP_HTTP_CORS", "false");
        }
        let config = TransportConfig::from_env();
        unsafe {
            std::env::remove_var("MCP_TRANSPORT");
            std::env::remove_var("PORT");
            std::env::remove_var("MCP_HTTP_CORS");
        }

        match config {
            TransportConfig::Http(http) => {
                assert_eq!(http.port, 4100);
                assert_eq!(http.sse_path, "/mcp/sse");
                assert!(!http.enable_cors);
            }
            other => panic!("expected HTTP config, got {:?}", other),
        }
    }
}
