//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables (optionally via a `.env` file) or
//! defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Security and path validation configuration.
    pub security: SecurityConfig,

    /// Backends of the cache and page-store capabilities.
    pub backends: BackendsConfig,

    /// Limits applied by the filesystem tools.
    pub tools: ToolsConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Configuration for security and path validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Optional root directory for path operations.
    /// If None, no path restrictions are enforced.
    pub root_path: Option<PathBuf>,

    /// Whether symlinks may be followed out of the root directory.
    pub allow_symlinks: bool,
}

/// Which implementation backs a simulated capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Canned responses, no state.
    #[default]
    Stub,
    /// In-process store living for the process lifetime.
    Memory,
}

impl BackendKind {
    /// Parse a backend name, `None` for anything unrecognised.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "stub" => Some(Self::Stub),
            "memory" | "live" => Some(Self::Memory),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stub => "stub",
            Self::Memory => "memory",
        }
    }
}

/// Backend selection for the simulated capability groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendsConfig {
    pub cache: BackendKind,
    pub pages: BackendKind,
}

/// Limits for the filesystem and command tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Timeout for `execute_command`, in seconds.
    pub command_timeout_secs: u64,

    /// Largest file `read_file` will load, in bytes.
    pub max_read_bytes: u64,

    /// Largest stdout/stderr `execute_command` will capture, in bytes.
    pub max_output_bytes: usize,
}

impl ToolsConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Read `MCP_LOG_LEVEL` (after loading `.env`).
    ///
    /// Needs no subscriber, so logging can be set up before the rest of the
    /// configuration is read and logged.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        match std::env::var("MCP_LOG_LEVEL") {
            Ok(level) => Self { level },
            Err(_) => Self::default(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            root_path: None,
            allow_symlinks: true,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: 30,
            max_read_bytes: 10 * 1024 * 1024,
            max_output_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "ultimate-dev-assistant".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig::default(),
            transport: TransportConfig::default(),
            security: SecurityConfig::default(),
            backends: BackendsConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        config.logging = LoggingConfig::from_env();

        config.transport = TransportConfig::from_env();

        if let Ok(root_path) = std::env::var("MCP_ROOT_PATH") {
            config.security.root_path = Some(PathBuf::from(root_path));
            info!("Path security enabled: root directory set to {:?}", config.security.root_path);
        } else {
            warn!(
                "MCP_ROOT_PATH not set - no path restrictions active. \
                 All filesystem paths will be allowed."
            );
        }

        if let Ok(allow_symlinks) = std::env::var("MCP_ALLOW_SYMLINKS") {
            config.security.allow_symlinks = allow_symlinks.parse().unwrap_or(true);
            info!("Symlinks allowed: {}", config.security.allow_symlinks);
        }

        config.backends.cache = backend_from_env("MCP_CACHE_BACKEND");
        config.backends.pages = backend_from_env("MCP_PAGES_BACKEND");

        if let Some(secs) = std::env::var("MCP_COMMAND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.tools.command_timeout_secs = secs;
        }

        config
    }
}

fn backend_from_env(key: &str) -> BackendKind {
    match std::env::var(key) {
        Ok(value) => BackendKind::parse(&value).unwrap_or_else(|| {
            warn!("Unknown backend '{}' in {}, using stub", value, key);
            BackendKind::Stub
        }),
        Err(_) => BackendKind::Stub,
    }
}
