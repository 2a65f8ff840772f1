//! Development-assistant MCP server.
//!
//! A Model Context Protocol server exposing a fixed catalog of tools
//! (filesystem access, shell commands, a key/value cache, a page store,
//! documentation search and server status) over stdio or HTTP with
//! server-sent events.
//!
//! # Architecture
//!
//! - **core**: configuration, errors, the filesystem sandbox, session
//!   counters, the MCP server handler and the transports
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: parameter schemas, the tool registry, the dispatcher and
//!     the capability groups
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use dev_assistant_mcp::core::{Config, McpServer, SessionTracker, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config.clone(), Arc::new(SessionTracker::new()))?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
