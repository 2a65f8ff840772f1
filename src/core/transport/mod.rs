//! Transport layer for the MCP server.
//!
//! This module provides different transport implementations:
//! - **STDIO**: Line-delimited JSON-RPC over stdin/stdout via rmcp - feature: `stdio`
//! - **HTTP**: `POST` a JSON-RPC message, receive the reply as a server-sent
//!   event stream - feature: `http`
//!
//! Each transport handles the connection lifecycle and delegates tool calls
//! to the MCP server handler. Both stop on Ctrl-C or SIGTERM.

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::{TransportService, shutdown_signal};

#[cfg(feature = "http")]
pub use config::HttpConfig;
