//! Core module containing shared infrastructure components.
//!
//! Configuration, the error type, the filesystem sandbox, session counters,
//! the MCP server handler and the transports that serve it.

pub mod config;
pub mod error;
pub mod security;
pub mod server;
pub mod session;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use security::{PathSecurityError, validate_path};
pub use server::McpServer;
pub use session::{SessionGuard, SessionStats, SessionTracker};
pub use transport::{TransportConfig, TransportError, TransportService};
