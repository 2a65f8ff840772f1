//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default and recommended mode.
//! stdout carries protocol frames only; logs go to stderr.

use rmcp::ServiceExt;
use tracing::info;

use super::{TransportError, TransportResult, shutdown_signal};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until the client disconnects or a shutdown
    /// signal arrives.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");

        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        let token = service.cancellation_token();
        let on_signal = tokio::spawn(async move {
            shutdown_signal().await;
            token.cancel();
        });

        let reason = service
            .waiting()
            .await
            .map_err(|e| TransportError::ServiceError(e.to_string()));
        on_signal.abort();

        info!("STDIO transport finished: {:?}", reason?);
        Ok(())
    }
}
