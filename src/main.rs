//! MCP Server Entry Point
//!
//! Loads configuration, initializes logging, builds the tool catalog and
//! serves it over the configured transport until shutdown.
//!
//! `--http` selects the HTTP transport regardless of `MCP_TRANSPORT`.

use std::sync::Arc;

use anyhow::Result;
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, fmt};

use dev_assistant_mcp::core::config::LoggingConfig;
use dev_assistant_mcp::core::{Config, McpServer, SessionTracker, TransportService};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging first, so configuration warnings reach the log
    init_logging(&LoggingConfig::from_env().level);
    install_panic_hook();

    #[allow(unused_mut)]
    let mut config = Config::from_env();

    #[cfg(feature = "http")]
    if std::env::args().skip(1).any(|arg| arg == "--http") {
        config.transport = dev_assistant_mcp::core::TransportConfig::Http(
            dev_assistant_mcp::core::transport::HttpConfig::from_env(),
        );
    }

    info!("Starting {} v{}", config.server.name, config.server.version);

    let sessions = Arc::new(SessionTracker::new());
    let server = McpServer::new(config.clone(), sessions)?;

    info!("Server initialized with {} tools", server.registry().len());

    let transport = TransportService::new(config.transport);
    let outcome = transport.run(server.clone()).await;

    server.shutdown().await;

    if let Err(e) = outcome {
        if e.is_address_in_use() {
            error!("Port already in use; set MCP_HTTP_PORT (or PORT) to a free port");
        }
        error!("Transport failed: {}", e);
        return Err(e.into());
    }

    info!("Server shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr so stdout stays reserved for the stdio transport.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Route panic reports through tracing. Handler panics are still contained
/// by the dispatcher; this only makes them visible in the log.
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        error!("panic: {}", info);
    }));
}
