//! Tool catalog - assembles the registry served by every transport.
//!
//! Groups are registered in a fixed order (system, filesystem, cache, pages,
//! docs), which is also the order `tools/list` reports them in.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use super::definitions::{CacheTools, DocTools, FilesystemTools, PageTools, SystemTools};
use super::{ToolError, ToolRegistry};
use crate::core::config::Config;
use crate::core::session::SessionTracker;

/// Build the registry with every capability group.
///
/// Fails with [`ToolError::DuplicateToolName`] if two groups claim a name.
pub fn build_registry(
    config: &Config,
    sessions: Arc<SessionTracker>,
    started_at: Instant,
) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();

    registry.register_group(Arc::new(SystemTools::new(
        config.server.name.clone(),
        config.server.version.clone(),
        sessions,
        started_at,
    )))?;
    registry.register_group(Arc::new(FilesystemTools::new(
        config.security.clone(),
        config.tools.clone(),
    )))?;
    registry.register_group(Arc::new(CacheTools::from_kind(config.backends.cache)))?;
    registry.register_group(Arc::new(PageTools::from_kind(config.backends.pages)))?;
    registry.register_group(Arc::new(DocTools::default()))?;

    info!(
        "Tool catalog ready: {} tools (cache: {}, pages: {})",
        registry.len(),
        config.backends.cache.as_str(),
        config.backends.pages.as_str()
    );
    Ok(registry)
}
