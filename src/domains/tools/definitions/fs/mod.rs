//! Filesystem capability group.
//!
//! Reads, writes, lists and searches files, and runs shell commands. Every
//! caller-supplied path goes through the sandbox in `crate::core::security`.

pub mod execute_command;
pub mod list_files;
pub mod read_file;
pub mod search_files;
pub mod write_file;

use std::path::Path;

use async_trait::async_trait;

pub use execute_command::ExecuteCommandTool;
pub use list_files::ListFilesTool;
pub use read_file::ReadFileTool;
pub use search_files::SearchFilesTool;
pub use write_file::WriteFileTool;

use crate::core::config::{SecurityConfig, ToolsConfig};
use crate::domains::tools::{CapabilityGroup, ToolDescriptor, ToolError, ToolOutput, ValidatedArgs};

/// Handler for the filesystem tools.
#[derive(Debug, Clone, Default)]
pub struct FilesystemTools {
    security: SecurityConfig,
    limits: ToolsConfig,
}

impl FilesystemTools {
    pub fn new(security: SecurityConfig, limits: ToolsConfig) -> Self {
        Self { security, limits }
    }

    pub fn security(&self) -> &SecurityConfig {
        &self.security
    }

    pub fn limits(&self) -> &ToolsConfig {
        &self.limits
    }
}

#[async_trait]
impl CapabilityGroup for FilesystemTools {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![
            ReadFileTool::descriptor(),
            WriteFileTool::descriptor(),
            ListFilesTool::descriptor(),
            ExecuteCommandTool::descriptor(),
            SearchFilesTool::descriptor(),
        ]
    }

    async fn handle(&self, tool: &str, args: ValidatedArgs) -> Result<ToolOutput, ToolError> {
        match tool {
            ReadFileTool::NAME => ReadFileTool::execute(&args, self).await,
            WriteFileTool::NAME => WriteFileTool::execute(&args, self).await,
            ListFilesTool::NAME => ListFilesTool::execute(&args, self).await,
            ExecuteCommandTool::NAME => ExecuteCommandTool::execute(&args, self).await,
            SearchFilesTool::NAME => SearchFilesTool::execute(&args, self).await,
            other => Err(ToolError::unknown_tool(other)),
        }
    }
}

/// `path` relative to `root`, with `/` separators.
pub(crate) fn relative_display(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}
