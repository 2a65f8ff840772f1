//! Write file tool definition.
//!
//! Overwrites (or creates) a file, taking a timestamped copy of the previous
//! contents first unless `backup` is false.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, instrument};

use super::FilesystemTools;
use crate::core::security::validate_new_path;
use crate::domains::tools::{
    ParameterSchema, ParameterSpec, ToolDescriptor, ToolError, ToolOutput, ValidatedArgs,
};

/// Write tool - writes text content to a file.
pub struct WriteFileTool;

impl WriteFileTool {
    pub const NAME: &'static str = "write_file";

    pub const DESCRIPTION: &'static str =
        "Write content to a file, keeping a timestamped backup of the previous version";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            ParameterSchema::new()
                .param("filepath", ParameterSpec::string("Path of the file to write").required())
                .param("content", ParameterSpec::string("Content to write").required())
                .param(
                    "backup",
                    ParameterSpec::boolean("Back up an existing file before overwriting it")
                        .with_default(true),
                ),
        )
    }

    #[instrument(skip_all, fields(filepath = args.str("filepath").unwrap_or_default()))]
    pub async fn execute(args: &ValidatedArgs, fs: &FilesystemTools) -> Result<ToolOutput, ToolError> {
        let filepath = args.require_str("filepath")?;
        let content = args.require_str("content")?;
        let backup = args.bool("backup").unwrap_or(true);

        let path = validate_new_path(filepath, fs.security())?;
        if tokio::fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            return Err(ToolError::execution_failed(format!(
                "Path is a directory: {}",
                filepath
            )));
        }

        let backup_path = if backup && tokio::fs::try_exists(&path).await? {
            let target = backup_path_for(&path, Utc::now().timestamp_millis());
            tokio::fs::copy(&path, &target).await?;
            debug!("Backed up {} to {}", path.display(), target.display());
            Some(target)
        } else {
            None
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content.as_bytes()).await?;

        info!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(ToolOutput::from_json(json!({
            "path": path.display().to_string(),
            "size": content.len(),
            "backup": backup_path.map(|p| p.display().to_string()),
        })))
    }
}

/// `<path>.backup.<unix millis>`
fn backup_path_for(path: &Path, millis: i64) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".backup.{}", millis));
    PathBuf::from(name)
}
