//! List files tool definition.

use std::path::Path;

use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument};

use super::{FilesystemTools, relative_display};
use crate::core::security::validate_path;
use crate::domains::tools::{
    ParameterSchema, ParameterSpec, ToolDescriptor, ToolError, ToolOutput, ValidatedArgs,
};

/// One directory entry in a non-recursive listing.
#[derive(Debug, Serialize)]
struct DirEntry {
    name: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

/// List tool - lists a directory, optionally walking it recursively.
pub struct ListFilesTool;

impl ListFilesTool {
    pub const NAME: &'static str = "list_files";

    pub const DESCRIPTION: &'static str =
        "List the files in a directory. With recursive=true, returns every file path below it.";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            ParameterSchema::new()
                .param("directory", ParameterSpec::string("Directory to list").with_default("."))
                .param(
                    "recursive",
                    ParameterSpec::boolean("Walk subdirectories").with_default(false),
                ),
        )
    }

    #[instrument(skip_all, fields(directory = args.str("directory").unwrap_or_default()))]
    pub async fn execute(args: &ValidatedArgs, fs: &FilesystemTools) -> Result<ToolOutput, ToolError> {
        let directory = args.str("directory").unwrap_or(".");
        let recursive = args.bool("recursive").unwrap_or(false);

        let root = validate_path(directory, fs.security())?;
        if !tokio::fs::metadata(&root).await?.is_dir() {
            return Err(ToolError::execution_failed(format!(
                "Not a directory: {}",
                directory
            )));
        }

        let output = if recursive {
            let files = walk_files(&root).await?;
            info!("Listed {} files under {}", files.len(), root.display());
            json!({
                "directory": root.display().to_string(),
                "count": files.len(),
                "files": files,
            })
        } else {
            let mut entries = Vec::new();
            let mut reader = tokio::fs::read_dir(&root).await?;
            while let Some(entry) = reader.next_entry().await? {
                let kind = if entry.file_type().await?.is_dir() {
                    "directory"
                } else {
                    "file"
                };
                entries.push(DirEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    kind,
                });
            }
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            info!("Listed {} entries in {}", entries.len(), root.display());
            json!({
                "directory": root.display().to_string(),
                "count": entries.len(),
                "files": entries,
            })
        };

        Ok(ToolOutput::from_json(output))
    }
}

/// Every non-directory entry below `root`, as sorted relative paths.
///
/// Symlinked directories are reported as files and not followed.
async fn walk_files(root: &Path) -> Result<Vec<String>, ToolError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut reader = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = reader.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                pending.push(entry.path());
            } else {
                files.push(relative_display(root, &entry.path()));
            }
        }
    }

    files.sort();
    Ok(files)
}
