//! Read file tool definition.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{info, instrument, warn};

use super::FilesystemTools;
use crate::core::security::validate_path;
use crate::domains::tools::{
    ParameterSchema, ParameterSpec, ToolDescriptor, ToolError, ToolOutput, ValidatedArgs,
};

/// Read tool - returns a file's contents as text or base64.
pub struct ReadFileTool;

impl ReadFileTool {
    pub const NAME: &'static str = "read_file";

    pub const DESCRIPTION: &'static str = "Read the contents of a file";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            ParameterSchema::new()
                .param("filepath", ParameterSpec::string("Path of the file to read").required())
                .param(
                    "encoding",
                    ParameterSpec::string("File encoding: utf-8 or base64").with_default("utf-8"),
                ),
        )
    }

    #[instrument(skip_all, fields(filepath = args.str("filepath").unwrap_or_default()))]
    pub async fn execute(args: &ValidatedArgs, fs: &FilesystemTools) -> Result<ToolOutput, ToolError> {
        let filepath = args.require_str("filepath")?;
        let encoding = args.str("encoding").unwrap_or("utf-8").to_lowercase();

        let path = validate_path(filepath, fs.security())?;
        let metadata = tokio::fs::metadata(&path).await?;
        if !metadata.is_file() {
            return Err(ToolError::execution_failed(format!("Not a file: {}", filepath)));
        }

        let limit = fs.limits().max_read_bytes;
        if metadata.len() > limit {
            warn!("Refusing to read {} bytes from {}", metadata.len(), filepath);
            return Err(ToolError::execution_failed(format!(
                "File is too large ({} bytes, limit {} bytes)",
                metadata.len(),
                limit
            )));
        }

        let bytes = tokio::fs::read(&path).await?;
        let content = match encoding.as_str() {
            "utf-8" | "utf8" => String::from_utf8(bytes).map_err(|_| {
                ToolError::execution_failed(format!(
                    "File is not valid UTF-8: {} (try encoding=base64)",
                    filepath
                ))
            })?,
            "base64" => BASE64.encode(&bytes),
            other => {
                return Err(ToolError::execution_failed(format!(
                    "Unsupported encoding: {}",
                    other
                )));
            }
        };

        let modified = metadata
            .modified()
            .ok()
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339());

        info!("Read {} bytes from {}", metadata.len(), path.display());
        Ok(ToolOutput::from_json(json!({
            "content": content,
            "encoding": encoding,
            "stats": {
                "size": metadata.len(),
                "modified": modified,
                "path": path.display().to_string(),
            }
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{SecurityConfig, ToolsConfig};
    use crate::domains::tools::testing::validated;
    use serde_json::json;
    use tempfile::TempDir;

    fn read_args(value: serde_json::Value) -> ValidatedArgs {
        validated(&ReadFileTool::descriptor(), value)
    }

    #[tokio::test]
    async fn test_read_utf8() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "hello\nworld").unwrap();

        let output = ReadFileTool::execute(
            &read_args(json!({ "filepath": file.to_str().unwrap() })),
            &FilesystemTools::default(),
        )
        .await
        .unwrap();

        assert!(output.is_success());
        assert_eq!(output.data["content"], "hello\nworld");
        assert_eq!(output.data["stats"]["size"], 11);
        assert!(output.data["stats"]["modified"].is_string());
    }

    #[tokio::test]
    async fn test_read_base64() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("blob.bin");
        std::fs::write(&file, [0u8, 159, 146, 150]).unwrap();

        let output = ReadFileTool::execute(
            &read_args(json!({ "filepath": file.to_str().unwrap(), "encoding": "base64" })),
            &FilesystemTools::default(),
        )
        .await
        .unwrap();

        assert_eq!(output.data["content"], "AJ+Slg==");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_an_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("blob.bin");
        std::fs::write(&file, [0xffu8, 0xfe]).unwrap();

        let result = ReadFileTool::execute(
            &read_args(json!({ "filepath": file.to_str().unwrap() })),
            &FilesystemTools::default(),
        )
        .await;

        assert!(matches!(result, Err(ToolError::ExecutionFailed(_))));
    }

    #[tokio::test]
    async fn test_size_limit() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("big.txt");
        std::fs::write(&file, "0123456789").unwrap();

        let limits = ToolsConfig {
            max_read_bytes: 4,
            ..Default::default()
        };
        let fs = FilesystemTools::new(SecurityConfig::default(), limits);
        let result =
            ReadFileTool::execute(&read_args(json!({ "filepath": file.to_str().unwrap() })), &fs).await;

        assert!(matches!(result, Err(ToolError::ExecutionFailed(msg)) if msg.contains("too large")));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("absent.txt");

        let result = ReadFileTool::execute(
            &read_args(json!({ "filepath": file.to_str().unwrap() })),
            &FilesystemTools::default(),
        )
        .await;

        assert!(matches!(result, Err(ToolError::PathSecurity(_))));
    }

    #[tokio::test]
    async fn test_outside_root_rejected() {
        let root = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let file = outside.path().join("secret.txt");
        std::fs::write(&file, "secret").unwrap();

        let security = SecurityConfig {
            root_path: Some(root.path().to_path_buf()),
            allow_symlinks: false,
        };
        let fs = FilesystemTools::new(security, ToolsConfig::default());
        let result =
            ReadFileTool::execute(&read_args(json!({ "filepath": file.to_str().unwrap() })), &fs).await;

        assert!(matches!(result, Err(ToolError::PathSecurity(_))));
    }
}
