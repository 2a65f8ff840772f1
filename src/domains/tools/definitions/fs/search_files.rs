//! Search files tool definition.
//!
//! Plain substring search over the files below a directory. Hidden
//! directories are skipped and at most five matching lines are reported per
//! file.

use std::path::Path;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, instrument};

use super::{FilesystemTools, relative_display};
use crate::core::security::validate_path;
use crate::domains::tools::{
    ParameterSchema, ParameterSpec, ToolDescriptor, ToolError, ToolOutput, ValidatedArgs,
};

const MAX_MATCHES_PER_FILE: usize = 5;

#[derive(Debug, Serialize)]
struct LineMatch {
    line: usize,
    content: String,
}

#[derive(Debug, Serialize)]
struct FileMatches {
    file: String,
    matches: Vec<LineMatch>,
}

/// Search tool - finds lines containing a pattern.
pub struct SearchFilesTool;

impl SearchFilesTool {
    pub const NAME: &'static str = "search_files";

    pub const DESCRIPTION: &'static str = "Search file contents for a text pattern";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            ParameterSchema::new()
                .param("directory", ParameterSpec::string("Directory to search").with_default("."))
                .param("pattern", ParameterSpec::string("Text to look for").required())
                .param(
                    "extension",
                    ParameterSpec::string("Only search files whose name ends with this suffix"),
                ),
        )
    }

    #[instrument(skip_all, fields(pattern = args.str("pattern").unwrap_or_default()))]
    pub async fn execute(args: &ValidatedArgs, fs: &FilesystemTools) -> Result<ToolOutput, ToolError> {
        let directory = args.str("directory").unwrap_or(".");
        let pattern = args.require_str("pattern")?;
        let extension = args.str("extension");

        let root = validate_path(directory, fs.security())?;
        if !tokio::fs::metadata(&root).await?.is_dir() {
            return Err(ToolError::execution_failed(format!(
                "Not a directory: {}",
                directory
            )));
        }

        let results = search(&root, pattern, extension, fs.limits().max_read_bytes).await?;
        info!("Pattern found in {} files", results.len());

        Ok(ToolOutput::from_json(json!({
            "pattern": pattern,
            "directory": root.display().to_string(),
            "totalFiles": results.len(),
            "results": results,
        })))
    }
}

async fn search(
    root: &Path,
    pattern: &str,
    extension: Option<&str>,
    max_file_bytes: u64,
) -> Result<Vec<FileMatches>, ToolError> {
    let mut results = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut reader = match tokio::fs::read_dir(&dir).await {
            Ok(reader) => reader,
            Err(e) if dir == root => return Err(e.into()),
            Err(e) => {
                debug!("Skipping unreadable directory {}: {}", dir.display(), e);
                continue;
            }
        };

        while let Some(entry) = reader.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type().await?;

            if file_type.is_dir() {
                if !name.starts_with('.') {
                    pending.push(entry.path());
                }
                continue;
            }
            if !file_type.is_file() {
                continue;
            }
            if extension.is_some_and(|ext| !name.ends_with(ext)) {
                continue;
            }
            if entry.metadata().await.map(|m| m.len() > max_file_bytes).unwrap_or(true) {
                continue;
            }

            // Binary and non-UTF-8 files are skipped.
            let Ok(content) = tokio::fs::read_to_string(entry.path()).await else {
                continue;
            };

            let matches: Vec<LineMatch> = content
                .lines()
                .enumerate()
                .filter(|(_, line)| line.contains(pattern))
                .take(MAX_MATCHES_PER_FILE)
                .map(|(index, line)| LineMatch {
                    line: index + 1,
                    content: line.trim().to_string(),
                })
                .collect();

            if !matches.is_empty() {
                results.push(FileMatches {
                    file: relative_display(root, &entry.path()),
                    matches,
                });
            }
        }
    }

    results.sort_by(|a, b| a.file.cmp(&b.file));
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::testing::validated;
    use serde_json::Value;
    use tempfile::TempDir;

    async fn run(dir: &TempDir, extra: Value) -> ToolOutput {
        let mut args = json!({ "directory": dir.path().to_str().unwrap() });
        args.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        SearchFilesTool::execute(
            &validated(&SearchFilesTool::descriptor(), args),
            &FilesystemTools::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_finds_matches_with_line_numbers() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "fn a() {}\n  // TODO: b\nfn c() {}\n").unwrap();
        std::fs::write(dir.path().join("notes.md"), "nothing here").unwrap();

        let output = run(&dir, json!({ "pattern": "TODO" })).await;

        assert_eq!(output.data["totalFiles"], 1);
        assert_eq!(
            output.data["results"],
            json!([{ "file": "src/lib.rs", "matches": [{ "line": 2, "content": "// TODO: b" }] }])
        );
    }

    #[tokio::test]
    async fn test_caps_matches_per_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("many.txt"), "hit\n".repeat(20)).unwrap();

        let output = run(&dir, json!({ "pattern": "hit" })).await;

        let matches = output.data["results"][0]["matches"].as_array().unwrap();
        assert_eq!(matches.len(), MAX_MATCHES_PER_FILE);
    }

    #[tokio::test]
    async fn test_skips_hidden_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/config"), "needle").unwrap();
        std::fs::write(dir.path().join("visible.txt"), "needle").unwrap();

        let output = run(&dir, json!({ "pattern": "needle" })).await;

        assert_eq!(output.data["totalFiles"], 1);
        assert_eq!(output.data["results"][0]["file"], "visible.txt");
    }

    #[tokio::test]
    async fn test_extension_filter() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "needle").unwrap();
        std::fs::write(dir.path().join("b.txt"), "needle").unwrap();

        let output = run(&dir, json!({ "pattern": "needle", "extension": ".rs" })).await;

        assert_eq!(output.data["totalFiles"], 1);
        assert_eq!(output.data["results"][0]["file"], "a.rs");
    }
}
