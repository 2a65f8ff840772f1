//! Documentation capability group (`ref_search_docs`, `ref_solve_error`).
//!
//! Only a canned backend exists; [`DocSearch`] is the seam a real index
//! would plug into.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use crate::domains::tools::{
    CapabilityGroup, ParameterSchema, ParameterSpec, ToolDescriptor, ToolError, ToolOutput,
    ValidatedArgs,
};

/// Which documentation corpus to search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocSource {
    Public,
    Private,
}

impl DocSource {
    pub const ALL: [&'static str; 2] = ["public", "private"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

/// A single search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocHit {
    pub title: String,
    pub kind: String,
    pub summary: String,
}

/// Documentation index behind the docs tools.
#[async_trait]
pub trait DocSearch: Send + Sync {
    /// Whether answers come from canned data.
    fn is_simulated(&self) -> bool;

    async fn search(&self, query: &str, source: DocSource) -> Result<Vec<DocHit>, ToolError>;

    async fn solve_error(&self, error: &str, language: Option<&str>) -> Result<Vec<String>, ToolError>;
}

/// Canned documentation answers.
#[derive(Debug, Default)]
pub struct StubDocs;

#[async_trait]
impl DocSearch for StubDocs {
    fn is_simulated(&self) -> bool {
        true
    }

    async fn search(&self, query: &str, _source: DocSource) -> Result<Vec<DocHit>, ToolError> {
        Ok(vec![
            DocHit {
                title: format!("{} guide", query),
                kind: "official documentation".into(),
                summary: format!("Reference documentation covering {}", query),
            },
            DocHit {
                title: format!("{} examples", query),
                kind: "code examples".into(),
                summary: "Working implementations from public repositories".into(),
            },
            DocHit {
                title: format!("Questions about {}", query),
                kind: "community Q&A".into(),
                summary: "Related questions and accepted answers".into(),
            },
        ])
    }

    async fn solve_error(&self, _error: &str, _language: Option<&str>) -> Result<Vec<String>, ToolError> {
        Ok(vec![
            "Common causes and how to fix them".into(),
            "Links to the relevant documentation".into(),
            "Code examples".into(),
        ])
    }
}

/// Handler for the docs tools.
pub struct DocTools {
    index: Arc<dyn DocSearch>,
}

impl Default for DocTools {
    fn default() -> Self {
        Self::new(Arc::new(StubDocs))
    }
}

impl DocTools {
    pub const SEARCH: &'static str = "ref_search_docs";
    pub const SOLVE_ERROR: &'static str = "ref_solve_error";

    pub fn new(index: Arc<dyn DocSearch>) -> Self {
        Self { index }
    }

    async fn search(&self, args: &ValidatedArgs) -> Result<ToolOutput, ToolError> {
        let query = args.require_str("query")?;
        let source_name = args.require_str("source")?;
        let source = DocSource::parse(source_name)
            .ok_or_else(|| ToolError::internal(format!("unvalidated source '{}'", source_name)))?;

        let hits = self.index.search(query, source).await?;
        let listing = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| format!("{}. {} - {}", i + 1, hit.kind, hit.title))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolOutput::from_json(json!({
            "query": query,
            "source": source,
            "results": hits,
            "simulated": self.index.is_simulated(),
            "text": format!(
                "Documentation search\n\nquery: {}\nsource: {}\n\n{}",
                query, source_name, listing
            ),
        })))
    }

    async fn solve_error(&self, args: &ValidatedArgs) -> Result<ToolOutput, ToolError> {
        let error = args.require_str("error")?;
        let language = args.str("language");

        let suggestions = self.index.solve_error(error, language).await?;
        let listing = suggestions
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}. {}", i + 1, s))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolOutput::from_json(json!({
            "error": error,
            "language": language.unwrap_or("auto-detect"),
            "suggestions": suggestions,
            "simulated": self.index.is_simulated(),
            "text": format!(
                "Error lookup\n\nerror: {}\nlanguage: {}\n\n{}",
                error,
                language.unwrap_or("auto-detect"),
                listing
            ),
        })))
    }
}

#[async_trait]
impl CapabilityGroup for DocTools {
    fn name(&self) -> &'static str {
        "docs"
    }

    fn tools(&self) -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new(
                Self::SEARCH,
                "Search technical documentation",
                ParameterSchema::new()
                    .param("query", ParameterSpec::string("Search query").required())
                    .param(
                        "source",
                        ParameterSpec::one_of(DocSource::ALL, "Documentation corpus")
                            .with_default("public"),
                    ),
            ),
            ToolDescriptor::new(
                Self::SOLVE_ERROR,
                "Look up fixes for an error message",
                ParameterSchema::new()
                    .param("error", ParameterSpec::string("Error message").required())
                    .param("language", ParameterSpec::string("Programming language")),
            ),
        ]
    }

    async fn handle(&self, tool: &str, args: ValidatedArgs) -> Result<ToolOutput, ToolError> {
        match tool {
            Self::SEARCH => self.search(&args).await,
            Self::SOLVE_ERROR => self.solve_error(&args).await,
            other => Err(ToolError::unknown_tool(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::testing::validated;
    use serde_json::Value;

    async fn call(tool: &str, args: Value) -> ToolOutput {
        let group = DocTools::default();
        let descriptor = group.tools().into_iter().find(|d| d.name == tool).unwrap();
        group.handle(tool, validated(&descriptor, args)).await.unwrap()
    }

    #[tokio::test]
    async fn test_search_defaults_to_public() {
        let output = call(DocTools::SEARCH, json!({ "query": "tokio select" })).await;

        assert_eq!(output.data["source"], "public");
        assert_eq!(output.data["simulated"], true);
        assert_eq!(output.data["results"][0]["title"], "tokio select guide");
        assert_eq!(output.data["results"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_search_private_source() {
        let output = call(DocTools::SEARCH, json!({ "query": "q", "source": "private" })).await;
        assert_eq!(output.data["source"], "private");
    }

    #[tokio::test]
    async fn test_solve_error_language() {
        let output = call(DocTools::SOLVE_ERROR, json!({ "error": "E0502" })).await;
        assert_eq!(output.data["language"], "auto-detect");

        let output = call(DocTools::SOLVE_ERROR, json!({ "error": "E0502", "language": "rust" })).await;
        assert_eq!(output.data["language"], "rust");
        assert!(output.data["text"].as_str().unwrap().contains("E0502"));
    }

    #[test]
    fn test_doc_source_parse() {
        assert_eq!(DocSource::parse("public"), Some(DocSource::Public));
        assert_eq!(DocSource::parse("Public"), None);
    }
}
