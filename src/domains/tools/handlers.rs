//! Tool handler contract and the response envelope.
//!
//! Tools are contributed by capability groups. A group owns a set of related
//! descriptors and a single handler that is called with the tool name and the
//! already-validated arguments. Whatever the handler does, the caller always
//! receives a [`ToolOutput`] envelope.

use rmcp::model::{CallToolResult, Content};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ToolError;
use super::registry::ToolDescriptor;
use super::schema::ValidatedArgs;

/// Machine-readable failure codes carried by failure envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    UnknownTool,
    MissingRequiredParameter,
    TypeMismatch,
    InvalidEnumValue,
    DuplicateToolName,
    HandlerFault,
}

/// Output from a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Whether the execution was successful.
    pub success: bool,

    /// The result data from the tool.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,

    /// Optional error message if execution failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Machine-readable failure code, when one applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl ToolOutput {
    /// Create a successful tool output.
    pub fn success(data: Map<String, Value>) -> Self {
        Self {
            success: true,
            data,
            error: None,
            code: None,
        }
    }

    /// Create a successful output from a `json!({...})` object literal.
    ///
    /// Non-object values are wrapped under a `result` key.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::success(map),
            other => {
                let mut map = Map::new();
                map.insert("result".into(), other);
                Self::success(map)
            }
        }
    }

    /// Create a failed tool output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Map::new(),
            error: Some(error.into()),
            code: None,
        }
    }

    /// Attach a failure code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach payload data, e.g. captured output of a failed command.
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Serialize the envelope as a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({ "success": self.success }))
    }

    /// Convert to an MCP tool result: the envelope as pretty JSON text plus
    /// the same envelope as structured content.
    pub fn to_call_result(&self) -> CallToolResult {
        let envelope = self.to_value();
        let text = serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| envelope.to_string());
        CallToolResult {
            content: vec![Content::text(text)],
            structured_content: Some(envelope),
            is_error: Some(!self.success),
            meta: None,
        }
    }
}

impl From<ToolError> for ToolOutput {
    fn from(err: ToolError) -> Self {
        let code = err.code();
        Self::failure(err.to_string()).with_code(code)
    }
}

/// A capability group: related tool descriptors plus their shared handler.
///
/// Groups are stateless with respect to individual calls; any backing store is
/// held behind its own synchronization.
#[async_trait::async_trait]
pub trait CapabilityGroup: Send + Sync {
    /// Short group name used for catalog categories.
    fn name(&self) -> &'static str;

    /// Descriptors of every tool this group serves.
    fn tools(&self) -> Vec<ToolDescriptor>;

    /// Execute one of this group's tools with validated arguments.
    async fn handle(&self, tool: &str, args: ValidatedArgs) -> Result<ToolOutput, ToolError>;

    /// Release external resources before the process exits.
    async fn shutdown(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shape() {
        let ok = ToolOutput::from_json(json!({ "path": "/tmp/a" }));
        assert_eq!(ok.to_value(), json!({ "success": true, "data": { "path": "/tmp/a" } }));

        let failed: ToolOutput = ToolError::unknown_tool("nope").into();
        assert_eq!(
            failed.to_value(),
            json!({ "success": false, "error": "Unknown tool: nope", "code": "UnknownTool" })
        );
    }

    #[test]
    fn test_call_result_flags_errors() {
        let result = ToolOutput::failure("boom").to_call_result();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(result.structured_content.unwrap()["error"], "boom");

        let result = ToolOutput::from_json(json!(42)).to_call_result();
        assert_eq!(result.is_error, Some(false));
        assert_eq!(result.structured_content.unwrap()["data"]["result"], 42);
    }
}
