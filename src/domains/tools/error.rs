//! Tool-specific error types.

use std::time::Duration;

use thiserror::Error;

use super::handlers::ErrorCode;
use super::schema::ValidationError;
use crate::core::security::PathSecurityError;

/// Errors that can occur during tool registration and execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A tool with the same name is already registered.
    #[error("Duplicate tool name: {0}")]
    DuplicateToolName(String),

    /// The arguments did not satisfy the tool's schema.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A filesystem path was rejected by the sandbox.
    #[error("Path security validation failed: {0}")]
    PathSecurity(#[from] PathSecurityError),

    /// I/O failure inside a handler.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The tool execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The tool timed out during execution.
    #[error("Tool execution timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "unknown tool" error.
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Machine-readable code reported in failure envelopes.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownTool(_) => ErrorCode::UnknownTool,
            Self::DuplicateToolName(_) => ErrorCode::DuplicateToolName,
            Self::Validation(ValidationError::MissingRequiredParameter { .. }) => {
                ErrorCode::MissingRequiredParameter
            }
            Self::Validation(ValidationError::TypeMismatch { .. }) => ErrorCode::TypeMismatch,
            Self::Validation(ValidationError::InvalidEnumValue { .. }) => ErrorCode::InvalidEnumValue,
            Self::PathSecurity(_)
            | Self::Io(_)
            | Self::ExecutionFailed(_)
            | Self::Timeout(_)
            | Self::Internal(_) => ErrorCode::HandlerFault,
        }
    }
}
