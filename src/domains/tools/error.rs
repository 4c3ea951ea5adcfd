//! Tool-specific error types.

use std::time::Duration;

use thiserror::Error;

/// Stage at which tool parameters were rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStage {
    /// The raw parameter text is not a JSON object.
    Parse,
    /// The parameters do not fit the tool's declared shape.
    Bind,
}

impl ValidationStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Bind => "bind",
        }
    }
}

/// Errors that can occur during tool operations.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("tool {0} not supported")]
    NotFound(String),

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments ({}): {message}", stage.as_str())]
    InvalidArguments {
        stage: ValidationStage,
        message: String,
    },

    /// The tool timed out during execution.
    #[error("tool {name} timed out after {}", format_limit(*limit))]
    Timeout { name: String, limit: Duration },
}

/// Whole-second deadlines render as `5s`, anything finer as `250ms`.
fn format_limit(limit: Duration) -> String {
    if limit.subsec_nanos() == 0 {
        format!("{}s", limit.as_secs())
    } else {
        format!("{}ms", limit.as_millis())
    }
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a parse-stage validation error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::InvalidArguments {
            stage: ValidationStage::Parse,
            message: msg.into(),
        }
    }

    /// Create a bind-stage validation error.
    pub fn bind(msg: impl Into<String>) -> Self {
        Self::InvalidArguments {
            stage: ValidationStage::Bind,
            message: msg.into(),
        }
    }

    /// Validation stage, for parameter errors.
    pub fn stage(&self) -> Option<ValidationStage> {
        match self {
            Self::InvalidArguments { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
