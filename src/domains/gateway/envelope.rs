//! Response envelopes.
//!
//! The answer endpoint and the diagnostic endpoints report failures
//! differently: the answer endpoint uses a server-error status with two
//! distinct failure shapes, the diagnostic endpoints always answer 200 with an
//! `error` field.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::core::config::ErrorDetail;
use crate::domains::tools::{InvocationResult, ToolError, ValidationStage};

/// Reply of the answer endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnswerReply {
    Answer {
        answer: String,
    },
    /// The completion client failed.
    CompletionFailed {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        traceback: Option<String>,
        question: String,
        #[serde(rename = "fileProvided")]
        file_provided: bool,
    },
    /// The upload could not be staged; the completion client was not called.
    StagingFailed {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        traceback: Option<String>,
    },
}

impl AnswerReply {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Answer { .. } => StatusCode::OK,
            Self::CompletionFailed { .. } | Self::StagingFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AnswerReply {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Reply of the diagnostic endpoints. Always sent with status 200.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DebugReply {
    Result {
        result: Value,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        traceback: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        stage: Option<ValidationStage>,
    },
}

impl DebugReply {
    /// A bare error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
            traceback: None,
            stage: None,
        }
    }

    /// A failure with a diagnostic trace, subject to the detail policy.
    pub fn failure(message: impl Into<String>, trace: String, detail: ErrorDetail) -> Self {
        Self::Error {
            error: message.into(),
            traceback: detail.trace(Some(trace)),
            stage: None,
        }
    }

    /// A request rejected before any tool ran.
    pub fn rejected(err: &ToolError) -> Self {
        Self::Error {
            error: err.to_string(),
            traceback: None,
            stage: err.stage(),
        }
    }

    pub fn from_result(result: InvocationResult, detail: ErrorDetail) -> Self {
        match result {
            InvocationResult::Success { value } => Self::Result { result: value },
            InvocationResult::Failure {
                message,
                stage,
                diagnostic_trace,
                ..
            } => Self::Error {
                error: message,
                traceback: detail.trace(diagnostic_trace),
                stage,
            },
        }
    }
}

impl IntoResponse for DebugReply {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
