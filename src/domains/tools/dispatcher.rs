//! Dispatcher - resolves, coerces, invokes, and normalizes tool calls.
//!
//! Every outcome is an [`InvocationResult`]; no error or panic raised by a
//! handler escapes [`Dispatcher::dispatch`].

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::coercer::{RawParameters, coerce};
use super::error::{ToolError, ValidationStage};
use super::handlers::{HandlerError, ToolContext};
use super::registry::ToolRegistry;
use crate::core::trace;

/// One request to invoke a tool.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub tool_name: String,
    pub raw_parameters: RawParameters,
    pub file_path: Option<String>,
}

impl InvocationRequest {
    pub fn new(tool_name: impl Into<String>, raw_parameters: impl Into<RawParameters>) -> Self {
        Self {
            tool_name: tool_name.into(),
            raw_parameters: raw_parameters.into(),
            file_path: None,
        }
    }

    pub fn with_file(mut self, file_path: Option<String>) -> Self {
        self.file_path = file_path;
        self
    }
}

/// Category of a failed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Validation,
    Handler,
    Timeout,
}

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationResult {
    Success {
        value: Value,
    },
    Failure {
        kind: FailureKind,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stage: Option<ValidationStage>,
        #[serde(skip_serializing_if = "Option::is_none")]
        diagnostic_trace: Option<String>,
    },
}

impl InvocationResult {
    /// A failure that did not involve running handler logic.
    pub fn rejected(err: &ToolError) -> Self {
        let kind = match err {
            ToolError::NotFound(_) => FailureKind::NotFound,
            ToolError::InvalidArguments { .. } => FailureKind::Validation,
            ToolError::Timeout { .. } => FailureKind::Timeout,
        };
        Self::Failure {
            kind,
            message: err.to_string(),
            stage: err.stage(),
            diagnostic_trace: None,
        }
    }

    fn handler_failed(err: &anyhow::Error) -> Self {
        Self::Failure {
            kind: FailureKind::Handler,
            message: err.to_string(),
            stage: None,
            diagnostic_trace: Some(trace::capture(err)),
        }
    }
}

/// Routes invocation requests to registered tools.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    context: ToolContext,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, context: ToolContext) -> Self {
        let timeout = context.config.tools.timeout_secs.map(Duration::from_secs);
        Self {
            registry,
            context,
            timeout,
        }
    }

    /// Override the per-invocation deadline.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Resolve, coerce, and invoke. Always yields a result.
    #[instrument(skip_all, fields(tool = %request.tool_name, file = request.file_path.is_some()))]
    pub async fn dispatch(&self, request: InvocationRequest) -> InvocationResult {
        let entry = match self.registry.lookup(&request.tool_name) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Unknown tool requested: {}", request.tool_name);
                return InvocationResult::rejected(&e);
            }
        };

        let args = match coerce(
            &entry.descriptor,
            request.raw_parameters,
            request.file_path.as_deref(),
        ) {
            Ok(args) => args,
            Err(e) => {
                warn!("Rejected parameters for {}: {}", request.tool_name, e);
                return InvocationResult::rejected(&e);
            }
        };

        let started = Instant::now();
        let call = AssertUnwindSafe(entry.handler.call(args, &self.context)).catch_unwind();
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    let err = ToolError::Timeout {
                        name: request.tool_name.clone(),
                        limit,
                    };
                    warn!("{}", err);
                    return InvocationResult::rejected(&err);
                }
            },
            None => call.await,
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(value)) => {
                info!(elapsed_ms, "Tool {} succeeded", request.tool_name);
                InvocationResult::Success { value }
            }
            Ok(Err(HandlerError::Validation(e))) => {
                warn!("Rejected parameters for {}: {}", request.tool_name, e);
                InvocationResult::rejected(&e)
            }
            Ok(Err(HandlerError::Failed(e))) => {
                warn!(elapsed_ms, "Tool {} failed: {:#}", request.tool_name, e);
                InvocationResult::handler_failed(&e)
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(elapsed_ms, "Tool {} panicked: {}", request.tool_name, message);
                InvocationResult::handler_failed(&anyhow::anyhow!("tool panicked: {message}"))
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
