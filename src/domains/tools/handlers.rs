//! Tool handler traits.
//!
//! Tool definitions implement the typed [`Tool`] trait: a parameter struct,
//! declared parameter names, and an async `run`. The blanket [`ToolHandler`]
//! implementation binds coerced arguments to that struct and gives the
//! registry an object-safe handle to store.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::coercer::ToolArguments;
use super::error::ToolError;
use super::registry::ToolDescriptor;
use crate::core::config::Config;

/// Shared, read-only state handed to every tool invocation.
#[derive(Clone)]
pub struct ToolContext {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

impl ToolContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

/// How a handler call went wrong.
#[derive(Debug)]
pub enum HandlerError {
    /// Arguments did not fit the tool's parameters; the tool never ran.
    Validation(ToolError),
    /// The tool's own logic failed.
    Failed(anyhow::Error),
}

/// Object-safe handle the registry stores for each tool.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Metadata describing this tool.
    fn descriptor(&self) -> ToolDescriptor;

    /// Bind the arguments and execute the tool.
    async fn call(&self, args: ToolArguments, ctx: &ToolContext) -> Result<Value, HandlerError>;
}

/// A tool with a typed parameter struct.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    /// Tool name, the registry key.
    const NAME: &'static str;

    /// Description shown to the completion service.
    const DESCRIPTION: &'static str;

    /// Declared parameter names, in signature order.
    const PARAMETERS: &'static [&'static str];

    /// Parameter that receives the staged file path, for tools that take a file.
    const FILE_PARAMETER: Option<&'static str> = None;

    type Params: DeserializeOwned + JsonSchema + Send;

    /// Execute the tool. `extras` holds any parameters the tool did not declare.
    async fn run(
        &self,
        params: Self::Params,
        extras: Map<String, Value>,
        ctx: &ToolContext,
    ) -> anyhow::Result<Value>;
}

#[async_trait]
impl<T: Tool> ToolHandler for T {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: T::NAME,
            description: T::DESCRIPTION,
            parameter_names: T::PARAMETERS,
            file_parameter: T::FILE_PARAMETER,
            schema: parameters_schema::<T::Params>(),
        }
    }

    async fn call(&self, args: ToolArguments, ctx: &ToolContext) -> Result<Value, HandlerError> {
        let ToolArguments { values, extras } = args;
        let params: T::Params = serde_json::from_value(Value::Object(values))
            .map_err(|e| HandlerError::Validation(ToolError::bind(e.to_string())))?;
        self.run(params, extras, ctx)
            .await
            .map_err(HandlerError::Failed)
    }
}

/// JSON Schema for a parameter struct, as advertised in function definitions.
pub fn parameters_schema<P: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(P)).unwrap_or_default();
    if let Value::Object(map) = &mut schema {
        map.remove("$schema");
        map.remove("title");
    }
    schema
}
