//! Parameter Coercer - turns raw caller input into a tool's argument set.
//!
//! Rules:
//! - a staged file path is injected under the tool's file parameter and always
//!   overrides a same-named raw value;
//! - a file-accepting tool without a staged file still runs, and reports its
//!   own missing-file condition;
//! - undeclared parameters are not rejected: they travel in a side map;
//! - parameter text that is not a JSON object fails at the parse stage.

use serde_json::{Map, Value};
use tracing::debug;

use super::error::ToolError;
use super::registry::ToolDescriptor;

/// Raw parameters as received from a caller.
#[derive(Debug, Clone)]
pub enum RawParameters {
    /// Unparsed JSON text, e.g. a form field or a model's tool-call arguments.
    Text(String),
    /// An already parsed JSON object.
    Object(Map<String, Value>),
}

impl From<Map<String, Value>> for RawParameters {
    fn from(map: Map<String, Value>) -> Self {
        Self::Object(map)
    }
}

/// Validated arguments for one tool invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArguments {
    /// Declared parameters, including the injected file path.
    pub values: Map<String, Value>,
    /// Parameters the tool did not declare.
    pub extras: Map<String, Value>,
}

/// Parse raw parameter text into a JSON object.
///
/// Blank text counts as `{}`.
pub fn parse_raw_parameters(text: &str) -> Result<Map<String, Value>, ToolError> {
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ToolError::parse(format!(
            "parameters must be a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(ToolError::parse(format!("malformed parameters JSON: {e}"))),
    }
}

/// Build the argument set for `descriptor` from raw parameters and an optional staged file.
pub fn coerce(
    descriptor: &ToolDescriptor,
    raw: RawParameters,
    file_path: Option<&str>,
) -> Result<ToolArguments, ToolError> {
    let raw = match raw {
        RawParameters::Text(text) => parse_raw_parameters(&text)?,
        RawParameters::Object(map) => map,
    };

    let mut args = ToolArguments::default();
    for (name, value) in raw {
        if descriptor.declares(&name) {
            args.values.insert(name, value);
        } else {
            args.extras.insert(name, value);
        }
    }

    match (descriptor.file_parameter, file_path) {
        (Some(param), Some(path)) => {
            args.values
                .insert(param.to_string(), Value::String(path.to_string()));
        }
        (None, Some(path)) => {
            debug!(
                "Tool {} takes no file, ignoring staged file {}",
                descriptor.name, path
            );
        }
        _ => {}
    }

    Ok(args)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
