//! Diagnostic flow: invoke one tool directly, without the completion client.
//!
//! Every invocation still goes through the [`Dispatcher`](crate::domains::tools::Dispatcher),
//! so diagnostic calls validate exactly like model-initiated ones.

use serde_json::{Map, Number, Value};
use tracing::{info, instrument, warn};

use super::envelope::DebugReply;
use crate::core::GatewayServer;
use crate::core::staging::{StagedFile, Upload};
use crate::core::trace;
use crate::domains::tools::{InvocationRequest, ToolError, ToolId, parse_raw_parameters};

/// How a form field is turned into a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Any finite number.
    Number,
    Integer,
}

/// A typed form field of a fixed diagnostic route.
#[derive(Debug, Clone, Copy)]
pub struct FormField {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(name: &'static str, kind: FieldKind, required: bool) -> FormField {
    FormField {
        name,
        kind,
        required,
    }
}

/// Form fields of `/debug/transcribe`.
pub const TRANSCRIBE_FIELDS: &[FormField] = &[
    field("youtube_url", FieldKind::Text, true),
    field("start_time", FieldKind::Number, true),
    field("end_time", FieldKind::Number, true),
];

/// Form fields of `/debug/duckdb_query`.
pub const DUCKDB_FIELDS: &[FormField] = &[
    field("query_type", FieldKind::Text, true),
    field("timestamp_filter", FieldKind::Text, false),
    field("numeric_filter", FieldKind::Integer, false),
    field("sort_order", FieldKind::Text, false),
];

/// First required field absent from the form.
pub fn first_missing<'a>(
    fields: &[FormField],
    lookup: impl Fn(&str) -> Option<&'a str>,
) -> Option<&'static str> {
    fields
        .iter()
        .find(|f| f.required && lookup(f.name).is_none())
        .map(|f| f.name)
}

/// Invoke `tool_name` with JSON parameter text and an optional upload.
///
/// Unknown names never reach the dispatcher. The hashing tool only ever sees
/// the staged file; `params` is ignored for it.
#[instrument(skip(server, params, upload), fields(file_provided = upload.is_some()))]
pub async fn invoke_tool(
    server: &GatewayServer,
    tool_name: &str,
    params: &str,
    upload: Option<Upload>,
) -> DebugReply {
    let detail = server.error_detail();

    let staged = match stage(server, upload).await {
        Ok(staged) => staged,
        Err(reply) => return reply,
    };

    let raw = match parse_raw_parameters(params) {
        Ok(raw) => raw,
        Err(e) => return DebugReply::rejected(&e),
    };

    let file_path = staged.as_ref().map(StagedFile::path_string);
    let request = if tool_name == ToolId::CalculatePrettierSha256.name() {
        match file_path {
            Some(path) => InvocationRequest::new(tool_name, Map::new()).with_file(Some(path)),
            None => return DebugReply::error(format!("No file provided for {tool_name}")),
        }
    } else if server.dispatcher().registry().lookup(tool_name).is_ok() {
        InvocationRequest::new(tool_name, raw).with_file(file_path)
    } else {
        info!("Rejected direct call to unknown tool");
        return DebugReply::error(format!(
            "Function {tool_name} not supported for direct testing"
        ));
    };

    let result = server.dispatcher().dispatch(request).await;
    DebugReply::from_result(result, detail)
}

/// Invoke `tool` with parameters built from typed form fields.
///
/// Empty optional fields count as absent. A field that does not parse as its
/// declared kind is a parse-stage rejection.
#[instrument(skip(server, form_fields, lookup), fields(tool = %tool))]
pub async fn invoke_with_fields<'a>(
    server: &GatewayServer,
    tool: ToolId,
    form_fields: &[FormField],
    lookup: impl Fn(&str) -> Option<&'a str>,
) -> DebugReply {
    let raw = match form_parameters(form_fields, lookup) {
        Ok(raw) => raw,
        Err(e) => return DebugReply::rejected(&e),
    };

    let result = server
        .dispatcher()
        .dispatch(InvocationRequest::new(tool.name(), raw))
        .await;
    DebugReply::from_result(result, server.error_detail())
}

fn form_parameters<'a>(
    fields: &[FormField],
    lookup: impl Fn(&str) -> Option<&'a str>,
) -> Result<Map<String, Value>, ToolError> {
    let mut raw = Map::new();
    for field in fields {
        let Some(text) = lookup(field.name) else {
            continue;
        };
        if text.trim().is_empty() && !field.required {
            continue;
        }
        raw.insert(field.name.to_string(), field_value(field, text)?);
    }
    Ok(raw)
}

fn field_value(field: &FormField, text: &str) -> Result<Value, ToolError> {
    let trimmed = text.trim();
    match field.kind {
        FieldKind::Text => Ok(Value::String(text.to_string())),
        FieldKind::Integer => trimmed.parse::<i64>().map(Value::from).map_err(|_| {
            ToolError::parse(format!("{} must be an integer, got {text:?}", field.name))
        }),
        FieldKind::Number => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| {
                ToolError::parse(format!("{} must be a number, got {text:?}", field.name))
            }),
    }
}

async fn stage(server: &GatewayServer, upload: Option<Upload>) -> Result<Option<StagedFile>, DebugReply> {
    let Some(upload) = upload else {
        return Ok(None);
    };
    server.stager().stage(upload).await.map(Some).map_err(|e| {
        warn!("Failed to stage upload: {e}");
        DebugReply::failure(e.to_string(), trace::capture_std(e), server.error_detail())
    })
}
