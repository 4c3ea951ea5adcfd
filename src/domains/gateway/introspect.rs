//! Completion client readiness report.
//!
//! Deployment sanity check only; the report shape is not a stable contract.

use serde_json::{Map, Value, json};
use tracing::{instrument, warn};

use crate::core::GatewayServer;
use crate::core::trace;
use crate::domains::tools::ToolId;

/// Tools whose presence the report checks.
pub const WELL_KNOWN_TOOLS: [ToolId; 2] = [ToolId::TranscribeYoutubeSegment, ToolId::GenerateDuckdbQuery];

/// Report tool resolvability and signatures, then try `question` against the
/// completion client.
#[instrument(skip_all)]
pub async fn completion_report(server: &GatewayServer, question: &str) -> Value {
    let registry = server.dispatcher().registry();

    let mut present = Map::new();
    let mut functions = Map::new();
    for id in WELL_KNOWN_TOOLS {
        let entry = registry.lookup(id.name()).ok();
        present.insert(id.name().to_string(), Value::Bool(entry.is_some()));
        if let Some(entry) = entry {
            functions.insert(
                format!("{}_signature", id.name()),
                Value::String(entry.descriptor.signature()),
            );
        }
    }
    functions.insert("importable".into(), Value::Bool(!registry.is_empty()));
    functions.insert("functions".into(), Value::Object(present));

    let completion = server.completion();
    let openai_client = json!({
        "importable": true,
        "functions": { "complete": true },
        "complete_signature": completion.signature(),
    });

    let openai_response = match completion.complete(question, None).await {
        Ok(result) => json!({ "success": true, "result": result }),
        Err(e) => {
            warn!("Trial completion failed: {e:#}");
            let mut failure = json!({ "success": false, "error": e.to_string() });
            if let Some(traceback) = server.error_detail().trace(Some(trace::capture(&e))) {
                failure["traceback"] = Value::String(traceback);
            }
            failure
        }
    };

    json!({
        "question": question,
        "modules": {
            "functions": functions,
            "openai_client": openai_client,
        },
        "openai_response": openai_response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ErrorDetail;
    use crate::core::staging::TempFileStager;
    use crate::domains::gateway::tests::{FakeCompletion, builtin_server, server_with};
    use crate::domains::tools::dispatcher::tests::{EchoTool, dispatcher_with};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_report_with_builtin_tools() {
        let completion = Arc::new(FakeCompletion::answering("pong"));
        let server = builtin_server(completion.clone());

        let report = completion_report(&server, "ping").await;
        let functions = &report["modules"]["functions"];
        assert_eq!(functions["importable"], true);
        assert_eq!(functions["functions"]["transcribe_youtube_segment"], true);
        assert_eq!(functions["functions"]["generate_duckdb_query"], true);
        assert_eq!(
            functions["transcribe_youtube_segment_signature"],
            "(youtube_url, start_time, end_time)"
        );
        assert_eq!(report["openai_response"], json!({ "success": true, "result": "pong" }));
        assert_eq!(completion.calls()[0].question, "ping");
    }

    #[tokio::test]
    async fn test_report_missing_tools_and_failed_trial() {
        let server = server_with(
            dispatcher_with(vec![Arc::new(EchoTool::default())]),
            Arc::new(FakeCompletion::failing()),
            Arc::new(TempFileStager::in_dir(std::env::temp_dir())),
            ErrorDetail::Minimal,
        );

        let report = completion_report(&server, "ping").await;
        let functions = &report["modules"]["functions"];
        assert_eq!(functions["functions"]["generate_duckdb_query"], false);
        assert!(functions.get("generate_duckdb_query_signature").is_none());
        assert_eq!(
            report["openai_response"],
            json!({ "success": false, "error": "upstream unavailable" })
        );
    }
}
