//! HTTP transport implementation.
//!
//! Form-encoded POST endpoints for answering questions and for invoking tools
//! directly, plus an informational root and a health check. Routes:
//!
//! - `POST /api/` (and `/api`) - question + optional file → answer
//! - `POST /debug/transcribe`, `POST /debug/duckdb_query` - typed form fields → one tool
//! - `POST /debug/openai_client` - completion client readiness report
//! - `POST /debug/{function_name}` - JSON `params` + optional file → any registered tool

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State},
    response::IntoResponse,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use super::config::HttpConfig;
use super::error::{TransportError, TransportResult};
use super::form::{FormData, FormRejection};
use crate::core::GatewayServer;
use crate::domains::gateway::{
    self, AnswerReply, DUCKDB_FIELDS, DebugReply, FormField, TRANSCRIBE_FIELDS, first_missing,
};
use crate::domains::tools::ToolId;

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        self.config.address()
    }

    /// Run the HTTP transport until the server stops.
    pub async fn run(self, server: GatewayServer) -> TransportResult<()> {
        let addr = self.address();
        let app = router(server, &self.config);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - listening on {} (CORS {})", addr, cors_status);
        info!("  → Answer:     POST /api/");
        info!("  → Diagnostic: POST /debug/{{function_name}}");
        info!("  → Health:     GET /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Build the gateway router.
pub fn router(server: GatewayServer, config: &HttpConfig) -> Router {
    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api", post(handle_answer))
        .route("/api/", post(handle_answer))
        .route("/debug/transcribe", post(handle_debug_transcribe))
        .route("/debug/duckdb_query", post(handle_debug_duckdb))
        .route("/debug/openai_client", post(handle_debug_completion))
        .route("/debug/{function_name}", post(handle_debug_tool))
        .with_state(server)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(config.max_upload_bytes)),
        );

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Root handler - provides API info.
async fn root_handler(State(server): State<GatewayServer>) -> impl IntoResponse {
    Json(serde_json::json!({
        "name": server.name(),
        "version": server.version(),
        "tools": server.dispatcher().registry().names(),
        "endpoints": {
            "answer": "/api/",
            "debug": "/debug/{function_name}",
            "health": "/health"
        }
    }))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

#[instrument(skip_all)]
async fn handle_answer(
    State(server): State<GatewayServer>,
    mut form: FormData,
) -> Result<AnswerReply, FormRejection> {
    let question = form.require("question")?.to_string();
    info!("Received question");
    Ok(gateway::answer(&server, &question, form.take_file()).await)
}

#[instrument(skip_all, fields(tool = %function_name))]
async fn handle_debug_tool(
    State(server): State<GatewayServer>,
    Path(function_name): Path<String>,
    mut form: FormData,
) -> DebugReply {
    let params = form.field("params").unwrap_or("{}").to_string();
    let upload = form.take_file();
    gateway::invoke_tool(&server, &function_name, &params, upload).await
}

async fn handle_debug_transcribe(
    State(server): State<GatewayServer>,
    form: FormData,
) -> Result<DebugReply, FormRejection> {
    invoke_fixed(&server, ToolId::TranscribeYoutubeSegment, TRANSCRIBE_FIELDS, &form).await
}

async fn handle_debug_duckdb(
    State(server): State<GatewayServer>,
    form: FormData,
) -> Result<DebugReply, FormRejection> {
    invoke_fixed(&server, ToolId::GenerateDuckdbQuery, DUCKDB_FIELDS, &form).await
}

async fn invoke_fixed(
    server: &GatewayServer,
    tool: ToolId,
    fields: &[FormField],
    form: &FormData,
) -> Result<DebugReply, FormRejection> {
    if let Some(name) = first_missing(fields, |name| form.field(name)) {
        return Err(FormRejection::MissingField(name.to_string()));
    }
    Ok(gateway::invoke_with_fields(server, tool, fields, |name| form.field(name)).await)
}

async fn handle_debug_completion(
    State(server): State<GatewayServer>,
    form: FormData,
) -> Result<impl IntoResponse, FormRejection> {
    let question = form.require("question")?;
    Ok(Json(gateway::completion_report(&server, question).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ErrorDetail;
    use crate::core::staging::TempFileStager;
    use crate::domains::gateway::tests::{FakeCompletion, builtin_server, server_with};
    use crate::domains::tools::dispatcher::tests::{EchoTool, dispatcher_with};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header::CONTENT_TYPE};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use tower::ServiceExt;

    fn app(server: GatewayServer) -> Router {
        router(server, &HttpConfig::default())
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn multipart_post(uri: &str, text_field: (&str, &str), file: (&str, &str)) -> Request<Body> {
        let body = format!(
            "--XYZ\r\n\
             Content-Disposition: form-data; name=\"{}\"\r\n\r\n\
             {}\r\n\
             --XYZ\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n\
             {}\r\n\
             --XYZ--\r\n",
            text_field.0, text_field.1, file.0, file.1
        );
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XYZ")
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let server = builtin_server(Arc::new(FakeCompletion::failing()));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(server), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_answer_with_and_without_trailing_slash() {
        for uri in ["/api/", "/api"] {
            let server = builtin_server(Arc::new(FakeCompletion::answering("world")));
            let (status, body) = send(app(server), form_post(uri, "question=hello")).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({ "answer": "world" }));
        }
    }

    #[tokio::test]
    async fn test_answer_with_upload() {
        let completion = Arc::new(FakeCompletion::answering("done"));
        let server = builtin_server(completion.clone());
        let request = multipart_post("/api/", ("question", "what is in it?"), ("notes.txt", "hello file"));

        let (status, body) = send(app(server), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], "done");

        let calls = completion.calls();
        assert_eq!(calls[0].question, "what is in it?");
        assert_eq!(calls[0].attachment.as_deref(), Some(&b"hello file"[..]));
    }

    #[tokio::test]
    async fn test_answer_failure_is_server_error() {
        let server = builtin_server(Arc::new(FakeCompletion::failing()));
        let (status, body) = send(app(server), form_post("/api/", "question=hello")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "upstream unavailable");
        assert_eq!(body["question"], "hello");
        assert_eq!(body["fileProvided"], false);
        assert!(body["traceback"].is_string());
    }

    #[tokio::test]
    async fn test_missing_question_is_unprocessable() {
        let completion = Arc::new(FakeCompletion::answering("unused"));
        let server = builtin_server(completion.clone());
        let (status, body) = send(app(server), form_post("/api/", "")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("question"));
        assert!(completion.calls().is_empty());
    }

    #[tokio::test]
    async fn test_debug_unknown_tool() {
        let server = builtin_server(Arc::new(FakeCompletion::failing()));
        let (status, body) = send(
            app(server),
            form_post("/debug/nonexistent_tool", "params=%7B%7D"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "error": "Function nonexistent_tool not supported for direct testing" })
        );
    }

    #[tokio::test]
    async fn test_debug_tool_with_upload_and_params() {
        let echo = EchoTool::default();
        let calls = echo.calls.clone();
        let server = server_with(
            dispatcher_with(vec![Arc::new(echo)]),
            Arc::new(FakeCompletion::failing()),
            Arc::new(TempFileStager::in_dir(std::env::temp_dir())),
            ErrorDetail::Full,
        );
        let request = multipart_post(
            "/debug/echo",
            ("params", r#"{"count": 4, "file_path": "attacker.txt"}"#),
            ("data.bin", "payload"),
        );

        let (status, body) = send(app(server), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["count"], 4);
        assert_ne!(body["result"]["file_path"], "attacker.txt");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_debug_malformed_params() {
        let server = builtin_server(Arc::new(FakeCompletion::failing()));
        let (status, body) = send(
            app(server),
            form_post("/debug/generate_duckdb_query", "params=not+json"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stage"], "parse");
    }

    #[tokio::test]
    async fn test_fixed_duckdb_route_takes_precedence() {
        let server = builtin_server(Arc::new(FakeCompletion::failing()));
        let (status, body) = send(
            app(server),
            form_post("/debug/duckdb_query", "query_type=top_posts_by_comments&numeric_filter=3"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["result"].as_str().unwrap().ends_with("LIMIT 3;"));
    }

    #[tokio::test]
    async fn test_fixed_transcribe_route_requires_fields() {
        let server = builtin_server(Arc::new(FakeCompletion::failing()));
        let (status, body) = send(
            app(server),
            form_post("/debug/transcribe", "youtube_url=https%3A%2F%2Fyoutu.be%2Fabc"),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("start_time"));
    }

    #[tokio::test]
    async fn test_completion_report_route() {
        let server = builtin_server(Arc::new(FakeCompletion::answering("pong")));
        let (status, body) = send(app(server), form_post("/debug/openai_client", "question=ping")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["question"], "ping");
        assert_eq!(body["openai_response"]["success"], true);
    }

    #[tokio::test]
    async fn test_json_body_is_unsupported() {
        let server = builtin_server(Arc::new(FakeCompletion::failing()));
        let request = Request::builder()
            .method("POST")
            .uri("/api/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"question": "hello"}"#))
            .unwrap();
        let (status, _) = send(app(server), request).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
