//! OpenAI-compatible completion client.
//!
//! Sends the question with every registered tool's function definition to
//! `{api_base}/chat/completions`. Tool calls requested by the model are run
//! through the [`Dispatcher`] (with the attachment as the staged file) and
//! their results fed back until the model answers in plain text.

use std::path::Path;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::client::CompletionClient;
use super::error::CompletionError;
use crate::core::config::CompletionConfig;
use crate::domains::tools::{Dispatcher, InvocationRequest, RawParameters};

const SYSTEM_PROMPT: &str = "You answer graded assignment questions. \
    When a tool can compute the answer, call it instead of estimating. \
    Reply with only the final answer, without explanation.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Value]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn tool_result(call_id: String, content: String) -> Self {
        Self {
            tool_call_id: Some(call_id),
            ..Self::text("tool", content)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Completion client for OpenAI-compatible chat APIs.
pub struct OpenAiCompletionClient {
    http: Client,
    config: CompletionConfig,
    dispatcher: Dispatcher,
}

impl OpenAiCompletionClient {
    pub fn new(config: CompletionConfig, dispatcher: Dispatcher) -> Self {
        Self {
            http: Client::new(),
            config,
            dispatcher,
        }
    }

    async fn chat(
        &self,
        api_key: &str,
        messages: &[ChatMessage],
        tools: &[Value],
    ) -> Result<ChatMessage, CompletionError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            tools: (!tools.is_empty()).then_some(tools),
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.api_base))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response: ChatResponse = response.json().await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(CompletionError::EmptyResponse)
    }

    /// Run the requested tool calls, returning `tool` messages in call order.
    async fn run_tool_calls(&self, calls: &[ToolCall], attachment: Option<&Path>) -> Vec<ChatMessage> {
        let file_path = attachment.map(|p| p.to_string_lossy().into_owned());
        let invocations = calls.iter().map(|call| {
            info!("Model requested tool {}", call.function.name);
            let request = InvocationRequest::new(
                call.function.name.clone(),
                RawParameters::Text(call.function.arguments.clone()),
            )
            .with_file(file_path.clone());
            self.dispatcher.dispatch(request)
        });

        join_all(invocations)
            .await
            .into_iter()
            .zip(calls)
            .map(|(result, call)| {
                let content = serde_json::to_string(&result)
                    .unwrap_or_else(|e| format!("{{\"status\":\"failure\",\"message\":\"{e}\"}}"));
                ChatMessage::tool_result(call.id.clone(), content)
            })
            .collect()
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompletionClient {
    #[instrument(skip_all, fields(model = %self.config.model, attachment = attachment.is_some()))]
    async fn complete(&self, question: &str, attachment: Option<&Path>) -> anyhow::Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(CompletionError::MissingApiKey)?;

        let mut user_message = question.to_string();
        if attachment.is_some() {
            user_message.push_str(
                "\n\nA file is attached to this question. Tools that take a file_path \
                 receive it automatically.",
            );
        }

        let tools = self.dispatcher.registry().function_definitions();
        let mut messages = vec![
            ChatMessage::text("system", SYSTEM_PROMPT),
            ChatMessage::text("user", user_message),
        ];

        for round in 0..=self.config.max_tool_rounds {
            let reply = self.chat(api_key, &messages, &tools).await?;

            let calls = match reply.tool_calls.as_deref() {
                Some(calls) if !calls.is_empty() => calls.to_vec(),
                _ => {
                    debug!(round, "Model answered");
                    return Ok(reply.content.unwrap_or_default().trim().to_string());
                }
            };

            if round == self.config.max_tool_rounds {
                break;
            }

            messages.push(reply);
            let results = self.run_tool_calls(&calls, attachment).await;
            messages.extend(results);
        }

        Err(CompletionError::ToolRoundsExhausted(self.config.max_tool_rounds).into())
    }

    fn signature(&self) -> &'static str {
        "(question, attachment=None) -> answer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::domains::tools::{ToolContext, ToolRegistry};
    use axum::{Json, Router, extract::State, routing::post};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<Value>>>;

    /// Stub chat API: asks for one tool call, then answers.
    async fn stub_chat(State(captured): State<Captured>, Json(body): Json<Value>) -> Json<Value> {
        let round = {
            let mut requests = captured.lock().unwrap();
            requests.push(body);
            requests.len()
        };
        if round == 1 {
            Json(json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {
                                "name": "generate_duckdb_query",
                                "arguments": "{\"query_type\": \"recent_posts\", \"numeric_filter\": 3}"
                            }
                        }]
                    }
                }]
            }))
        } else {
            Json(json!({
                "choices": [{ "message": { "role": "assistant", "content": " final answer \n" } }]
            }))
        }
    }

    async fn spawn_stub() -> (String, Captured) {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route("/chat/completions", post(stub_chat))
            .with_state(captured.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), captured)
    }

    fn client(api_base: String, api_key: Option<&str>) -> OpenAiCompletionClient {
        let config = Arc::new(Config::default());
        let dispatcher = Dispatcher::new(
            Arc::new(ToolRegistry::builtin().unwrap()),
            ToolContext::new(config.clone()),
        );
        let completion = CompletionConfig {
            api_base,
            api_key: api_key.map(str::to_string),
            ..config.completion.clone()
        };
        OpenAiCompletionClient::new(completion, dispatcher)
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let (base, captured) = spawn_stub().await;
        let answer = client(base, Some("test-key"))
            .complete("Which posts are newest?", None)
            .await
            .unwrap();
        assert_eq!(answer, "final answer");

        let requests = captured.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["tools"].as_array().unwrap().len(), 4);

        let messages = requests[1]["messages"].as_array().unwrap();
        let tool_message = messages.last().unwrap();
        assert_eq!(tool_message["role"], "tool");
        assert_eq!(tool_message["tool_call_id"], "call_1");
        let result: Value =
            serde_json::from_str(tool_message["content"].as_str().unwrap()).unwrap();
        assert_eq!(result["status"], "success");
        assert!(result["value"].as_str().unwrap().contains("LIMIT 3"));
    }

    #[tokio::test]
    async fn test_rounds_exhausted() {
        let (base, _) = spawn_stub().await;
        let mut client = client(base, Some("test-key"));
        client.config.max_tool_rounds = 0;
        let err = client.complete("q", None).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CompletionError>(),
            Some(CompletionError::ToolRoundsExhausted(0))
        ));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let err = client("http://127.0.0.1:9".into(), None)
            .complete("q", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CompletionError>(),
            Some(CompletionError::MissingApiKey)
        ));
    }
}
