//! Gateway domain module.
//!
//! Request-level flows behind the HTTP routes. Each flow takes the shared
//! [`GatewayServer`](crate::core::GatewayServer) plus already-extracted
//! request data and produces a response envelope.
//!
//! - `answer.rs` - Question (+ optional file) → completion client
//! - `diagnostic.rs` - Direct tool invocation, bypassing the completion client
//! - `introspect.rs` - Completion client readiness report
//! - `envelope.rs` - Response shapes

pub mod answer;
pub mod diagnostic;
mod envelope;
pub mod introspect;

pub use answer::answer;
pub use diagnostic::{
    DUCKDB_FIELDS, FieldKind, FormField, TRANSCRIBE_FIELDS, first_missing, invoke_tool,
    invoke_with_fields,
};
pub use envelope::{AnswerReply, DebugReply};
pub use introspect::completion_report;

#[cfg(test)]
pub(crate) mod tests {
    //! Fakes shared by the gateway and transport tests.

    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::core::config::{Config, ErrorDetail};
    use crate::core::staging::{FileStager, StagedFile, StagingError, TempFileStager, Upload};
    use crate::core::GatewayServer;
    use crate::domains::completion::CompletionClient;
    use crate::domains::tools::{Dispatcher, ToolContext, ToolRegistry};

    /// What the fake completion client saw on one call.
    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct SeenCall {
        pub question: String,
        /// Contents of the attachment, read while the call was in progress.
        pub attachment: Option<Vec<u8>>,
        pub attachment_path: Option<String>,
    }

    /// Completion client returning a canned outcome.
    #[derive(Default)]
    pub(crate) struct FakeCompletion {
        pub answer: Option<String>,
        pub seen: Mutex<Vec<SeenCall>>,
    }

    impl FakeCompletion {
        pub fn answering(answer: &str) -> Self {
            Self {
                answer: Some(answer.to_string()),
                ..Default::default()
            }
        }

        pub fn failing() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<SeenCall> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for FakeCompletion {
        async fn complete(&self, question: &str, attachment: Option<&Path>) -> anyhow::Result<String> {
            let contents = match attachment {
                Some(path) => Some(tokio::fs::read(path).await?),
                None => None,
            };
            self.seen.lock().unwrap().push(SeenCall {
                question: question.to_string(),
                attachment: contents,
                attachment_path: attachment.map(|p| p.to_string_lossy().into_owned()),
            });
            match &self.answer {
                Some(answer) => Ok(answer.clone()),
                None => Err(anyhow::anyhow!("upstream unavailable")),
            }
        }
    }

    /// Stager that always fails.
    pub(crate) struct BrokenStager;

    #[async_trait]
    impl FileStager for BrokenStager {
        async fn stage(&self, _upload: Upload) -> Result<StagedFile, StagingError> {
            Err(StagingError::Create {
                dir: "/nonexistent".into(),
                source: std::io::Error::new(std::io::ErrorKind::StorageFull, "no space left"),
            })
        }
    }

    pub(crate) fn config_with(detail: ErrorDetail) -> Arc<Config> {
        let mut config = Config::default();
        config.errors.detail = detail;
        Arc::new(config)
    }

    /// Server over the built-in tools.
    pub(crate) fn builtin_server(completion: Arc<FakeCompletion>) -> GatewayServer {
        builtin_server_with(config_with(ErrorDetail::Full), completion)
    }

    /// Server over the built-in tools with an explicit configuration.
    pub(crate) fn builtin_server_with(
        config: Arc<Config>,
        completion: Arc<FakeCompletion>,
    ) -> GatewayServer {
        let dispatcher = Dispatcher::new(
            Arc::new(ToolRegistry::builtin().unwrap()),
            ToolContext::new(config.clone()),
        );
        GatewayServer::from_parts(
            config,
            dispatcher,
            completion,
            Arc::new(TempFileStager::in_dir(std::env::temp_dir())),
        )
    }

    /// Server over an explicit dispatcher.
    pub(crate) fn server_with(
        dispatcher: Dispatcher,
        completion: Arc<FakeCompletion>,
        stager: Arc<dyn FileStager>,
        detail: ErrorDetail,
    ) -> GatewayServer {
        GatewayServer::from_parts(config_with(detail), dispatcher, completion, stager)
    }
}
