//! Completion client trait.

use std::path::Path;

use async_trait::async_trait;

/// Answers a question, optionally about an attached file.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Produce an answer. Any tool calls happen inside this call.
    async fn complete(&self, question: &str, attachment: Option<&Path>) -> anyhow::Result<String>;

    /// Human-readable call signature, reported by introspection.
    fn signature(&self) -> &'static str {
        "(question, attachment=None)"
    }
}
