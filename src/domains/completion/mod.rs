//! Completion domain module.
//!
//! The completion client turns a question (and an optional staged file) into
//! an answer. It may select and call registered tools along the way; callers
//! see a single opaque operation.

mod client;
mod error;
mod openai;

pub use client::CompletionClient;
pub use error::CompletionError;
pub use openai::OpenAiCompletionClient;
