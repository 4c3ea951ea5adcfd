//! Answer flow: question plus optional file, answered by the completion client.

use tracing::{info, instrument, warn};

use super::envelope::AnswerReply;
use crate::core::GatewayServer;
use crate::core::staging::{StagedFile, Upload};
use crate::core::trace;

/// Answer `question`, staging `upload` for the duration of the call.
///
/// The staged file is removed when this function returns, whatever the outcome.
#[instrument(skip_all, fields(file_provided = upload.is_some()))]
pub async fn answer(server: &GatewayServer, question: &str, upload: Option<Upload>) -> AnswerReply {
    let detail = server.error_detail();
    let file_provided = upload.is_some();

    let staged = match upload {
        Some(upload) => match server.stager().stage(upload).await {
            Ok(staged) => Some(staged),
            Err(e) => {
                warn!("Failed to stage upload: {e}");
                return AnswerReply::StagingFailed {
                    error: e.to_string(),
                    traceback: detail.trace(Some(trace::capture_std(e))),
                };
            }
        },
        None => None,
    };

    let outcome = server
        .completion()
        .complete(question, staged.as_ref().map(StagedFile::path))
        .await;

    match outcome {
        Ok(answer) => {
            info!("Answered question");
            AnswerReply::Answer { answer }
        }
        Err(e) => {
            warn!("Completion failed: {e:#}");
            AnswerReply::CompletionFailed {
                error: e.to_string(),
                traceback: detail.trace(Some(trace::capture(&e))),
                question: question.to_string(),
                file_provided,
            }
        }
    }
}
