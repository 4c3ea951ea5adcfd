//! YouTube segment transcription tool.
//!
//! Downloads the audio of one segment with yt-dlp and sends it to the
//! OpenAI-compatible transcription endpoint.

use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::Url;
use reqwest::multipart::{Form, Part};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::process::Command;
use tracing::{info, instrument};

use crate::domains::tools::handlers::{Tool, ToolContext};

/// Parameters for the transcription tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TranscribeSegmentParams {
    /// URL of the YouTube video.
    pub youtube_url: String,

    /// Segment start, in seconds.
    pub start_time: f64,

    /// Segment end, in seconds.
    pub end_time: f64,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Transcribes a time range of a YouTube video.
pub struct TranscribeSegmentTool;

#[async_trait]
impl Tool for TranscribeSegmentTool {
    const NAME: &'static str = "transcribe_youtube_segment";

    const DESCRIPTION: &'static str = "Transcribe the audio of a YouTube video between start_time and end_time (seconds).";

    const PARAMETERS: &'static [&'static str] = &["youtube_url", "start_time", "end_time"];

    type Params = TranscribeSegmentParams;

    #[instrument(skip_all, fields(url = %params.youtube_url, start = params.start_time, end = params.end_time))]
    async fn run(
        &self,
        params: TranscribeSegmentParams,
        _extras: Map<String, Value>,
        ctx: &ToolContext,
    ) -> anyhow::Result<Value> {
        validate_segment(params.start_time, params.end_time)?;
        let url = validate_youtube_url(&params.youtube_url)?;

        let completion = &ctx.config.completion;
        let api_key = completion
            .api_key
            .as_deref()
            .context("Transcription requires a completion API key")?;

        let dir = tempfile::tempdir().context("Failed to create download directory")?;
        let template = dir.path().join("segment.%(ext)s");
        let section = format!("*{}-{}", params.start_time, params.end_time);
        let yt_dlp = &ctx.config.tools.yt_dlp_command;

        let output = Command::new(yt_dlp)
            .args(["--quiet", "--no-playlist", "-x", "--audio-format", "mp3"])
            .args(["--download-sections", section.as_str(), "-o"])
            .arg(&template)
            .arg(url.as_str())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {yt_dlp}"))?;
        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                yt_dlp,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let audio = tokio::fs::read(dir.path().join("segment.mp3"))
            .await
            .context("Downloaded segment has no mp3 audio")?;
        info!("Downloaded {} bytes of audio", audio.len());

        let form = Form::new()
            .text("model", completion.transcription_model.clone())
            .text("response_format", "json")
            .part(
                "file",
                Part::bytes(audio)
                    .file_name("segment.mp3")
                    .mime_str("audio/mpeg")?,
            );

        let response = ctx
            .http
            .post(format!("{}/audio/transcriptions", completion.api_base))
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await
            .context("Transcription request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Transcription API returned {}: {}", status, body);
        }

        let transcript: TranscriptionResponse = response
            .json()
            .await
            .context("Unexpected transcription response")?;
        Ok(Value::String(transcript.text.trim().to_string()))
    }
}

fn validate_segment(start: f64, end: f64) -> anyhow::Result<()> {
    if !start.is_finite() || !end.is_finite() {
        bail!("start_time and end_time must be finite numbers");
    }
    if start < 0.0 {
        bail!("start_time must not be negative, got {start}");
    }
    if end <= start {
        bail!("end_time ({end}) must be after start_time ({start})");
    }
    Ok(())
}

fn validate_youtube_url(raw: &str) -> anyhow::Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("Invalid URL: {raw}"))?;
    let host = url.host_str().unwrap_or_default();
    let is_youtube = host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com");
    if !matches!(url.scheme(), "http" | "https") || !is_youtube {
        bail!("Not a YouTube URL: {raw}");
    }
    Ok(url)
}
