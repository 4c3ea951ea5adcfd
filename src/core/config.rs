//! Configuration management for the gateway.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables (and a `.env` file) or defaults.

use super::transport::HttpConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Main configuration structure for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// HTTP transport configuration.
    pub http: HttpConfig,

    /// Completion service configuration.
    pub completion: CompletionConfig,

    /// Tool runtime configuration.
    pub tools: ToolsConfig,

    /// Upload staging configuration.
    pub staging: StagingConfig,

    /// Error reporting policy.
    pub errors: ErrorsConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Configuration for the OpenAI-compatible completion service.
#[derive(Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Base URL of the API, without a trailing slash.
    pub api_base: String,

    /// Bearer token for the API.
    pub api_key: Option<String>,

    /// Chat model used to answer questions.
    pub model: String,

    /// Model used by the transcription tool.
    pub transcription_model: String,

    /// Upper bound on model/tool round trips for one question.
    pub max_tool_rounds: usize,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("transcription_model", &self.transcription_model)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .finish()
    }
}

/// Configuration for the built-in tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Command used to format files before hashing.
    /// When None, a built-in whitespace normalizer is used instead.
    pub prettier_command: Option<String>,

    /// Command used to download YouTube audio segments.
    pub yt_dlp_command: String,

    /// Optional deadline for a single tool invocation, in seconds.
    /// No deadline is enforced when None.
    pub timeout_secs: Option<u64>,
}

/// Configuration for upload staging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Directory where uploads are written. Defaults to the system temp dir.
    pub dir: Option<PathBuf>,
}

/// How much internal detail failure responses carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorDetail {
    /// Messages and diagnostic traces.
    #[default]
    Full,
    /// Messages only.
    Minimal,
}

impl ErrorDetail {
    /// Apply the policy to a diagnostic trace.
    pub fn trace(self, trace: Option<String>) -> Option<String> {
        match self {
            Self::Full => trace,
            Self::Minimal => None,
        }
    }
}

impl FromStr for ErrorDetail {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "minimal" => Ok(Self::Minimal),
            other => Err(format!("unknown error detail level: {other}")),
        }
    }
}

/// Error reporting configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorsConfig {
    pub detail: ErrorDetail,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            transcription_model: "whisper-1".to_string(),
            max_tool_rounds: 5,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            prettier_command: Some("npx -y prettier@3.4.2".to_string()),
            yt_dlp_command: "yt-dlp".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "tool-gateway".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            http: HttpConfig::default(),
            completion: CompletionConfig::default(),
            tools: ToolsConfig::default(),
            staging: StagingConfig::default(),
            errors: ErrorsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `GATEWAY_`.
    /// For example: `GATEWAY_SERVER_NAME`, `GATEWAY_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("GATEWAY_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("GATEWAY_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.http = HttpConfig::from_env();

        // Completion service
        match std::env::var("GATEWAY_OPENAI_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY")) {
            Ok(key) if !key.is_empty() => {
                config.completion.api_key = Some(key);
                info!("Completion API key loaded from environment");
            }
            _ => warn!(
                "No completion API key set (GATEWAY_OPENAI_API_KEY or OPENAI_API_KEY). \
                 Questions on /api/ will fail until one is configured."
            ),
        }

        if let Ok(base) = std::env::var("GATEWAY_OPENAI_API_BASE") {
            config.completion.api_base = base.trim_end_matches('/').to_string();
        }

        if let Ok(model) = std::env::var("GATEWAY_OPENAI_MODEL") {
            config.completion.model = model;
        }

        if let Ok(model) = std::env::var("GATEWAY_TRANSCRIPTION_MODEL") {
            config.completion.transcription_model = model;
        }

        if let Some(rounds) = parse_env("GATEWAY_MAX_TOOL_ROUNDS") {
            config.completion.max_tool_rounds = rounds;
        }

        // Tools
        if let Ok(command) = std::env::var("GATEWAY_PRETTIER_COMMAND") {
            config.tools.prettier_command = if command.trim().is_empty() {
                info!("Prettier disabled, using built-in normalizer for hashing");
                None
            } else {
                Some(command)
            };
        }

        if let Ok(command) = std::env::var("GATEWAY_YT_DLP_COMMAND") {
            config.tools.yt_dlp_command = command;
        }

        if let Some(secs) = parse_env("GATEWAY_TOOL_TIMEOUT_SECS") {
            config.tools.timeout_secs = Some(secs);
            info!("Tool invocations limited to {}s", secs);
        }

        if let Ok(dir) = std::env::var("GATEWAY_STAGING_DIR") {
            config.staging.dir = Some(PathBuf::from(dir));
        }

        if let Some(detail) = parse_env::<ErrorDetail>("GATEWAY_ERROR_DETAIL") {
            config.errors.detail = detail;
        }
        if config.errors.detail == ErrorDetail::Full {
            warn!("Failure responses include diagnostic traces (GATEWAY_ERROR_DETAIL=full)");
        }

        config
    }
}

/// Read and parse an environment variable, warning and ignoring it when invalid.
pub(crate) fn parse_env<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring invalid {}={:?}: {}", key, raw, e);
            None
        }
    }
}
