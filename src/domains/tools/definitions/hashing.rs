//! Prettier SHA-256 tool.
//!
//! Formats an uploaded file and returns the SHA-256 of the formatted output,
//! the same digest as `npx -y prettier@3.4.2 FILE | sha256sum`.

use std::path::Path;

use anyhow::{Context, bail};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tokio::process::Command;
use tracing::{debug, info, instrument};

use crate::domains::tools::handlers::{Tool, ToolContext};

/// Parameters for the prettier hash tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PrettierSha256Params {
    /// Path of the file to format. Filled in from the uploaded file.
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Hashes a file after formatting it with prettier.
pub struct PrettierSha256Tool;

#[async_trait]
impl Tool for PrettierSha256Tool {
    const NAME: &'static str = "calculate_prettier_sha256";

    const DESCRIPTION: &'static str = "Format the uploaded file with prettier and return the SHA-256 hex digest of the formatted output.";

    const PARAMETERS: &'static [&'static str] = &["file_path"];

    const FILE_PARAMETER: Option<&'static str> = Some("file_path");

    type Params = PrettierSha256Params;

    #[instrument(skip_all)]
    async fn run(
        &self,
        params: PrettierSha256Params,
        _extras: Map<String, Value>,
        ctx: &ToolContext,
    ) -> anyhow::Result<Value> {
        let path = params.file_path.as_deref().context("No file path provided")?;

        let formatted = match ctx.config.tools.prettier_command.as_deref() {
            Some(command) => run_formatter(command, Path::new(path)).await?,
            None => {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read {path}"))?;
                normalize_whitespace(&content)
            }
        };

        let digest = sha256_hex(formatted.as_bytes());
        info!("Hashed formatted {} ({} bytes)", path, formatted.len());
        Ok(Value::String(digest))
    }
}

/// Run `command FILE` and capture the formatted text from stdout.
async fn run_formatter(command: &str, path: &Path) -> anyhow::Result<String> {
    let mut parts = command.split_whitespace();
    let program = parts.next().context("Formatter command is empty")?;

    debug!("Running formatter: {} {}", command, path.display());
    let output = Command::new(program)
        .args(parts)
        .arg(path)
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("Failed to run formatter `{command}`"))?;

    if !output.status.success() {
        bail!(
            "Formatter `{}` exited with {}: {}",
            command,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    String::from_utf8(output.stdout).context("Formatter output is not UTF-8")
}

/// Built-in fallback formatter: LF line endings, no trailing whitespace,
/// at most one blank line in a row, exactly one final newline.
pub(crate) fn normalize_whitespace(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 1);
    let mut blank_run = 0;

    for line in content.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn ctx_without_prettier() -> ToolContext {
        let mut config = Config::default();
        config.tools.prettier_command = None;
        ToolContext::new(Arc::new(config))
    }

    fn write_temp(content: &str) -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), content).unwrap();
        file
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("a  \r\nb\n\n\n\nc"), "a\nb\n\nc\n");
        assert_eq!(normalize_whitespace("\n\n# T\n\n"), "# T\n");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[tokio::test]
    async fn test_hash_with_builtin_normalizer() {
        let file = write_temp("abc  \r\n\r\n\r\n");
        let value = PrettierSha256Tool
            .run(
                PrettierSha256Params {
                    file_path: Some(file.path().to_string_lossy().to_string()),
                },
                Map::new(),
                &ctx_without_prettier(),
            )
            .await
            .unwrap();
        assert_eq!(value, Value::String(sha256_hex(b"abc\n")));
    }

    #[tokio::test]
    async fn test_missing_file_path() {
        let err = PrettierSha256Tool
            .run(
                PrettierSha256Params { file_path: None },
                Map::new(),
                &ctx_without_prettier(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No file path provided");
    }

    #[tokio::test]
    async fn test_formatter_command_output_is_hashed() {
        let file = write_temp("hello\n");
        let formatted = run_formatter("cat", file.path()).await.unwrap();
        assert_eq!(formatted, "hello\n");
    }

    #[tokio::test]
    async fn test_missing_formatter_binary() {
        let file = write_temp("hello\n");
        let err = run_formatter("definitely-not-a-formatter-binary", file.path())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to run formatter"));
    }
}
