//! Transport configuration types.

use serde::{Deserialize, Serialize};

use crate::core::config::parse_env;

/// HTTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Allow every origin, method, and header.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,

    /// Largest accepted request body, uploads included.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_cors() -> bool {
    true
}

fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            host: default_host(),
            enable_cors: default_cors(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl HttpConfig {
    /// Load HTTP config from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(port) = parse_env("GATEWAY_HTTP_PORT") {
            config.port = port;
        }
        if let Ok(host) = std::env::var("GATEWAY_HTTP_HOST") {
            config.host = host;
        }
        if let Ok(cors) = std::env::var("GATEWAY_HTTP_CORS") {
            config.enable_cors = cors.to_lowercase() != "false" && cors != "0";
        }
        if let Some(limit) = parse_env("GATEWAY_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = limit;
        }

        config
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
