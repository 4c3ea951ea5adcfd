//! Error types and handling for the gateway.
//!
//! Startup fails with this crate-level [`Error`]. Request-time failures never
//! surface as errors: they are reported through the response envelopes.

use thiserror::Error;

/// A specialized Result type for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while assembling the gateway.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
