//! Tool Gateway Library
//!
//! This crate provides an HTTP gateway that answers natural-language questions
//! through a language-model completion service configured with callable tools,
//! and a diagnostic surface that invokes those tools directly by name.
//!
//! # Architecture
//!
//! The gateway is organized into the following modules:
//!
//! - **core**: Infrastructure including configuration, error handling, file staging,
//!   diagnostic traces, the shared server state, and the HTTP transport
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: Tool registry, parameter coercion, and dispatch
//!   - **completion**: The language-model completion client
//!   - **gateway**: The answer and diagnostic endpoints' contracts
//!
//! # Example
//!
//! ```rust,no_run
//! use tool_gateway::core::{Config, GatewayServer, HttpTransport};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = GatewayServer::new(config.clone())?;
//!     HttpTransport::new(config.http).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, GatewayServer, Result};
