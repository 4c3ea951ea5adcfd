//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the gateway,
//! including error handling, configuration, upload staging, diagnostic
//! traces, the shared server state, and the HTTP transport.

pub mod config;
pub mod error;
pub mod server;
pub mod staging;
pub mod trace;
pub mod transport;

pub use config::Config;
pub use error::{Error, Result};
pub use server::GatewayServer;
pub use transport::{HttpConfig, HttpTransport};
