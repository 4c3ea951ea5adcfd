//! HTTP transport for the gateway.
//!
//! The transport owns the axum router, request form extraction, and the
//! mapping from gateway replies to HTTP responses. Endpoint semantics live in
//! `domains::gateway`.

mod config;
mod error;
mod form;
pub mod http;

pub use config::HttpConfig;
pub use error::{TransportError, TransportResult};
pub use form::{FormData, FormRejection};
pub use http::HttpTransport;
