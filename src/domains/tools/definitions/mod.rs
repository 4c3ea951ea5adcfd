//! Tool definitions module.
//!
//! Each tool is defined in its own file: a parameter struct and a [`Tool`]
//! implementation.
//!
//! [`Tool`]: super::handlers::Tool

mod duckdb;
mod hashing;
mod sales;
mod transcribe;

pub use duckdb::{DuckdbQueryParams, DuckdbQueryTool, QueryType};
pub use hashing::{PrettierSha256Params, PrettierSha256Tool};
pub use sales::{PhoneticSalesParams, PhoneticSalesTool, soundex};
pub use transcribe::{TranscribeSegmentParams, TranscribeSegmentTool};
