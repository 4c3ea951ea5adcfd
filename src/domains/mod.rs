//! Domains module containing business logic organized by bounded contexts.
//!
//! - `tools` - what can be invoked and how arguments are validated
//! - `completion` - the language-model client that selects tools
//! - `gateway` - the request flows behind the HTTP routes

pub mod completion;
pub mod gateway;
pub mod tools;
