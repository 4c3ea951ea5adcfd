//! Tools domain module.
//!
//! Tools are deterministic named functions that can be invoked either by the
//! completion service (model-selected) or directly through the diagnostic
//! endpoints.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `registry.rs` - Immutable name → handler table
//! - `coercer.rs` - Raw parameters + staged file → validated arguments
//! - `dispatcher.rs` - Resolve, coerce, invoke, normalize the result
//! - `handlers.rs` - Typed `Tool` trait and the object-safe `ToolHandler`
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` with a params struct and a `Tool` impl
//! 2. Export it in `definitions/mod.rs`
//! 3. Add a `ToolId` variant in `registry.rs`

pub mod coercer;
pub mod definitions;
pub mod dispatcher;
mod error;
pub mod handlers;
pub mod registry;

pub use coercer::{RawParameters, ToolArguments, coerce, parse_raw_parameters};
pub use dispatcher::{Dispatcher, FailureKind, InvocationRequest, InvocationResult};
pub use error::{ToolError, ValidationStage};
pub use handlers::{HandlerError, Tool, ToolContext, ToolHandler};
pub use registry::{ToolDescriptor, ToolEntry, ToolId, ToolRegistry};
