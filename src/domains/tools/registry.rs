//! Tool Registry - the immutable table of callable tools.
//!
//! The set of built-in tools is closed ([`ToolId`]); the table is built once at
//! startup and shared read-only across requests.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};

use super::definitions::{
    DuckdbQueryTool, PhoneticSalesTool, PrettierSha256Tool, TranscribeSegmentTool,
};
use super::error::ToolError;
use super::handlers::ToolHandler;
use crate::core::{Error, Result};

/// Metadata for one registered tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub parameter_names: &'static [&'static str],
    pub file_parameter: Option<&'static str>,
    pub schema: Value,
}

impl ToolDescriptor {
    pub fn accepts_file(&self) -> bool {
        self.file_parameter.is_some()
    }

    pub fn declares(&self, name: &str) -> bool {
        self.parameter_names.contains(&name)
    }

    /// Signature rendered as `(a, b, c)`, for introspection output.
    pub fn signature(&self) -> String {
        format!("({})", self.parameter_names.join(", "))
    }

    /// OpenAI `tools` entry for this tool.
    pub fn function_definition(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.schema,
            }
        })
    }
}

/// The closed set of built-in tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    AnalyzeSalesWithPhoneticClustering,
    CalculatePrettierSha256,
    TranscribeYoutubeSegment,
    GenerateDuckdbQuery,
}

impl ToolId {
    pub const ALL: [ToolId; 4] = [
        Self::AnalyzeSalesWithPhoneticClustering,
        Self::CalculatePrettierSha256,
        Self::TranscribeYoutubeSegment,
        Self::GenerateDuckdbQuery,
    ];

    pub fn name(self) -> &'static str {
        use super::handlers::Tool;
        match self {
            Self::AnalyzeSalesWithPhoneticClustering => PhoneticSalesTool::NAME,
            Self::CalculatePrettierSha256 => PrettierSha256Tool::NAME,
            Self::TranscribeYoutubeSegment => TranscribeSegmentTool::NAME,
            Self::GenerateDuckdbQuery => DuckdbQueryTool::NAME,
        }
    }

    fn handler(self) -> Arc<dyn ToolHandler> {
        match self {
            Self::AnalyzeSalesWithPhoneticClustering => Arc::new(PhoneticSalesTool),
            Self::CalculatePrettierSha256 => Arc::new(PrettierSha256Tool),
            Self::TranscribeYoutubeSegment => Arc::new(TranscribeSegmentTool),
            Self::GenerateDuckdbQuery => Arc::new(DuckdbQueryTool),
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolId {
    type Err = ToolError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| ToolError::not_found(s))
    }
}

/// A registered tool: its descriptor and handler.
#[derive(Clone)]
pub struct ToolEntry {
    pub descriptor: ToolDescriptor,
    pub handler: Arc<dyn ToolHandler>,
}

/// Tool registry - maps tool names to handlers.
pub struct ToolRegistry {
    entries: Vec<ToolEntry>,
    index: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    /// Registry of the built-in tools.
    pub fn builtin() -> Result<Self> {
        Self::from_handlers(ToolId::ALL.into_iter().map(ToolId::handler).collect())
    }

    /// Build a registry from handlers, in order. Names and parameter names must be unique.
    pub fn from_handlers(handlers: Vec<Arc<dyn ToolHandler>>) -> Result<Self> {
        let mut entries = Vec::with_capacity(handlers.len());
        let mut index = HashMap::with_capacity(handlers.len());

        for handler in handlers {
            let descriptor = handler.descriptor();
            for (i, param) in descriptor.parameter_names.iter().enumerate() {
                if descriptor.parameter_names[..i].contains(param) {
                    return Err(Error::config(format!(
                        "tool {} declares parameter {} twice",
                        descriptor.name, param
                    )));
                }
            }
            if index.insert(descriptor.name, entries.len()).is_some() {
                return Err(Error::config(format!(
                    "tool {} registered twice",
                    descriptor.name
                )));
            }
            entries.push(ToolEntry {
                descriptor,
                handler,
            });
        }

        Ok(Self { entries, index })
    }

    /// Resolve a tool by exact, case-sensitive name.
    pub fn lookup(&self, name: &str) -> std::result::Result<&ToolEntry, ToolError> {
        self.index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| ToolError::not_found(name))
    }

    /// All tool names, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.descriptor.name).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// OpenAI `tools` array for every registered tool.
    pub fn function_definitions(&self) -> Vec<Value> {
        self.entries
            .iter()
            .map(|e| e.descriptor.function_definition())
            .collect()
    }
}
