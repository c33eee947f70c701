//! Tool trait and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

/// Caller identity recorded when none is supplied.
pub const DEFAULT_CALLER: &str = "local";

/// Per-invocation context supplied by the hosting transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    /// Best-effort caller identity (client address, session id, ...).
    pub caller: String,
}

impl InvocationContext {
    pub fn new(caller: impl Into<String>) -> Self {
        Self {
            caller: caller.into(),
        }
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::new(DEFAULT_CALLER)
    }
}

/// Static description of a tool, as shown to the calling agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Trait for tools the agent can call.
///
/// `execute` returns the agent-facing result string. Operational failures
/// (denials, missing files, I/O faults) are part of that string; only
/// malformed parameters are reported as [`ToolError`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name.
    fn name(&self) -> &str;

    /// Plain documentation of what the tool does.
    fn description(&self) -> &str;

    /// Get the JSON Schema for the tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given parameters.
    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &InvocationContext,
    ) -> Result<String, ToolError>;

    /// Descriptor for tool listing.
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
        }
    }
}

/// Extract a required string parameter from a JSON object.
///
/// Returns `ToolError::InvalidParameters` if the key is missing or not a string.
pub fn require_str<'a>(params: &'a serde_json::Value, name: &str) -> Result<&'a str, ToolError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidParameters(format!("missing '{}' parameter", name)))
}
