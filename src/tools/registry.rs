//! Tool registry: listing and dispatch by name.

use std::sync::Arc;

use fsgate_safety::{DescriptionScanResult, DescriptionScanner};
use serde::Serialize;
use serde_json::Value;

use crate::error::ToolError;
use crate::tools::builtin::{CheckFileSafetyTool, ListFilesTool, ReadFileTool};
use crate::tools::executor::MediatedExecutor;
use crate::tools::tool::{InvocationContext, Tool, ToolDescriptor};

/// Scan result for one registered tool's description and schema.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptionReport {
    pub tool: String,
    /// Findings across every scanned field.
    pub result: DescriptionScanResult,
    /// Fields with findings: `description`, or a JSON pointer into
    /// `inputSchema` such as `/inputSchema/properties/filepath/description`.
    pub flagged_fields: Vec<String>,
}

/// Apply `f` to every string-valued `description` key in a JSON schema.
fn visit_schema_descriptions(
    value: &mut Value,
    pointer: &str,
    f: &mut impl FnMut(&str, &mut String),
) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                let child_pointer = format!("{pointer}/{key}");
                match child {
                    Value::String(text) if key == "description" => f(&child_pointer, text),
                    _ => visit_schema_descriptions(child, &child_pointer, f),
                }
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter_mut().enumerate() {
                visit_schema_descriptions(child, &format!("{pointer}/{i}"), f);
            }
        }
        _ => {}
    }
}

/// Registry of available tools.
///
/// Tools are kept in registration order so listings are stable.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    scanner: DescriptionScanner,
    sanitize_descriptions: bool,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new(sanitize_descriptions: bool) -> Self {
        Self {
            tools: Vec::new(),
            scanner: DescriptionScanner::new(),
            sanitize_descriptions,
        }
    }

    /// Registry with the three file tools bound to `executor`.
    pub fn with_builtin(executor: Arc<MediatedExecutor>, sanitize_descriptions: bool) -> Self {
        let mut registry = Self::new(sanitize_descriptions);
        registry.register(Arc::new(ReadFileTool::new(Arc::clone(&executor))));
        registry.register(Arc::new(ListFilesTool::new(Arc::clone(&executor))));
        registry.register(Arc::new(CheckFileSafetyTool::new(executor)));
        registry
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        if let Some(slot) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            tracing::warn!(tool = tool.name(), "replacing already registered tool");
            *slot = tool;
        } else {
            tracing::debug!(tool = tool.name(), "registered tool");
            self.tools.push(tool);
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn count(&self) -> usize {
        self.tools.len()
    }

    pub fn sanitizes_descriptions(&self) -> bool {
        self.sanitize_descriptions
    }

    /// Descriptors as served to the agent.
    ///
    /// When sanitizing, the description and every `description` string
    /// inside the input schema are redacted if they scan dirty.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools
            .iter()
            .map(|tool| {
                let mut descriptor = tool.descriptor();
                if self.sanitize_descriptions {
                    self.sanitize_field(tool.name(), "description", &mut descriptor.description);
                    visit_schema_descriptions(
                        &mut descriptor.input_schema,
                        "/inputSchema",
                        &mut |pointer, text| self.sanitize_field(tool.name(), pointer, text),
                    );
                }
                descriptor
            })
            .collect()
    }

    fn sanitize_field(&self, tool: &str, field: &str, text: &mut String) {
        let scan = self.scanner.scan(text);
        if scan.is_clean() {
            return;
        }
        let redaction = self.scanner.redact(text);
        tracing::warn!(
            tool,
            field,
            findings = %scan.summary(),
            removed = redaction.removed.len(),
            "redacted directive content from tool description"
        );
        *text = redaction.text;
    }

    /// Scan every raw description and schema description, without redaction.
    pub fn audit_descriptions(&self) -> Vec<DescriptionReport> {
        self.tools
            .iter()
            .map(|tool| {
                let mut result = self.scanner.scan(tool.description());
                let mut flagged_fields = Vec::new();
                if !result.is_clean() {
                    flagged_fields.push("description".to_string());
                }

                let mut schema = tool.parameters_schema();
                visit_schema_descriptions(&mut schema, "/inputSchema", &mut |pointer, text| {
                    let field = self.scanner.scan(text);
                    if !field.is_clean() {
                        flagged_fields.push(pointer.to_string());
                        result.merge(field);
                    }
                });

                DescriptionReport {
                    tool: tool.name().to_string(),
                    result,
                    flagged_fields,
                }
            })
            .collect()
    }

    /// Dispatch a call by name.
    pub async fn call(
        &self,
        name: &str,
        params: serde_json::Value,
        ctx: &InvocationContext,
    ) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(params, ctx).await
    }

    /// Dispatch a call by name, folding rejections into the result string.
    ///
    /// Rejected calls never reach the executor and so leave no audit record.
    pub async fn invoke(
        &self,
        name: &str,
        params: serde_json::Value,
        ctx: &InvocationContext,
    ) -> String {
        match self.call(name, params, ctx).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(tool = name, caller = %ctx.caller, error = %e, "tool call rejected");
                format!("ERROR: {e}")
            }
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
        f.debug_struct("ToolRegistry")
            .field("tools", &names)
            .field("sanitize_descriptions", &self.sanitize_descriptions)
            .finish()
    }
}
