//! File tools: read, list, and path safety check.
//!
//! Each tool is a thin adapter from JSON parameters to the
//! [`MediatedExecutor`], which owns canonicalization, policy and audit.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ToolError;
use crate::tools::executor::MediatedExecutor;
use crate::tools::tool::{InvocationContext, Tool, require_str};

/// Tool for reading a text file from an allowed directory.
pub struct ReadFileTool {
    executor: Arc<MediatedExecutor>,
}

impl ReadFileTool {
    pub fn new(executor: Arc<MediatedExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Reads a text file from one of the configured directories and returns its contents. \
         Paths outside those directories are refused."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "filepath": {
                    "type": "string",
                    "description": "Path of the file to read"
                }
            },
            "required": ["filepath"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &InvocationContext,
    ) -> Result<String, ToolError> {
        let filepath = require_str(&params, "filepath")?;
        Ok(self.executor.read_file(filepath, ctx).await)
    }
}

/// Tool for listing the entries of an allowed directory.
pub struct ListFilesTool {
    executor: Arc<MediatedExecutor>,
}

impl ListFilesTool {
    pub fn new(executor: Arc<MediatedExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "Lists the entry names of a directory, one per line, sorted by name. \
         Only the configured directories can be listed."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Directory to list"
                }
            },
            "required": ["directory"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &InvocationContext,
    ) -> Result<String, ToolError> {
        let directory = require_str(&params, "directory")?;
        Ok(self.executor.list_files(directory, ctx).await)
    }
}

/// Tool that classifies a path as safe, dangerous, or out of bounds.
pub struct CheckFileSafetyTool {
    executor: Arc<MediatedExecutor>,
}

impl CheckFileSafetyTool {
    pub fn new(executor: Arc<MediatedExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl Tool for CheckFileSafetyTool {
    fn name(&self) -> &str {
        "check_file_safety"
    }

    fn description(&self) -> &str {
        "Reports whether a path is inside the configured directories and free of \
         sensitive locations. Does not open the file."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "filepath": {
                    "type": "string",
                    "description": "Path to classify"
                }
            },
            "required": ["filepath"]
        })
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        ctx: &InvocationContext,
    ) -> Result<String, ToolError> {
        let filepath = require_str(&params, "filepath")?;
        Ok(self.executor.check_file_safety(filepath, ctx))
    }
}
