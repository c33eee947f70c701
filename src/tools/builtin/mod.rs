//! Built-in tools served by the gateway.

mod file;

pub use file::{CheckFileSafetyTool, ListFilesTool, ReadFileTool};
