//! Error types for fsgate.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Audit error: {0}")]
    Audit(#[from] AuditError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Audit sink errors.
///
/// A failed emit fails the tool invocation that produced the record.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Audit log write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Audit record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Audit sink {sink} is poisoned")]
    Poisoned { sink: String },
}

/// Tool dispatch errors, raised before an operation runs.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

/// Why a mediated file operation did not produce a result.
///
/// Mapped once, at the executor boundary, to the `ERROR:` / `WARNING:` string
/// contract the calling agent sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessFault {
    #[error("path is outside the allowed directories")]
    PolicyDenied,

    #[error("not found")]
    NotFound,

    #[error("permission denied")]
    PermissionDenied,

    #[error("{0}")]
    Io(String),

    #[error("path contains dangerous pattern '{0}'")]
    DangerPatternMatched(String),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
