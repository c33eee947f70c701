//! Audit trail for mediated file operations.
//!
//! Every tool invocation produces exactly one [`AuditRecord`], handed to an
//! [`AuditSink`] before the invocation returns. Sinks are append-only:
//!
//! | Sink | Description |
//! |------|-------------|
//! | [`TracingAuditSink`] | One structured `tracing` event per record |
//! | [`JsonlAuditSink`] | One JSON line per record, appended to a file |
//! | [`MemoryAuditSink`] | Keeps records in memory for inspection |
//! | [`MultiAuditSink`] | Fan-out to several sinks |

mod jsonl;
mod log;
mod memory;
mod multi;

pub use self::jsonl::JsonlAuditSink;
pub use self::log::TracingAuditSink;
pub use self::memory::MemoryAuditSink;
pub use self::multi::MultiAuditSink;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuditConfig;
use crate::error::AuditError;

/// Destination for audit records.
///
/// `emit` must append the whole record as one unit: concurrent callers never
/// observe interleaved partial records.
pub trait AuditSink: Send + Sync {
    /// Append one record.
    fn emit(&self, record: &AuditRecord) -> Result<(), AuditError>;

    /// Human-readable backend name (e.g. "tracing", "jsonl").
    fn name(&self) -> &str;
}

/// Create the audit sink from configuration.
///
/// Records always go to the tracing sink; a configured `log_path` adds a
/// JSONL file behind a [`MultiAuditSink`].
pub fn create_sink(config: &AuditConfig) -> Result<Box<dyn AuditSink>, AuditError> {
    match &config.log_path {
        Some(path) => {
            let jsonl = JsonlAuditSink::open(path)?;
            tracing::info!(path = %path.display(), "audit records appended to file");
            Ok(Box::new(MultiAuditSink::new(vec![
                Box::new(TracingAuditSink),
                Box::new(jsonl),
            ])))
        }
        None => Ok(Box::new(TracingAuditSink)),
    }
}

/// Which operation was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Read,
    List,
    CheckSafety,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::List => "LIST",
            Self::CheckSafety => "CHECK_SAFETY",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOutcome {
    Success,
    /// Outside the allowlist.
    Blocked,
    NotFound,
    PermissionDenied,
    Error(String),
    /// Safety check hit a danger pattern.
    Dangerous(String),
    /// Safety check passed.
    Safe,
    /// Safety check found the path outside the allowlist.
    OutsideAllowed,
}

impl std::fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Blocked => write!(f, "BLOCKED"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::PermissionDenied => write!(f, "PERMISSION_DENIED"),
            Self::Error(detail) => write!(f, "ERROR:{detail}"),
            Self::Dangerous(pattern) => write!(f, "DANGEROUS:{pattern}"),
            Self::Safe => write!(f, "SAFE"),
            Self::OutsideAllowed => write!(f, "OUTSIDE_ALLOWED"),
        }
    }
}

/// One access decision and its outcome.
///
/// Both the caller-supplied and the canonical path are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub raw_path: String,
    pub canonical_path: String,
    pub outcome: AuditOutcome,
    pub caller: String,
    /// Number of entries returned by a successful listing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<usize>,
}

impl AuditRecord {
    pub fn new(
        action: AuditAction,
        raw_path: impl Into<String>,
        canonical_path: impl Into<String>,
        outcome: AuditOutcome,
        caller: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            action,
            raw_path: raw_path.into(),
            canonical_path: canonical_path.into(),
            outcome,
            caller: caller.into(),
            entry_count: None,
        }
    }

    pub fn with_entry_count(mut self, count: usize) -> Self {
        self.entry_count = Some(count);
        self
    }
}
