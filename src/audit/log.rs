//! Tracing-based audit sink.
//!
//! Records appear alongside normal application logs as structured `info`
//! events, so any subscriber (pretty, JSON, file appender) becomes the audit
//! stream.

use crate::audit::{AuditRecord, AuditSink};
use crate::error::AuditError;

/// Sink that emits each record as one `tracing` event.
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, record: &AuditRecord) -> Result<(), AuditError> {
        tracing::info!(
            audit_id = %record.id,
            action = record.action.as_str(),
            path = record.raw_path.as_str(),
            canonical_path = record.canonical_path.as_str(),
            outcome = %record.outcome,
            caller = record.caller.as_str(),
            entry_count = record.entry_count.unwrap_or(0),
            "AUDIT"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
