//! Fan-out audit sink.

use crate::audit::{AuditRecord, AuditSink};
use crate::error::AuditError;

/// Sink that forwards every record to several backends.
///
/// All backends are attempted; the first error is returned afterwards so one
/// failing backend cannot hide a record from the others.
pub struct MultiAuditSink {
    sinks: Vec<Box<dyn AuditSink>>,
}

impl MultiAuditSink {
    pub fn new(sinks: Vec<Box<dyn AuditSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl AuditSink for MultiAuditSink {
    fn emit(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.emit(record) {
                tracing::error!(sink = sink.name(), error = %e, "audit sink failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn name(&self) -> &str {
        "multi"
    }
}
