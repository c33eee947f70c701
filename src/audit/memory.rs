//! In-memory audit sink.
//!
//! Used by tests to assert on emitted records, and by embedders that want to
//! inspect the trail without a file.

use std::sync::{Arc, Mutex};

use crate::audit::{AuditRecord, AuditSink};
use crate::error::AuditError;

/// Sink that keeps every record in a shared vector.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    records: Arc<Mutex<Vec<AuditRecord>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the records emitted so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Most recent record, if any.
    pub fn last(&self) -> Option<AuditRecord> {
        self.records.lock().ok().and_then(|r| r.last().cloned())
    }
}

impl AuditSink for MemoryAuditSink {
    fn emit(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records
            .lock()
            .map_err(|_| AuditError::Poisoned {
                sink: self.name().to_string(),
            })?
            .push(record.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditAction, AuditOutcome};

    #[test]
    fn captures_records_across_clones() {
        let sink = MemoryAuditSink::new();
        let handle = sink.clone();
        assert!(handle.is_empty());

        sink.emit(&AuditRecord::new(
            AuditAction::List,
            "/a",
            "/a",
            AuditOutcome::Blocked,
            "local",
        ))
        .unwrap();

        assert_eq!(handle.len(), 1);
        assert_eq!(handle.last().unwrap().outcome, AuditOutcome::Blocked);
        assert_eq!(handle.records()[0].action, AuditAction::List);
    }
}
