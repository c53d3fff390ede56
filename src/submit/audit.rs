use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to persist an audit entry. Swallowed (and logged) by the
/// orchestrator — auditing is best-effort, submission correctness is not.
#[derive(Debug, Error)]
#[error("audit write failed: {0}")]
pub struct AuditError(pub String);

/// One append-only audit record per submission attempt, successes and
/// failures alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub holder_tax_id: String,
    pub submission_id: String,
    pub invoice_count: u32,
    pub accepted: u32,
    pub rejected: u32,
    /// Terminal outcome label, e.g. `ACCEPTED` or `VALIDATION_FAILED`.
    pub outcome: String,
    pub timestamp: DateTime<Utc>,
}

/// Sink for the submission audit trail.
pub trait AuditSink: Send + Sync {
    fn append(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

/// Append-only in-memory audit log.
#[derive(Debug, Default)]
pub struct MemoryAudit {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<AuditEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AuditSink for MemoryAudit {
    fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.lock().push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> AuditEntry {
        AuditEntry {
            holder_tax_id: "B76365789".into(),
            submission_id: id.into(),
            invoice_count: 2,
            accepted: 2,
            rejected: 0,
            outcome: "ACCEPTED".into(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn appends_in_order() {
        let audit = MemoryAudit::new();
        audit.append(entry("ENV-1")).unwrap();
        audit.append(entry("ENV-2")).unwrap();
        let entries = audit.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].submission_id, "ENV-1");
        assert_eq!(entries[1].submission_id, "ENV-2");
    }
}
