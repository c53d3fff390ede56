use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::core::{CachedSubmission, SubmissionStatus};

/// Idempotent submission-status store with a fixed TTL.
///
/// Entries are written once by the orchestrator that created them and only
/// revisited for status transitions on resubmission attempts. Writers for
/// different submission ids never conflict.
#[derive(Debug)]
pub struct SubmissionCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedSubmission>>,
}

impl SubmissionCache {
    /// TTL in hours — long enough for later status polling.
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            ttl: Duration::hours(ttl_hours),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Expiry timestamp for an entry created at `now`.
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.ttl
    }

    /// Store an entry under its submission id, replacing any previous
    /// attempt with the same id.
    pub fn store(&self, entry: CachedSubmission) {
        self.lock().insert(entry.submission_id.clone(), entry);
    }

    /// Look up a submission, honouring expiry: expired entries are dropped
    /// and reported as absent.
    pub fn get(&self, submission_id: &str) -> Option<CachedSubmission> {
        let mut entries = self.lock();
        match entries.get(submission_id) {
            Some(entry) if entry.expires_at > Utc::now() => Some(entry.clone()),
            Some(_) => {
                entries.remove(submission_id);
                None
            }
            None => None,
        }
    }

    /// Move a cached submission to a new status (resubmission bookkeeping).
    /// A terminal entry never goes back to `Pending`; returns false when
    /// the transition is refused or the entry is unknown.
    pub fn transition(&self, submission_id: &str, status: SubmissionStatus) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(submission_id) else {
            return false;
        };
        if entry.status.is_terminal() && status == SubmissionStatus::Pending {
            return false;
        }
        entry.status = status;
        if status.is_terminal() {
            entry.processed_at = Some(Utc::now());
        }
        true
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = Utc::now();
        self.lock().retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CachedSubmission>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, status: SubmissionStatus, expires_at: DateTime<Utc>) -> CachedSubmission {
        CachedSubmission {
            submission_id: id.to_string(),
            status,
            submitted_at: Utc::now(),
            processed_at: None,
            verification: None,
            invoice_count: 1,
            accepted: 1,
            rejected: 0,
            expires_at,
        }
    }

    #[test]
    fn store_and_get() {
        let cache = SubmissionCache::new(24);
        let expires = cache.expiry_from(Utc::now());
        cache.store(entry("ENV-1", SubmissionStatus::Accepted, expires));
        let found = cache.get("ENV-1").unwrap();
        assert_eq!(found.status, SubmissionStatus::Accepted);
        assert!(cache.get("ENV-2").is_none());
    }

    #[test]
    fn expired_entries_vanish() {
        let cache = SubmissionCache::new(24);
        cache.store(entry(
            "ENV-1",
            SubmissionStatus::Accepted,
            Utc::now() - Duration::seconds(1),
        ));
        assert!(cache.get("ENV-1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_drops_only_expired() {
        let cache = SubmissionCache::new(24);
        cache.store(entry(
            "OLD",
            SubmissionStatus::Accepted,
            Utc::now() - Duration::hours(1),
        ));
        cache.store(entry(
            "NEW",
            SubmissionStatus::Accepted,
            Utc::now() + Duration::hours(1),
        ));
        cache.purge_expired();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("NEW").is_some());
    }

    #[test]
    fn terminal_never_returns_to_pending() {
        let cache = SubmissionCache::new(24);
        let expires = Utc::now() + Duration::hours(1);
        cache.store(entry("ENV-1", SubmissionStatus::Rejected, expires));
        assert!(!cache.transition("ENV-1", SubmissionStatus::Pending));
        assert!(cache.transition("ENV-1", SubmissionStatus::Processing));
        assert!(cache.transition("ENV-1", SubmissionStatus::Accepted));
        let entry = cache.get("ENV-1").unwrap();
        assert_eq!(entry.status, SubmissionStatus::Accepted);
        assert!(entry.processed_at.is_some());
    }

    #[test]
    fn unknown_id_refuses_transition() {
        let cache = SubmissionCache::new(24);
        assert!(!cache.transition("missing", SubmissionStatus::Processing));
    }
}
